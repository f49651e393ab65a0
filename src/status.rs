use crate::collectors::services::{check_service, ServiceKind};
use crate::config::ServicesConfig;
use crate::host::Host;
use crate::inventory::Inventory;
use crate::models::{ServiceStatus, SystemSnapshot};

/// Gather the inventory and both service states. Each failure is recorded
/// in its own field and never stops the other parts from reporting.
pub fn collect(host: &dyn Host, inventory: &Inventory, services: &ServicesConfig) -> SystemSnapshot {
    let (mounts, error) = match inventory.get_mounts() {
        Ok(m)  => (m, None),
        Err(e) => {
            tracing::error!(error = %e, "inventory unavailable");
            (Vec::new(), Some(e.to_string()))
        }
    };

    let (autofs, autofs_error) = service(host, ServiceKind::Automount, services);
    let (samba, samba_error)   = service(host, ServiceKind::Sharing, services);

    SystemSnapshot {
        mounts,
        autofs,
        samba,
        error,
        autofs_error,
        samba_error,
        taken_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

fn service(host: &dyn Host, kind: ServiceKind, cfg: &ServicesConfig) -> (ServiceStatus, Option<String>) {
    match check_service(host, kind, cfg) {
        Ok(s)  => (s, None),
        Err(e) => {
            tracing::warn!(service = kind.label(), error = %e, "service check failed");
            (ServiceStatus::unavailable(kind.label()), Some(e.to_string()))
        }
    }
}
