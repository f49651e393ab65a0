use crate::config::ServicesConfig;
use crate::error::CommandError;
use crate::host::{CommandOutput, CommandSpec, Host};
use crate::models::ServiceStatus;

/// The two daemons the inventory depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// autofs, which mounts the devices on demand
    Automount,
    /// Samba, which shares them and may hold files locked
    Sharing,
}

impl ServiceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::Automount => "Autofs",
            ServiceKind::Sharing   => "Samba",
        }
    }

    /// Substring whose presence means "healthy". For Samba that is "no files
    /// currently locked", not "daemon is up".
    fn marker(&self) -> &'static str {
        match self {
            ServiceKind::Automount => "active (running)",
            ServiceKind::Sharing   => "No locked files",
        }
    }

    fn query(&self, cfg: &ServicesConfig) -> CommandSpec {
        match self {
            ServiceKind::Automount => CommandSpec::new("systemctl", ["status", cfg.automount_unit.as_str()]),
            ServiceKind::Sharing   => CommandSpec::privileged("smbstatus", ["--locked"]),
        }
    }
}

pub fn check_service(
    host: &dyn Host,
    kind: ServiceKind,
    cfg:  &ServicesConfig,
) -> Result<ServiceStatus, CommandError> {
    let cmd = kind.query(cfg);
    let out = host.run(&cmd)?;
    if !out.success() {
        return Err(out.into_failure(&cmd.program));
    }
    Ok(interpret(kind, &out))
}

fn interpret(kind: ServiceKind, out: &CommandOutput) -> ServiceStatus {
    let text = out.combined();
    ServiceStatus {
        name:   kind.label().to_string(),
        active: text.contains(kind.marker()),
        detail: text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FixtureHost;

    #[test]
    fn running_autofs_is_active() {
        let host = FixtureHost::demo();
        let st = check_service(&host, ServiceKind::Automount, &ServicesConfig::default()).unwrap();
        assert_eq!(st.name, "Autofs");
        assert!(st.active);
        assert!(st.detail.starts_with("● autofs.service"));
        assert_eq!(host.calls(), vec!["systemctl status autofs".to_string()]);
    }

    #[test]
    fn locked_files_make_samba_inactive() {
        let st = check_service(&FixtureHost::demo(), ServiceKind::Sharing, &ServicesConfig::default()).unwrap();
        assert_eq!(st.name, "Samba");
        assert!(!st.active);
        assert!(st.detail.contains("Locked files:"));
    }

    #[test]
    fn no_locked_files_makes_samba_active() {
        let st = check_service(&FixtureHost::new(), ServiceKind::Sharing, &ServicesConfig::default()).unwrap();
        assert!(st.active);
        assert_eq!(st.detail, "No locked files");
    }

    #[test]
    fn nonzero_exit_is_surfaced() {
        let host = FixtureHost::new().with_service_output(
            "systemctl",
            CommandOutput::exit(3, "○ autofs.service\n     Active: inactive (dead)\n", ""),
        );
        let err = check_service(&host, ServiceKind::Automount, &ServicesConfig::default()).unwrap_err();
        match err {
            CommandError::Failed { program, code, .. } => {
                assert_eq!(program, "systemctl");
                assert_eq!(code, Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_unit_name_is_queried() {
        let host = FixtureHost::new();
        let cfg = ServicesConfig { automount_unit: "autofs-usb".into() };
        check_service(&host, ServiceKind::Automount, &cfg).unwrap();
        assert_eq!(host.calls(), vec!["systemctl status autofs-usb".to_string()]);
    }
}
