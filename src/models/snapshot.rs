use super::{Mount, ServiceStatus};
use serde::Serialize;

/// Everything the dashboard shows, gathered in one pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    pub mounts: Vec<Mount>,
    pub autofs: ServiceStatus,
    pub samba:  ServiceStatus,

    /// Inventory failure with no previous inventory to fall back on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:        Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autofs_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samba_error:  Option<String>,

    pub taken_at: String,
}

impl SystemSnapshot {
    pub fn busy_count(&self) -> usize {
        self.mounts.iter().filter(|m| m.is_busy()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error.is_some()
            || self.autofs_error.is_some()
            || self.samba_error.is_some()
            || self.mounts.iter().any(|m| m.usage_error.is_some())
    }
}
