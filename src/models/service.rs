use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub name:   String,
    pub active: bool,
    /// Raw status text as printed by the query command
    pub detail: String,
}

impl ServiceStatus {
    /// Placeholder for a service whose check failed.
    pub fn unavailable(name: &str) -> Self {
        Self { name: name.to_string(), active: false, detail: String::new() }
    }

    pub fn label(&self) -> &'static str {
        if self.active { "active" } else { "inactive" }
    }
}
