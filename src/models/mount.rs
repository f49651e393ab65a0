use serde::Serialize;

/// One eligible mount with the processes holding it open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mount {
    pub device: String,
    pub path:   String,
    pub usages: Vec<Usage>,

    // Set only when the open-file query failed; `usages` is then empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_error: Option<String>,

    // None when statvfs failed or space reporting is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_space:            Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_space_percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_space:           Option<String>,
}

impl Mount {
    pub fn new(device: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            device:                device.into(),
            path:                  path.into(),
            usages:                Vec::new(),
            usage_error:           None,
            free_space:            None,
            free_space_percentage: None,
            total_space:           None,
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.usages.is_empty()
    }

    pub fn holds_pid(&self, pid: u32) -> bool {
        self.usages.iter().any(|u| u.pid == pid)
    }

    /// Returns the short device name ("sda1" from "/dev/sda1").
    pub fn short_device(&self) -> &str {
        self.device.trim_start_matches("/dev/")
    }
}

/// A process holding a file open under a mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub command: String,
    pub pid:     u32,
    pub user:    String,
    /// First open file reported for this process
    pub name:    String,
    /// Further files the same process holds under the mount
    #[serde(skip_serializing_if = "is_zero")]
    pub also_open: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_skips_unknowns() {
        let mut m = Mount::new("/dev/sda1", "/mnt/external");
        m.usage_error = Some("error executing lsof on /mnt/external: boom".into());
        m.free_space_percentage = Some(42);

        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["usageError"], "error executing lsof on /mnt/external: boom");
        assert_eq!(v["freeSpacePercentage"], 42);
        assert!(v.get("freeSpace").is_none());
        assert!(v.get("totalSpace").is_none());
        assert_eq!(v["usages"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn usage_hides_zero_also_open() {
        let u = Usage { command: "vlc".into(), pid: 4711, user: "alice".into(), name: "/mnt/a/b.mkv".into(), also_open: 0 };
        let v = serde_json::to_value(&u).unwrap();
        assert!(v.get("alsoOpen").is_none());
        assert_eq!(v["pid"], 4711);
    }

    #[test]
    fn busy_and_pid_lookup() {
        let mut m = Mount::new("/dev/sdb2", "/media/usb0");
        assert!(!m.is_busy());
        m.usages.push(Usage { command: "cat".into(), pid: 7, user: "bob".into(), name: "/media/usb0/x".into(), also_open: 0 });
        assert!(m.is_busy());
        assert!(m.holds_pid(7));
        assert!(!m.holds_pid(8));
        assert_eq!(m.short_device(), "sdb2");
    }
}
