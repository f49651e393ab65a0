use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// An external tool could not be run, or ran and failed outside of any
/// documented exit-code mapping.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {}s", secs(.after))]
    Timeout { program: String, after: Duration },

    #[error("{program} exited with {}{}", exit_label(.code), output_suffix(.output))]
    Failed {
        program: String,
        code:    Option<i32>,
        output:  String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None    => "a signal".to_string(),
    }
}

fn secs(after: &Duration) -> u64 {
    after.as_secs()
}

fn output_suffix(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() { String::new() } else { format!(": {}", trimmed) }
}

/// Filesystem statistics could not be read for one mount path.
#[derive(Debug, Error)]
#[error("filesystem statistics unavailable for {path}: {source}")]
pub struct StatError {
    pub path: String,
    #[source]
    pub source: nix::Error,
}

/// No usable inventory at all: the mount query failed and nothing was cached.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("mount table query failed: {0}")]
    MountQuery(#[from] CommandError),
}

/// What a mutation was aimed at, for "not found" reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Path(String),
    Pid(u32),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Path(p) => write!(f, "path {}", p),
            Target::Pid(p)  => write!(f, "pid {}", p),
        }
    }
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("invalid mount path: {0:?}")]
    InvalidPath(String),

    #[error("not mounted: {0}")]
    NotMounted(String),

    #[error("failed to unmount {path}: permission denied (are you root?)")]
    PermissionDenied { path: String },

    #[error("failed to unmount {path}: device is busy (exit status {code})")]
    DeviceBusy { path: String, code: i32 },

    #[error("{0} not found")]
    NotFound(Target),

    #[error("failed to unmount {path}: an unspecified error occurred")]
    Unspecified { path: String },

    #[error("failed to unmount {path}: unknown error with exit status {code}")]
    Unknown { path: String, code: i32 },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("inventory unavailable: {0}")]
    Inventory(#[from] InventoryError),
}

/// Coarse category of a [`MutationError`], for callers that render
/// different guidance per failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPath,
    NotMounted,
    PermissionDenied,
    DeviceBusy,
    NotFound,
    Unspecified,
    Unknown,
    ExternalCommand,
    Inventory,
}

impl MutationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MutationError::InvalidPath(_)          => ErrorKind::InvalidPath,
            MutationError::NotMounted(_)           => ErrorKind::NotMounted,
            MutationError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            MutationError::DeviceBusy { .. }       => ErrorKind::DeviceBusy,
            MutationError::NotFound(_)             => ErrorKind::NotFound,
            MutationError::Unspecified { .. }      => ErrorKind::Unspecified,
            MutationError::Unknown { .. }          => ErrorKind::Unknown,
            MutationError::Command(_)              => ErrorKind::ExternalCommand,
            MutationError::Inventory(_)            => ErrorKind::Inventory,
        }
    }

    /// One-line next step for the operator.
    pub fn guidance(&self) -> &'static str {
        match self.kind() {
            ErrorKind::DeviceBusy =>
                "Files are still open on this mount. Kill the listed holders or wait for Samba to release them, then retry.",
            ErrorKind::PermissionDenied =>
                "The unmount was refused. Make sure this user may run umount through sudo without a password.",
            ErrorKind::NotFound | ErrorKind::NotMounted =>
                "The target is gone. Refresh the inventory and check it again.",
            ErrorKind::InvalidPath =>
                "Only paths under the configured mount roots can be unmounted.",
            ErrorKind::Inventory =>
                "The mount table could not be read. Check that the mount command works on this host.",
            ErrorKind::Unspecified | ErrorKind::Unknown | ErrorKind::ExternalCommand =>
                "The operation failed unexpectedly. See the log for details.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_command_message_includes_code_and_output() {
        let e = CommandError::Failed {
            program: "systemctl".into(),
            code:    Some(3),
            output:  "  inactive (dead)\n".into(),
        };
        assert_eq!(e.to_string(), "systemctl exited with status 3: inactive (dead)");

        let e = CommandError::Failed { program: "kill".into(), code: None, output: String::new() };
        assert_eq!(e.to_string(), "kill exited with a signal");
    }

    #[test]
    fn guidance_differs_per_category() {
        let busy = MutationError::DeviceBusy { path: "/mnt/a".into(), code: 32 };
        let perm = MutationError::PermissionDenied { path: "/mnt/a".into() };
        let gone = MutationError::NotFound(Target::Pid(42));
        let other = MutationError::Unknown { path: "/mnt/a".into(), code: 99 };

        let all = [busy.guidance(), perm.guidance(), gone.guidance(), other.guidance()];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(gone.to_string(), "pid 42 not found");
        assert_eq!(other.kind(), ErrorKind::Unknown);
    }
}
