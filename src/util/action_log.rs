use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("unmounter").join("actions.log"))
}

/// Which mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Unmount,
    Kill,
    RestartAutomount,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Unmount          => "unmount",
            Action::Kill             => "kill",
            Action::RestartAutomount => "restart",
        }
    }
}

/// Append-only record of mutation outcomes. A log without a path (no data
/// directory, or disabled for tests) silently drops entries.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    path: Option<PathBuf>,
}

impl ActionLog {
    /// `<data_local_dir>/unmounter/actions.log`
    pub fn default_location() -> Self {
        Self { path: log_path() }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()) }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write one line: `YYYY-MM-DD HH:MM:SS [OK|ERR] <action> <target>: <message>`.
    pub fn append(&self, action: Action, target: &str, ok: bool, message: &str) {
        let path = match &self.path {
            Some(p) => p,
            None    => return,
        };
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let status = if ok { "OK" } else { "ERR" };
        // one entry per line, whatever the command printed
        let message = message.replace('\n', " ");
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{} [{}] {} {}: {}", now, status, action.label(), target, message.trim());
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot write action log"),
        }
    }

    /// The last `n` entries, oldest first.
    pub fn load_recent(&self, n: usize) -> Vec<String> {
        let text = match self.path.as_ref().and_then(|p| fs::read_to_string(p).ok()) {
            Some(t) => t,
            None    => return Vec::new(),
        };
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let skip = lines.len().saturating_sub(n);
        lines[skip..].iter().map(|l| l.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_round_trip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActionLog::at(dir.path().join("nested").join("actions.log"));

        log.append(Action::Unmount, "/mnt/external", true, "unmounted");
        log.append(Action::Kill, "1234", false, "kill exited with status 1:\nkill: (1234) - No such process\n");
        log.append(Action::RestartAutomount, "autofs", true, "restarted");

        let all = log.load_recent(10);
        assert_eq!(all.len(), 3);
        assert!(all[0].ends_with("[OK] unmount /mnt/external: unmounted"));
        assert!(all[1].contains("[ERR] kill 1234: kill exited with status 1: kill: (1234) - No such process"));

        let last = log.load_recent(1);
        assert_eq!(last.len(), 1);
        assert!(last[0].ends_with("[OK] restart autofs: restarted"));
    }

    #[test]
    fn timestamp_prefix_shape() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActionLog::at(dir.path().join("actions.log"));
        log.append(Action::Unmount, "/mnt/a", true, "ok");
        let line = &log.load_recent(1)[0];
        // "2025-02-04 17:33:57 [OK] ..."
        assert_eq!(&line[4..5], "-");
        assert_eq!(&line[10..11], " ");
        assert_eq!(&line[19..25], " [OK] ");
    }

    #[test]
    fn disabled_log_is_a_no_op() {
        let log = ActionLog::disabled();
        log.append(Action::Kill, "1", true, "ignored");
        assert!(log.load_recent(5).is_empty());
        assert!(log.path().is_none());
    }
}
