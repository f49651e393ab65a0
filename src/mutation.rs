use crate::config::Config;
use crate::error::{MutationError, Target};
use crate::host::{CommandOutput, CommandSpec, Host};
use crate::inventory::Inventory;
use crate::util::action_log::{Action, ActionLog};
use regex::Regex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Privileged operations on the host. Every operation re-reads the mount
/// table before acting and invalidates the cached inventory after a change.
pub struct MutationController {
    host:           Arc<dyn Host>,
    inventory:      Arc<Inventory>,
    safe_path:      Option<Regex>,
    automount_unit: String,
    settle:         Duration,
    log:            ActionLog,
}

impl MutationController {
    pub fn new(host: Arc<dyn Host>, inventory: Arc<Inventory>, config: &Config, log: ActionLog) -> Self {
        Self {
            host,
            inventory,
            safe_path:      safe_path_pattern(&config.mounts.mount_roots),
            automount_unit: config.services.automount_unit.clone(),
            settle:         config.general.restart_settle(),
            log,
        }
    }

    /// True when `path` is something we would ever pass to umount.
    pub fn is_safe_path(&self, path: &str) -> bool {
        self.safe_path.as_ref().is_some_and(|re| re.is_match(path))
    }

    pub fn unmount(&self, path: &str) -> Result<(), MutationError> {
        let result = self.try_unmount(path);
        self.record(Action::Unmount, path, &result, "unmounted");
        result
    }

    pub fn kill_process(&self, pid: u32) -> Result<(), MutationError> {
        let result = self.try_kill(pid);
        self.record(Action::Kill, &pid.to_string(), &result, "killed");
        result
    }

    pub fn restart_automount(&self) -> Result<(), MutationError> {
        let result = self.try_restart();
        self.record(Action::RestartAutomount, &self.automount_unit, &result, "restarted");
        result
    }

    fn try_unmount(&self, path: &str) -> Result<(), MutationError> {
        if !self.is_safe_path(path) {
            return Err(MutationError::InvalidPath(path.to_string()));
        }

        let mounts = self.inventory.refresh_now()?;
        if !mounts.iter().any(|m| m.path == path) {
            return Err(MutationError::NotMounted(path.to_string()));
        }

        let out = self.host.run(&CommandSpec::privileged("umount", ["--", path]))?;
        if !out.stderr.trim().is_empty() {
            tracing::debug!(path, stderr = out.stderr.trim(), "umount output");
        }
        classify_unmount(path, out)?;

        self.inventory.invalidate();
        Ok(())
    }

    fn try_kill(&self, pid: u32) -> Result<(), MutationError> {
        let mounts = self.inventory.refresh_now()?;
        if !mounts.iter().any(|m| m.holds_pid(pid)) {
            return Err(MutationError::NotFound(Target::Pid(pid)));
        }

        let out = self.host.run(&CommandSpec::privileged("kill", ["-9".to_string(), pid.to_string()]))?;
        if !out.success() {
            return Err(out.into_failure("kill").into());
        }

        self.inventory.invalidate();
        Ok(())
    }

    fn try_restart(&self) -> Result<(), MutationError> {
        let cmd = CommandSpec::privileged("systemctl", ["restart", self.automount_unit.as_str()]);
        let out = self.host.run(&cmd)?;
        if !out.success() {
            return Err(out.into_failure("systemctl").into());
        }

        // give automount time to bring the mounts back before anyone re-reads them
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        self.inventory.invalidate();
        Ok(())
    }

    fn record(&self, action: Action, item: &str, result: &Result<(), MutationError>, done: &str) {
        match result {
            Ok(()) => {
                tracing::info!(action = action.label(), item, "{}", done);
                self.log.append(action, item, true, done);
            }
            Err(e) => {
                tracing::error!(action = action.label(), item, kind = ?e.kind(), error = %e, "mutation failed");
                self.log.append(action, item, false, &e.to_string());
            }
        }
    }
}

/// Map umount's exit status to an error category.
pub fn classify_unmount(path: &str, out: CommandOutput) -> Result<(), MutationError> {
    let path = path.to_string();
    match out.code {
        Some(0)              => Ok(()),
        Some(1)              => Err(MutationError::Unspecified { path }),
        Some(2)              => Err(MutationError::PermissionDenied { path }),
        Some(8)              => Err(MutationError::NotFound(Target::Path(path))),
        Some(c @ (16 | 32))  => Err(MutationError::DeviceBusy { path, code: c }),
        Some(c)              => Err(MutationError::Unknown { path, code: c }),
        None                 => Err(out.into_failure("umount").into()),
    }
}

/// `^(?:<root>|<root>…)[/A-Za-z0-9_ -]+$` over the escaped mount roots.
/// Anything else (dots, quotes, shell metacharacters, relative paths) is refused.
/// No usable root means no path is safe.
fn safe_path_pattern(roots: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = roots
        .iter()
        .filter(|r| !r.is_empty())
        .map(|r| regex::escape(r))
        .collect();
    if alternatives.is_empty() {
        tracing::warn!("no mount roots configured, every unmount will be refused");
        return None;
    }
    let pattern = format!(r"^(?:{})[/A-Za-z0-9_ -]+$", alternatives.join("|"));
    Regex::new(&pattern).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::host::FixtureHost;

    fn controller(host: &Arc<FixtureHost>) -> MutationController {
        let mut cfg = Config::default();
        cfg.general.restart_settle_ms = 0;
        let inv = Arc::new(Inventory::new(host.clone(), &cfg));
        MutationController::new(host.clone(), inv, &cfg, ActionLog::disabled())
    }

    #[test]
    fn exit_codes_map_to_categories() {
        let kind = |code| classify_unmount("/mnt/a", CommandOutput::exit(code, "", "")).map_err(|e| e.kind());
        assert_eq!(kind(0), Ok(()));
        assert_eq!(kind(1), Err(ErrorKind::Unspecified));
        assert_eq!(kind(2), Err(ErrorKind::PermissionDenied));
        assert_eq!(kind(8), Err(ErrorKind::NotFound));
        assert_eq!(kind(16), Err(ErrorKind::DeviceBusy));
        assert_eq!(kind(32), Err(ErrorKind::DeviceBusy));
        assert_eq!(kind(4), Err(ErrorKind::Unknown));

        let signalled = CommandOutput { code: None, stdout: String::new(), stderr: String::new() };
        assert_eq!(classify_unmount("/mnt/a", signalled).map_err(|e| e.kind()), Err(ErrorKind::ExternalCommand));
    }

    #[test]
    fn unknown_code_is_carried() {
        match classify_unmount("/mnt/a", CommandOutput::exit(99, "", "")) {
            Err(MutationError::Unknown { code, .. }) => assert_eq!(code, 99),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn safe_path_rules() {
        let host = Arc::new(FixtureHost::demo());
        let mc = controller(&host);
        assert!(mc.is_safe_path("/mnt/external"));
        assert!(mc.is_safe_path("/media/My Passport"));
        assert!(mc.is_safe_path("/mnt/usb_1/part-2"));

        assert!(!mc.is_safe_path("/mnt/"));
        assert!(!mc.is_safe_path("/mnt/../etc"));
        assert!(!mc.is_safe_path("/mnt/a;rm -rf /"));
        assert!(!mc.is_safe_path("/home/user"));
        assert!(!mc.is_safe_path("mnt/external"));
        assert!(!mc.is_safe_path("/mntx/external"));
        assert!(!mc.is_safe_path("/mnt/a\nb"));
    }

    #[test]
    fn empty_roots_refuse_every_path() {
        for roots in [vec![], vec![String::new()]] {
            let host = Arc::new(FixtureHost::demo());
            let mut cfg = Config::default();
            cfg.mounts.mount_roots = roots;
            let inv = Arc::new(Inventory::new(host.clone(), &cfg));
            let mc = MutationController::new(host.clone(), inv, &cfg, ActionLog::disabled());

            assert!(!mc.is_safe_path("/etc/passwd"));
            assert!(!mc.is_safe_path("/mnt/external"));
            let err = mc.unmount("/etc/passwd").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidPath);
            assert!(host.calls().is_empty());
        }
    }

    #[test]
    fn busy_unmount_keeps_inventory() {
        let host = Arc::new(FixtureHost::demo());
        let mc = controller(&host);
        let err = mc.unmount("/mnt/fail_unmount").unwrap_err();
        assert!(matches!(err, MutationError::DeviceBusy { code: 32, .. }));
        assert_eq!(err.kind(), ErrorKind::DeviceBusy);
        assert!(err.guidance().contains("open"));
    }

    #[test]
    fn kill_refuses_unlisted_pid() {
        let host = Arc::new(FixtureHost::demo());
        let mc = controller(&host);
        let err = mc.kill_process(4242).unwrap_err();
        assert!(matches!(err, MutationError::NotFound(Target::Pid(4242))));
        assert_eq!(host.call_count("kill"), 0);
    }

    #[test]
    fn kill_command_failure_is_surfaced() {
        let host = Arc::new(FixtureHost::demo().with_open_files(
            "/mnt/fail_unmount",
            CommandOutput::ok(crate::host::fixture::lsof_lines(&[
                "zombie  9999 root  cwd  DIR  8,33  4096  2 /mnt/fail_unmount",
            ])),
        ));
        let err = controller(&host).kill_process(9999).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalCommand);
        assert!(err.to_string().contains("No such process"));
    }

    #[test]
    fn restart_runs_systemctl_and_invalidates() {
        let host = Arc::new(FixtureHost::demo());
        let mc = controller(&host);
        mc.inventory.get_mounts().unwrap();
        mc.restart_automount().unwrap();
        assert!(host.calls().contains(&"systemctl restart autofs".to_string()));

        mc.inventory.get_mounts().unwrap();
        assert_eq!(host.call_count("mount"), 2);
    }

    #[test]
    fn restart_failure_is_reported() {
        let host = Arc::new(FixtureHost::demo().with_restart_code(5));
        let err = controller(&host).restart_automount().unwrap_err();
        assert!(err.to_string().contains("systemctl exited with status 5"));
    }
}
