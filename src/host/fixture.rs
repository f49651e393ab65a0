use super::{CommandOutput, CommandSpec, FsStats, Host};
use crate::error::{CommandError, StatError};
use nix::errno::Errno;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// Canned host. Serves fixed command output, records every call, and
/// applies successful unmounts and kills to its own state so follow-up
/// queries see the change.
#[derive(Debug, Default)]
pub struct FixtureHost {
    state: Mutex<FixtureState>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct FixtureState {
    mount_table:   String,
    mount_code:    i32,
    open_files:    HashMap<String, CommandOutput>,
    service_out:   HashMap<String, CommandOutput>,
    restart_code:  i32,
    unmount_codes: HashMap<String, i32>,
    kill_codes:    HashMap<u32, i32>,
    stats:         HashMap<String, FsStats>,
    unavailable:   HashSet<String>,
    calls:         Vec<String>,
}

const LSOF_HEADER: &str = "COMMAND     PID      USER   FD   TYPE DEVICE  SIZE/OFF    NODE NAME";

const AUTOFS_RUNNING: &str = "\
● autofs.service - Automounts filesystems on demand
     Loaded: loaded (/lib/systemd/system/autofs.service; enabled; vendor preset: enabled)
     Active: active (running) since Sun 2025-01-26 21:36:00 CET; 1 weeks 1 days ago
       Docs: man:autofs(8)
   Main PID: 603 (automount)
      Tasks: 4 (limit: 3930)
     CGroup: /system.slice/autofs.service
             └─603 /usr/sbin/automount --pid-file /var/run/autofs.pid
";

const SMB_NO_LOCKS: &str = "\nNo locked files\n\n";

const SMB_LOCKED: &str = "\
Samba version 4.13.13-Debian
PID     Username     Group        Machine                                   Protocol Version  Encryption           Signing
----------------------------------------------------------------------------------------------------------------------------------------
258080  sambauser    sambauser    192.168.4.107 (ipv4:192.168.4.107:52682)  SMB3_11           -                    partial(AES-128-CMAC)

Locked files:
Pid          User(ID)   DenyMode   Access      R/W        Oplock           SharePath   Name   Time
--------------------------------------------------------------------------------------------------
258080       1001       DENY_NONE  0x120089    RDONLY     NONE             /mnt/external   audio/Best Of/12-things_have_changed.flac   Tue Feb  4 17:33:57 2025
";

impl FixtureHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Three eligible mounts plus a few that must be filtered out. One mount
    /// is held open by Samba, one by two local processes, and unmounting
    /// `/mnt/fail_unmount` reports "busy".
    pub fn demo() -> Self {
        const GIB: u64 = 1 << 30;
        const MIB: u64 = 1 << 20;

        Self::new()
            .with_mount_table(
                "sysfs on /sys type sysfs (rw,nosuid,nodev,noexec,relatime)\n\
                 /dev/nvme0n1p2 on / type ext4 (rw,relatime)\n\
                 /dev/sda1 on /mnt/external type ext4 (rw,relatime)\n\
                 /dev/sdb2 on /media/usb0 type vfat (rw,nosuid,nodev,relatime,uid=1000)\n\
                 /dev/sdc1 on /mnt/fail_unmount type ext4 (rw,relatime)\n\
                 /dev/sdd1 on /home/backup type ext4 (rw,relatime)\n",
            )
            .with_open_files("/mnt/external", CommandOutput::ok(lsof_lines(&[
                "smbd     258080 sambauser  cwd    DIR    8,1      4096       2 /mnt/external",
                "smbd     258080 sambauser   35r   REG    8,1  31457280  393224 /mnt/external/audio/Best Of/12-things_have_changed.flac",
            ])))
            .with_open_files("/media/usb0", CommandOutput::ok(lsof_lines(&[
                "mock_proc  1234  mockuser    3r   REG   8,18      2048      17 /media/usb0/mock_file1.txt",
                "mock_proc  5678  mockuser    4w   REG   8,18       512      18 /media/usb0/mock_file2.txt",
            ])))
            .with_service_output("smbstatus", CommandOutput::ok(SMB_LOCKED))
            .with_unmount_code("/mnt/fail_unmount", 32)
            .with_kill_code(9999, 1)
            .with_stats("/mnt/external", stats(10 * GIB, 5 * GIB / 2))
            .with_stats("/media/usb0", stats(2 * GIB, 500 * MIB))
            .with_stats("/mnt/fail_unmount", stats(100 * GIB, 10 * GIB))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_mount_table(mut self, text: &str) -> Self {
        self.state_mut().mount_table = text.to_string();
        self
    }

    pub fn with_open_files(mut self, path: &str, out: CommandOutput) -> Self {
        self.state_mut().open_files.insert(path.to_string(), out);
        self
    }

    /// Output for `systemctl` (status) or `smbstatus`.
    pub fn with_service_output(mut self, program: &str, out: CommandOutput) -> Self {
        self.state_mut().service_out.insert(program.to_string(), out);
        self
    }

    pub fn with_unmount_code(mut self, path: &str, code: i32) -> Self {
        self.state_mut().unmount_codes.insert(path.to_string(), code);
        self
    }

    pub fn with_kill_code(mut self, pid: u32, code: i32) -> Self {
        self.state_mut().kill_codes.insert(pid, code);
        self
    }

    pub fn with_restart_code(mut self, code: i32) -> Self {
        self.state_mut().restart_code = code;
        self
    }

    pub fn with_stats(mut self, path: &str, stats: FsStats) -> Self {
        self.state_mut().stats.insert(path.to_string(), stats);
        self
    }

    /// Make `program` fail to start, as if it were not installed.
    pub fn set_unavailable(&self, program: &str, unavailable: bool) {
        let mut st = self.lock();
        if unavailable {
            st.unavailable.insert(program.to_string());
        } else {
            st.unavailable.remove(program);
        }
    }

    pub fn set_mount_code(&self, code: i32) {
        self.lock().mount_code = code;
    }

    pub fn set_mount_table(&self, text: &str) {
        self.lock().mount_table = text.to_string();
    }

    /// Every command issued so far, rendered as `program arg arg…`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, program: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.split(' ').next() == Some(program))
            .count()
    }

    fn state_mut(&mut self) -> &mut FixtureState {
        self.state.get_mut().unwrap_or_else(|e| e.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Host for FixtureHost {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, CommandError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let mut st = self.lock();
        st.calls.push(cmd.display());

        if st.unavailable.contains(&cmd.program) {
            return Err(CommandError::Spawn {
                program: cmd.program.clone(),
                source:  io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            });
        }

        let target = cmd.target().unwrap_or_default().to_string();
        let out = match cmd.program.as_str() {
            "mount" => CommandOutput::exit(st.mount_code, st.mount_table.clone(), ""),

            // lsof exits 1 without output when nothing is open
            "lsof" => st.open_files.get(&target).cloned().unwrap_or_else(|| CommandOutput::exit(1, "", "")),

            "systemctl" if cmd.args.first().map(String::as_str) == Some("restart") => {
                CommandOutput::exit(st.restart_code, "", "")
            }
            "systemctl" => st.service_out.get("systemctl").cloned()
                .unwrap_or_else(|| CommandOutput::ok(AUTOFS_RUNNING)),

            "smbstatus" => st.service_out.get("smbstatus").cloned()
                .unwrap_or_else(|| CommandOutput::ok(SMB_NO_LOCKS)),

            "umount" => {
                let code = st.unmount_codes.get(&target).copied().unwrap_or(0);
                if code == 0 {
                    let marker = format!(" on {} type ", target);
                    let kept: String = st.mount_table
                        .lines()
                        .filter(|l| !l.contains(&marker))
                        .map(|l| format!("{}\n", l))
                        .collect();
                    st.mount_table = kept;
                    st.open_files.remove(&target);
                }
                CommandOutput::exit(code, "", if code == 0 { "" } else { "umount: target is busy." })
            }

            "kill" => {
                let pid: u32 = target.parse().unwrap_or(0);
                let code = st.kill_codes.get(&pid).copied().unwrap_or(0);
                if code == 0 {
                    for out in st.open_files.values_mut() {
                        out.stdout = without_pid(&out.stdout, &target);
                    }
                }
                let err = if code == 0 { String::new() } else { format!("kill: ({}) - No such process", target) };
                CommandOutput::exit(code, "", err)
            }

            _ => {
                return Err(CommandError::Spawn {
                    program: cmd.program.clone(),
                    source:  io::Error::new(io::ErrorKind::NotFound, "not provided by fixture"),
                });
            }
        };
        Ok(out)
    }

    fn fs_stats(&self, path: &str) -> Result<FsStats, StatError> {
        self.lock()
            .stats
            .get(path)
            .copied()
            .ok_or_else(|| StatError { path: path.to_string(), source: Errno::ENOENT })
    }
}

/// Build lsof output (header plus rows).
pub fn lsof_lines(rows: &[&str]) -> String {
    let mut s = String::from(LSOF_HEADER);
    s.push('\n');
    for r in rows {
        s.push_str(r);
        s.push('\n');
    }
    s
}

/// Stats for a filesystem with `total` bytes of which `free` are available,
/// in 4 KiB fragments.
pub fn stats(total: u64, free: u64) -> FsStats {
    FsStats { fragment_size: 4096, blocks: total / 4096, blocks_available: free / 4096 }
}

fn without_pid(lsof: &str, pid: &str) -> String {
    let mut lines = lsof.lines();
    let mut out = String::new();
    if let Some(header) = lines.next() {
        out.push_str(header);
        out.push('\n');
    }
    for line in lines {
        if line.split_whitespace().nth(1) != Some(pid) {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_unmount_removes_line_from_mount_table() {
        let host = FixtureHost::demo();
        let out = host.run(&CommandSpec::privileged("umount", ["--", "/media/usb0"])).unwrap();
        assert!(out.success());

        let table = host.run(&CommandSpec::new("mount", Vec::<String>::new())).unwrap();
        assert!(!table.stdout.contains("/media/usb0"));
        assert!(table.stdout.contains("/mnt/external"));
        assert_eq!(host.call_count("umount"), 1);
    }

    #[test]
    fn busy_unmount_leaves_state_alone() {
        let host = FixtureHost::demo();
        let out = host.run(&CommandSpec::privileged("umount", ["--", "/mnt/fail_unmount"])).unwrap();
        assert_eq!(out.code, Some(32));

        let table = host.run(&CommandSpec::new("mount", Vec::<String>::new())).unwrap();
        assert!(table.stdout.contains("/mnt/fail_unmount"));
    }

    #[test]
    fn kill_drops_holder_rows() {
        let host = FixtureHost::demo();
        host.run(&CommandSpec::privileged("kill", ["-9", "1234"])).unwrap();
        let out = host.run(&CommandSpec::privileged("lsof", ["--", "/media/usb0"])).unwrap();
        assert!(out.stdout.starts_with("COMMAND"));
        assert!(!out.stdout.contains(" 1234 "));
        assert!(out.stdout.contains(" 5678 "));
    }

    #[test]
    fn unavailable_program_fails_to_spawn() {
        let host = FixtureHost::demo();
        host.set_unavailable("smbstatus", true);
        let err = host.run(&CommandSpec::privileged("smbstatus", ["--locked"])).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    fn missing_stats_is_an_error() {
        let host = FixtureHost::new();
        assert!(host.fs_stats("/mnt/nowhere").is_err());
    }
}
