use super::{CommandOutput, CommandSpec, FsStats, Host};
use crate::error::{CommandError, StatError};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::Read;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const TERM_GRACE:    Duration = Duration::from_millis(200);

/// Runs commands on the real host with a hard deadline per invocation.
#[derive(Debug, Clone)]
pub struct SystemHost {
    use_sudo: bool,
    timeout:  Duration,
}

impl SystemHost {
    pub fn new(use_sudo: bool, timeout: Duration) -> Self {
        Self { use_sudo, timeout }
    }

    /// Program and argument vector actually executed for `cmd`.
    fn argv(&self, cmd: &CommandSpec) -> (String, Vec<String>) {
        if cmd.privileged && self.use_sudo {
            let mut args = Vec::with_capacity(cmd.args.len() + 2);
            // -n: fail instead of prompting for a password we cannot supply
            args.push("-n".to_string());
            args.push(cmd.program.clone());
            args.extend(cmd.args.iter().cloned());
            ("sudo".to_string(), args)
        } else {
            (cmd.program.clone(), cmd.args.clone())
        }
    }
}

impl Host for SystemHost {
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let (program, args) = self.argv(cmd);
        tracing::debug!(command = %cmd.display(), sudo = program == "sudo", "exec");

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // own process group, so a timeout reaches whatever sudo started too
            .process_group(0)
            .spawn()
            .map_err(|source| CommandError::Spawn { program: cmd.program.clone(), source })?;

        // Drain both pipes concurrently so a chatty child never blocks on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    terminate(&mut child);
                    tracing::warn!(command = %cmd.display(), timeout_secs = self.timeout.as_secs(), "command timed out, killed");
                    return Err(CommandError::Timeout { program: cmd.program.clone(), after: self.timeout });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(CommandError::Spawn { program: cmd.program.clone(), source });
                }
            }
        };

        Ok(CommandOutput {
            code:   status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }

    fn fs_stats(&self, path: &str) -> Result<FsStats, StatError> {
        use nix::sys::statvfs::statvfs;
        let stat = statvfs(path).map_err(|source| StatError { path: path.to_string(), source })?;

        Ok(FsStats {
            fragment_size:    stat.fragment_size() as u64,
            blocks:           stat.blocks() as u64,
            blocks_available: stat.blocks_available() as u64,
        })
    }
}

/// SIGTERM to the whole group first: sudo relays it to a command running as
/// root, which we cannot signal directly. Whatever is left gets SIGKILL.
fn terminate(child: &mut Child) {
    let group = Pid::from_raw(child.id() as i32);
    let _ = killpg(group, Signal::SIGTERM);

    let until = Instant::now() + TERM_GRACE;
    while Instant::now() < until {
        if let Ok(Some(_)) = child.try_wait() {
            let _ = killpg(group, Signal::SIGKILL);
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
    let _ = killpg(group, Signal::SIGKILL);
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut p) = pipe {
            let _ = p.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privileged_commands_go_through_sudo() {
        let host = SystemHost::new(true, Duration::from_secs(1));
        let (prog, args) = host.argv(&CommandSpec::privileged("umount", ["--", "/mnt/a b"]));
        assert_eq!(prog, "sudo");
        assert_eq!(args, vec!["-n", "umount", "--", "/mnt/a b"]);

        let (prog, args) = host.argv(&CommandSpec::new("mount", Vec::<String>::new()));
        assert_eq!(prog, "mount");
        assert!(args.is_empty());
    }

    #[test]
    fn sudo_can_be_disabled() {
        let host = SystemHost::new(false, Duration::from_secs(1));
        let (prog, args) = host.argv(&CommandSpec::privileged("kill", ["-9", "42"]));
        assert_eq!(prog, "kill");
        assert_eq!(args, vec!["-9", "42"]);
    }

    #[test]
    fn exit_code_and_output_are_captured() {
        let host = SystemHost::new(false, Duration::from_secs(5));

        let out = host.run(&CommandSpec::new("true", Vec::<String>::new())).unwrap();
        assert_eq!(out.code, Some(0));

        let out = host.run(&CommandSpec::new("sh", ["-c", "echo held; echo busy >&2; exit 3"])).unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout, "held\n");
        assert_eq!(out.stderr, "busy\n");
    }

    #[test]
    fn slow_command_is_killed_at_the_deadline() {
        let host = SystemHost::new(false, Duration::from_secs(1));
        let started = Instant::now();

        let err = host.run(&CommandSpec::new("sleep", ["5"])).unwrap_err();
        let took = started.elapsed();

        assert!(matches!(err, CommandError::Timeout { ref program, after } if program == "sleep" && after == Duration::from_secs(1)));
        assert!(took >= Duration::from_secs(1), "returned after {took:?}");
        assert!(took < Duration::from_secs(3), "returned after {took:?}");
    }

    #[test]
    fn timeout_reaches_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survived");
        let script = format!("(sleep 2; touch '{}') & wait", marker.display());

        let host = SystemHost::new(false, Duration::from_millis(300));
        let err = host.run(&CommandSpec::new("sh", ["-c", script.as_str()])).unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));

        thread::sleep(Duration::from_millis(2500));
        assert!(!marker.exists());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let host = SystemHost::new(false, Duration::from_secs(1));
        let err = host.run(&CommandSpec::new("unmounter-no-such-tool", Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
