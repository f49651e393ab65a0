//! The seam between the engine and the operating system.
//!
//! Everything the engine learns about the host (mount table, open files,
//! service state, filesystem statistics) and everything it changes
//! (unmount, kill, restart) goes through [`Host`]. [`SystemHost`] talks to
//! the real system; [`FixtureHost`] serves canned output for tests and for
//! `--fixture` runs.

pub mod fixture;
pub mod system;

pub use fixture::FixtureHost;
pub use system::SystemHost;

use crate::error::{CommandError, StatError};

/// One external command: program plus argument vector. Never passed through
/// a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program:    String,
    pub args:       Vec<String>,
    /// Needs elevated privileges (run through sudo on real hosts)
    pub privileged: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program:    program.to_string(),
            args:       args.into_iter().map(Into::into).collect(),
            privileged: false,
        }
    }

    pub fn privileged<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { privileged: true, ..Self::new(program, args) }
    }

    /// The last argument, which for every command we issue is the target
    /// (path or pid).
    pub fn target(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        for a in &self.args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub code:   Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { code: Some(0), stdout: stdout.into(), stderr: String::new() }
    }

    pub fn exit(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self { code: Some(code), stdout: stdout.into(), stderr: stderr.into() }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// True when the command printed nothing at all.
    pub fn is_silent(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }

    /// stdout followed by stderr, the way a terminal would show them.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true)     => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }

    pub fn into_failure(self, program: &str) -> CommandError {
        CommandError::Failed {
            program: program.to_string(),
            code:    self.code,
            output:  self.combined(),
        }
    }
}

/// Raw block counts for one mounted filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    pub fragment_size:    u64,
    pub blocks:           u64,
    pub blocks_available: u64,
}

pub trait Host: Send + Sync {
    /// Run a command to completion. Any exit status is `Ok`; only a failure
    /// to start or a timeout is an error.
    fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, CommandError>;

    fn fs_stats(&self, path: &str) -> Result<FsStats, StatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_output_orders_stdout_first() {
        let out = CommandOutput::exit(1, "partial\n", "lsof: WARNING\n");
        assert_eq!(out.combined(), "partial\nlsof: WARNING\n");
        assert!(!out.success());
        assert!(!out.is_silent());
        assert!(CommandOutput::exit(1, "", " \n").is_silent());
    }

    #[test]
    fn spec_display_and_target() {
        let cmd = CommandSpec::privileged("umount", ["--", "/mnt/my disk"]);
        assert!(cmd.privileged);
        assert_eq!(cmd.target(), Some("/mnt/my disk"));
        assert_eq!(cmd.display(), "umount -- /mnt/my disk");
    }
}
