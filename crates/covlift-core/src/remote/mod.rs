//! Remote command execution.
//!
//! [`RemoteShell`] is the seam between the harvest orchestration and the
//! appliance: run a command, move files both ways. The production
//! implementation ([`SshShell`]) drives the system `ssh`/`scp` binaries;
//! [`fakes::ScriptedShell`] replaces it in tests.

pub mod fakes;
pub mod ssh;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::HarvestResult;

pub use ssh::SshShell;

/// Default bound for ordinary remote commands.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Captured result of one remote command.
#[derive(Debug, Clone)]
pub struct ShellOutput {
    /// Exit code (-1 when the process died without one).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,
}

impl ShellOutput {
    /// Whether the command exited 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// One-line summary used in error messages.
    pub fn describe(&self) -> String {
        format!(
            "exit={} stdout={:?} stderr={:?}",
            self.exit_code,
            self.stdout.trim(),
            self.stderr.trim()
        )
    }
}

/// A shell session on the appliance.
///
/// A non-zero exit code is reported through [`ShellOutput`], not as an
/// error; callers decide which commands are allowed to fail. Errors are
/// reserved for transport problems and timeouts.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run a command bounded by an explicit timeout.
    async fn run_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> HarvestResult<ShellOutput>;

    /// Run a command with the default timeout.
    async fn run(&self, command: &str) -> HarvestResult<ShellOutput> {
        self.run_with_timeout(command, DEFAULT_COMMAND_TIMEOUT).await
    }

    /// Copy a local file onto the appliance.
    async fn upload(&self, local: &Path, remote: &str) -> HarvestResult<()>;

    /// Copy a file from the appliance to the local machine.
    async fn download(&self, remote: &str, local: &Path) -> HarvestResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_output_success() {
        let output = ShellOutput {
            exit_code: 0,
            stdout: "ok\n".to_string(),
            stderr: String::new(),
        };
        assert!(output.success());
    }

    #[test]
    fn test_shell_output_failure_describe() {
        let output = ShellOutput {
            exit_code: 2,
            stdout: String::new(),
            stderr: "tar: error\n".to_string(),
        };
        assert!(!output.success());
        assert!(output.describe().contains("exit=2"));
        assert!(output.describe().contains("tar: error"));
    }
}
