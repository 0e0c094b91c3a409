//! SSH-backed remote shell.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{HarvestError, HarvestResult};
use crate::remote::{RemoteShell, ShellOutput};

/// Remote shell over the system `ssh`/`scp` binaries.
///
/// Appliances are throwaway lab VMs with unknown host keys, so host key
/// checking is off and `BatchMode` keeps a missing key from degenerating
/// into a password prompt.
pub struct SshShell {
    user: String,
    host: String,
}

impl SshShell {
    pub fn new(host: &str) -> Self {
        SshShell {
            user: "root".to_string(),
            host: host.to_string(),
        }
    }

    pub fn with_user(host: &str, user: &str) -> Self {
        SshShell {
            user: user.to_string(),
            host: host.to_string(),
        }
    }

    fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn common_options() -> Vec<String> {
        [
            "-o",
            "BatchMode=yes",
            "-o",
            "StrictHostKeyChecking=no",
            "-o",
            "UserKnownHostsFile=/dev/null",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = Self::common_options();
        args.push(self.target());
        args.push(command.to_string());
        args
    }

    fn scp_upload_args(&self, local: &Path, remote: &str) -> Vec<String> {
        let mut args = Self::common_options();
        args.push(local.to_string_lossy().into_owned());
        args.push(format!("{}:{}", self.target(), remote));
        args
    }

    fn scp_download_args(&self, remote: &str, local: &Path) -> Vec<String> {
        let mut args = Self::common_options();
        args.push(format!("{}:{}", self.target(), remote));
        args.push(local.to_string_lossy().into_owned());
        args
    }

    async fn run_process(
        program: &str,
        args: &[String],
        description: &str,
        timeout: Duration,
    ) -> HarvestResult<ShellOutput> {
        debug!("{} {:?}", program, args);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| HarvestError::RemoteCommandFailed {
                command: description.to_string(),
                detail: format!("timed out after {} seconds", timeout.as_secs()),
            })??;

        Ok(ShellOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn run_with_timeout(
        &self,
        command: &str,
        timeout: Duration,
    ) -> HarvestResult<ShellOutput> {
        let args = self.ssh_args(command);
        Self::run_process("ssh", &args, command, timeout).await
    }

    async fn upload(&self, local: &Path, remote: &str) -> HarvestResult<()> {
        let args = self.scp_upload_args(local, remote);
        let description = format!("scp {} -> {}", local.display(), remote);
        let output =
            Self::run_process("scp", &args, &description, super::DEFAULT_COMMAND_TIMEOUT).await?;
        if !output.success() {
            return Err(HarvestError::RemoteCommandFailed {
                command: description,
                detail: output.describe(),
            });
        }
        Ok(())
    }

    async fn download(&self, remote: &str, local: &Path) -> HarvestResult<()> {
        let args = self.scp_download_args(remote, local);
        let description = format!("scp {} -> {}", remote, local.display());
        let output =
            Self::run_process("scp", &args, &description, super::DEFAULT_COMMAND_TIMEOUT).await?;
        if !output.success() {
            return Err(HarvestError::RemoteCommandFailed {
                command: description,
                detail: output.describe(),
            });
        }
        Ok(())
    }
}
