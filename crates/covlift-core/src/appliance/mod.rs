//! Appliance operations.
//!
//! The appliance under test is an external collaborator: it reports its
//! version, its server can be stopped, and the coverage tooling (simplecov
//! plus the merger script) can be installed on it. [`SshAppliance`] does
//! all of that through a [`RemoteShell`].

pub mod fakes;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::remote::RemoteShell;
use crate::version::ApplianceVersion;

/// Merger script shipped with the tool and uploaded into the rails root.
const COVERAGE_MERGER: &str = include_str!("../../assets/coverage_merger.rb");

/// The collaborator surface of the appliance under test.
#[async_trait]
pub trait Appliance: Send + Sync {
    /// Version the appliance reports.
    async fn version(&self) -> HarvestResult<ApplianceVersion>;

    /// Stop the server process; it is not needed while merging and holds
    /// most of the appliance's memory.
    async fn stop_server(&self) -> HarvestResult<()>;

    /// Install simplecov and upload the merger script.
    async fn install_coverage_tools(&self) -> HarvestResult<()>;
}

/// SSH-backed appliance operations.
pub struct SshAppliance {
    shell: Arc<dyn RemoteShell>,
    config: HarvestConfig,
}

impl SshAppliance {
    pub fn new(shell: Arc<dyn RemoteShell>, config: HarvestConfig) -> Self {
        SshAppliance { shell, config }
    }

    async fn checked_run(&self, command: &str) -> HarvestResult<String> {
        let output = self.shell.run(command).await?;
        if !output.success() {
            return Err(HarvestError::RemoteCommandFailed {
                command: command.to_string(),
                detail: output.describe(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl Appliance for SshAppliance {
    async fn version(&self) -> HarvestResult<ApplianceVersion> {
        let command = format!("cat {}", self.config.version_file());
        let stdout = self.checked_run(&command).await?;
        stdout.trim().parse()
    }

    async fn stop_server(&self) -> HarvestResult<()> {
        info!("Stopping evmserverd");
        self.checked_run("systemctl stop evmserverd").await?;
        Ok(())
    }

    async fn install_coverage_tools(&self) -> HarvestResult<()> {
        info!("Installing simplecov");
        self.checked_run("source /etc/default/evm && gem install --conservative simplecov")
            .await?;

        info!("Installing coverage merger");
        let local = self.config.output_dir.join("coverage_merger.rb");
        tokio::fs::write(&local, COVERAGE_MERGER).await?;
        self.shell.upload(&local, &self.config.merger_script()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fakes::ScriptedShell;
    use tempfile::tempdir;

    fn config_with_output(dir: &std::path::Path) -> HarvestConfig {
        let mut config = HarvestConfig::new(
            "https://sonar.example.com".to_string(),
            "https://sonar.example.com/scanner.zip".to_string(),
        );
        config.output_dir = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_version_reads_version_file() {
        let tmp = tempdir().expect("tempdir");
        let shell = Arc::new(
            ScriptedShell::new().respond_with("cat /var/www/miq/vmdb/VERSION", "5.9.0.21\n"),
        );
        let appliance = SshAppliance::new(shell, config_with_output(tmp.path()));

        let version = appliance.version().await.expect("version");
        assert_eq!(version.to_string(), "5.9.0.21");
    }

    #[tokio::test]
    async fn test_version_failure_is_remote_command_failed() {
        let tmp = tempdir().expect("tempdir");
        let shell =
            Arc::new(ScriptedShell::new().fail_matching("cat", 1, "No such file or directory"));
        let appliance = SshAppliance::new(shell, config_with_output(tmp.path()));

        let err = appliance.version().await.unwrap_err();
        assert!(matches!(err, HarvestError::RemoteCommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_install_uploads_merger_script() {
        let tmp = tempdir().expect("tempdir");
        let shell = Arc::new(ScriptedShell::new());
        let appliance = SshAppliance::new(shell.clone(), config_with_output(tmp.path()));

        appliance.install_coverage_tools().await.expect("install");

        assert!(shell.ran("gem install --conservative simplecov"));
        let uploads = shell.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, "/var/www/miq/vmdb/coverage_merger.rb");
        let body = std::fs::read_to_string(&uploads[0].0).expect("merger written locally");
        assert!(body.contains("SimpleCov"));
    }
}
