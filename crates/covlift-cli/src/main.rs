//! covlift: upload coverage data from a Jenkins job to SonarQube.
//!
//! Finds the builds of a Jenkins job that ran against the work appliance's
//! version, merges their coverage archives on that appliance, pulls the
//! merged report locally, and runs a sonar scan on the appliance.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use covlift_core::{
    harvest_coverage, init_tracing, Appliance, Credentials, HarvestConfig, HarvestError,
    HttpJenkinsClient, SshAppliance, SshShell,
};

#[derive(Parser)]
#[command(name = "covlift")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Upload coverage data from a Jenkins job to SonarQube", long_about = None)]
struct Cli {
    /// Jenkins server URL
    jenkins_url: String,

    /// Jenkins job whose builds carry the coverage archives
    jenkins_job_name: String,

    /// IP of the appliance the merge and scan run on
    work_appliance_ip: String,

    /// Jenkins login
    #[arg(long, env = "JENKINS_USER")]
    jenkins_user: Option<String>,

    /// Jenkins API token
    #[arg(long, env = "JENKINS_TOKEN")]
    jenkins_token: Option<String>,

    /// SonarQube server receiving the scan
    #[arg(long, env = "SONAR_URL")]
    sonar_url: String,

    /// Where the appliance downloads the sonar-scanner from
    #[arg(long, env = "SONAR_SCANNER_URL")]
    sonar_scanner_url: String,

    /// SonarQube project name
    #[arg(long, default_value = "CFME")]
    project_name: String,

    /// Remote directory the coverage archives accumulate in
    #[arg(long, default_value = "/coverage")]
    coverage_dir: String,

    /// Remote sonar-scanner install directory
    #[arg(long, default_value = "/root/scanner")]
    scanner_dir: String,

    /// Sonar scan timeout in seconds
    #[arg(long, default_value_t = 600)]
    scan_timeout: u64,

    /// Local directory receiving the merged report
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn credentials(&self) -> Result<Credentials, HarvestError> {
        match (&self.jenkins_user, &self.jenkins_token) {
            (Some(user), Some(token)) if !user.is_empty() && !token.is_empty() => {
                Ok(Credentials {
                    user: user.clone(),
                    token: token.clone(),
                })
            }
            _ => Err(HarvestError::MissingCredentials),
        }
    }

    fn harvest_config(&self) -> HarvestConfig {
        let mut config =
            HarvestConfig::new(self.sonar_url.clone(), self.sonar_scanner_url.clone());
        config.project_name = self.project_name.clone();
        config.coverage_dir = self.coverage_dir.clone();
        config.scanner_dir = self.scanner_dir.clone();
        config.scan_timeout = Duration::from_secs(self.scan_timeout);
        config.output_dir = self.output_dir.clone();
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json, cli.verbose);

    let credentials = cli.credentials()?;
    let config = cli.harvest_config();
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;

    let jenkins = HttpJenkinsClient::new(&cli.jenkins_url, credentials)
        .context("Failed to build Jenkins client")?;

    let shell = Arc::new(SshShell::new(&cli.work_appliance_ip));
    let appliance = SshAppliance::new(shell.clone(), config.clone());

    let version = appliance
        .version()
        .await
        .context("Failed to read appliance version")?;
    info!("Work appliance {} reports {}", cli.work_appliance_ip, version);

    let report = harvest_coverage(
        &jenkins,
        shell.as_ref(),
        &appliance,
        &config,
        &cli.jenkins_job_name,
        &version,
    )
    .await?;

    println!(
        "Merged coverage from builds {:?} of {}",
        report.eligible_builds, cli.jenkins_job_name
    );
    println!(
        "Coverage: {}",
        report.coverage.as_deref().unwrap_or("unknown")
    );
    println!("Merged report: {}", config.output_dir.join("merged").display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_is_an_error() {
        std::env::remove_var("JENKINS_USER");
        std::env::remove_var("JENKINS_TOKEN");
        let cli = Cli::parse_from([
            "covlift",
            "https://jenkins.example.com",
            "downstream-coverage",
            "10.1.2.3",
            "--sonar-url",
            "https://sonar.example.com",
            "--sonar-scanner-url",
            "https://sonar.example.com/scanner.zip",
        ]);
        assert!(matches!(
            cli.credentials(),
            Err(HarvestError::MissingCredentials)
        ));
    }

    #[test]
    fn test_config_from_arguments() {
        let cli = Cli::parse_from([
            "covlift",
            "https://jenkins.example.com",
            "downstream-coverage",
            "10.1.2.3",
            "--jenkins-user",
            "qe",
            "--jenkins-token",
            "t0k3n",
            "--sonar-url",
            "https://sonar.example.com",
            "--sonar-scanner-url",
            "https://sonar.example.com/scanner.zip",
            "--scan-timeout",
            "1200",
        ]);

        let credentials = cli.credentials().expect("credentials");
        assert_eq!(credentials.user, "qe");

        let config = cli.harvest_config();
        assert_eq!(config.scan_timeout, Duration::from_secs(1200));
        assert_eq!(config.sonar_server_url, "https://sonar.example.com");
        assert_eq!(config.project_name, "CFME");
    }
}
