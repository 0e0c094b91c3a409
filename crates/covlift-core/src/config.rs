//! Harvest run configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a harvest run.
///
/// Everything the original deployment kept as site-wide settings lives
/// here and is passed explicitly to the components that need it.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Remote directory where coverage archives are accumulated and merged.
    pub coverage_dir: String,

    /// Rails root on the appliance (also holds the VERSION file).
    pub rails_root: String,

    /// Remote install directory for the sonar-scanner.
    pub scanner_dir: String,

    /// Remote download path for the scanner zip.
    pub scanner_zip: String,

    /// SonarQube server that receives the scan.
    pub sonar_server_url: String,

    /// Where the appliance downloads the sonar-scanner from.
    pub sonar_scanner_url: String,

    /// SonarQube project name.
    pub project_name: String,

    /// Bound on each archive download on the appliance.
    pub download_timeout: Duration,

    /// Bound on the remote merge step.
    pub merge_timeout: Duration,

    /// Bound on the sonar scan.
    pub scan_timeout: Duration,

    /// Bound on ordinary remote commands.
    pub command_timeout: Duration,

    /// Local directory receiving merged.tgz and its extracted contents.
    pub output_dir: PathBuf,
}

impl HarvestConfig {
    /// Configuration with site defaults for the given SonarQube endpoints.
    pub fn new(sonar_server_url: String, sonar_scanner_url: String) -> Self {
        HarvestConfig {
            coverage_dir: "/coverage".to_string(),
            rails_root: "/var/www/miq/vmdb".to_string(),
            scanner_dir: "/root/scanner".to_string(),
            scanner_zip: "/root/scanner.zip".to_string(),
            sonar_server_url,
            sonar_scanner_url,
            project_name: "CFME".to_string(),
            download_timeout: Duration::from_secs(600),
            merge_timeout: Duration::from_secs(60 * 60),
            scan_timeout: Duration::from_secs(600),
            command_timeout: Duration::from_secs(60),
            output_dir: PathBuf::from("."),
        }
    }

    /// Remote path of the VERSION file.
    pub fn version_file(&self) -> String {
        format!("{}/VERSION", self.rails_root)
    }

    /// Remote path the merger script is uploaded to.
    pub fn merger_script(&self) -> String {
        format!("{}/coverage_merger.rb", self.rails_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::new(
            "https://sonar.example.com".to_string(),
            "https://sonar.example.com/scanner.zip".to_string(),
        );
        assert_eq!(config.coverage_dir, "/coverage");
        assert_eq!(config.scanner_dir, "/root/scanner");
        assert_eq!(config.project_name, "CFME");
        assert_eq!(config.version_file(), "/var/www/miq/vmdb/VERSION");
        assert_eq!(config.merger_script(), "/var/www/miq/vmdb/coverage_merger.rb");
        assert_eq!(config.scan_timeout, Duration::from_secs(600));
    }
}
