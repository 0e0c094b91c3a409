//! SonarQube scanner installation and invocation.

use tracing::info;

use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::remote::RemoteShell;
use crate::version::ApplianceVersion;

/// SonarQube project key following the central-CI convention:
/// `<project-name>_<major>_<minor>_<language>_<coverage|static|full-analysis>`.
///
/// Version components past `major.minor` are allowed and ignored, but the
/// `major.minor` prefix itself is required.
///
/// `gen_project_key("CFME", "5.9.0.21")` yields `CFME_5_9_ruby_coverage`.
pub fn gen_project_key(name: &str, version: &str) -> HarvestResult<String> {
    let parsed: ApplianceVersion = version.parse()?;
    if !parsed.has_minor() {
        return Err(HarvestError::InvalidVersion {
            input: version.to_string(),
        });
    }
    Ok(format!(
        "{}_{}_{}_ruby_coverage",
        name,
        parsed.major(),
        parsed.minor()
    ))
}

/// Contents of `sonar-project.properties` for the scan.
///
/// `sonar.sources` must list the source directories as paths relative to
/// `/` (the scanner is run from there); absolute paths make the scanner
/// drop everything but the last entry.
pub fn render_project_properties(
    project_name: &str,
    version: &ApplianceVersion,
) -> HarvestResult<String> {
    let project_key = gen_project_key(project_name, &version.to_string())?;
    Ok(format!(
        "sonar.projectKey={key}\n\
         sonar.projectName={name}\n\
         sonar.projectVersion={version}\n\
         sonar.language=ruby\n\
         sonar.sources=opt/rh/cfme-gemset,var/www/miq/vmdb\n",
        key = project_key,
        name = project_name,
        version = version,
    ))
}

async fn checked_run(shell: &dyn RemoteShell, command: &str) -> HarvestResult<()> {
    let output = shell.run(command).await?;
    if !output.success() {
        return Err(HarvestError::RemoteCommandFailed {
            command: command.to_string(),
            detail: output.describe(),
        });
    }
    Ok(())
}

/// Install the sonar-scanner on the appliance and configure the project.
///
/// Downloads the scanner zip, extracts it into the scanner directory and
/// flattens the single versioned directory the zip contains (its name
/// changes with scanner releases, so it is globbed rather than assumed),
/// points the scanner at the server, and uploads the rendered
/// `sonar-project.properties` to `/` where the scan runs.
pub async fn install_scanner(
    shell: &dyn RemoteShell,
    config: &HarvestConfig,
    version: &ApplianceVersion,
) -> HarvestResult<()> {
    info!("Installing sonar scanner on appliance");

    checked_run(shell, &format!("mkdir -p {}", config.scanner_dir)).await?;

    checked_run(
        shell,
        &format!(
            "wget -O {} '{}'",
            config.scanner_zip, config.sonar_scanner_url
        ),
    )
    .await?;

    checked_run(
        shell,
        &format!("unzip -d {} {}", config.scanner_dir, config.scanner_zip),
    )
    .await?;

    checked_run(shell, &format!("cd {} && mv $(ls)/* .", config.scanner_dir)).await?;

    let scanner_conf = format!("{}/conf/sonar-scanner.properties", config.scanner_dir);
    checked_run(
        shell,
        &format!(
            "echo \"sonar.host.url={}\" > {}",
            config.sonar_server_url, scanner_conf
        ),
    )
    .await?;

    let properties = render_project_properties(&config.project_name, version)?;
    let local_conf = config.output_dir.join("sonar-project.properties");
    info!("Writing {}", local_conf.display());
    tokio::fs::write(&local_conf, properties).await?;
    shell.upload(&local_conf, "/sonar-project.properties").await?;

    Ok(())
}

/// Run the sonar-scanner, bounded by the configured scan timeout.
///
/// The scan runs from `/` so both source trees named in the project
/// properties sit under the scanner's project root.
pub async fn run_scanner(shell: &dyn RemoteShell, config: &HarvestConfig) -> HarvestResult<()> {
    info!("Running sonar scan, this may take a while");
    info!("  timeout={}s", config.scan_timeout.as_secs());

    let command = format!(
        "cd / && SONAR_SCANNER_OPTS=\"-Xmx4096m\" {}/bin/sonar-scanner -X",
        config.scanner_dir
    );
    let output = shell.run_with_timeout(&command, config.scan_timeout).await?;
    if !output.success() {
        return Err(HarvestError::RemoteCommandFailed {
            command,
            detail: output.describe(),
        });
    }

    info!("Sonar scan finished");
    Ok(())
}

/// Install the scanner and run the scan.
pub async fn scan(
    shell: &dyn RemoteShell,
    config: &HarvestConfig,
    version: &ApplianceVersion,
) -> HarvestResult<()> {
    install_scanner(shell, config, version).await?;
    run_scanner(shell, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fakes::ScriptedShell;
    use tempfile::tempdir;

    #[test]
    fn test_gen_project_key() {
        let key = gen_project_key("CFME", "5.9.0.21").expect("key");
        assert_eq!(key, "CFME_5_9_ruby_coverage");
    }

    #[test]
    fn test_gen_project_key_two_components_suffice() {
        let key = gen_project_key("CFME", "5.9").expect("key");
        assert_eq!(key, "CFME_5_9_ruby_coverage");
    }

    #[test]
    fn test_gen_project_key_rejects_malformed() {
        assert!(gen_project_key("CFME", "banana").is_err());
        assert!(gen_project_key("CFME", "5").is_err());
        assert!(gen_project_key("CFME", "").is_err());
    }

    #[test]
    fn test_render_project_properties() {
        let version: ApplianceVersion = "5.9.0.17".parse().expect("version");
        let properties = render_project_properties("CFME", &version).expect("properties");
        assert!(properties.contains("sonar.projectKey=CFME_5_9_ruby_coverage"));
        assert!(properties.contains("sonar.projectName=CFME"));
        assert!(properties.contains("sonar.projectVersion=5.9.0.17"));
        assert!(properties.contains("sonar.sources=opt/rh/cfme-gemset,var/www/miq/vmdb"));
    }

    #[tokio::test]
    async fn test_install_scanner_command_sequence() {
        let tmp = tempdir().expect("tempdir");
        let shell = ScriptedShell::new();
        let mut config = HarvestConfig::new(
            "https://sonar.example.com".to_string(),
            "https://downloads.example.com/sonar-scanner.zip".to_string(),
        );
        config.output_dir = tmp.path().to_path_buf();
        let version: ApplianceVersion = "5.9.0.21".parse().expect("version");

        install_scanner(&shell, &config, &version).await.expect("install");

        let history = shell.history();
        assert!(history[0].contains("mkdir -p /root/scanner"));
        assert!(history[1].contains("wget -O /root/scanner.zip"));
        assert!(history[2].contains("unzip -d /root/scanner /root/scanner.zip"));
        assert!(history[3].contains("mv $(ls)/* ."));
        assert!(history[4].contains("sonar.host.url=https://sonar.example.com"));

        let uploads = shell.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, "/sonar-project.properties");
        let contents =
            std::fs::read_to_string(tmp.path().join("sonar-project.properties")).expect("conf");
        assert!(contents.contains("sonar.projectKey=CFME_5_9_ruby_coverage"));
    }

    #[tokio::test]
    async fn test_failed_wget_aborts_install() {
        let tmp = tempdir().expect("tempdir");
        let shell = ScriptedShell::new().fail_matching("wget", 4, "network unreachable");
        let mut config = HarvestConfig::new(
            "https://sonar.example.com".to_string(),
            "https://downloads.example.com/sonar-scanner.zip".to_string(),
        );
        config.output_dir = tmp.path().to_path_buf();
        let version: ApplianceVersion = "5.9.0.21".parse().expect("version");

        let err = install_scanner(&shell, &config, &version).await.unwrap_err();
        assert!(matches!(err, HarvestError::RemoteCommandFailed { .. }));
        // The failed download must stop the sequence before unzip.
        assert!(!shell.ran("unzip"));
    }

    #[tokio::test]
    async fn test_run_scanner_failure_surfaces() {
        let shell = ScriptedShell::new().fail_matching("sonar-scanner", 1, "scan failed");
        let config = HarvestConfig::new(
            "https://sonar.example.com".to_string(),
            "https://downloads.example.com/sonar-scanner.zip".to_string(),
        );

        let err = run_scanner(&shell, &config).await.unwrap_err();
        match err {
            HarvestError::RemoteCommandFailed { command, .. } => {
                assert!(command.contains("sonar-scanner -X"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
