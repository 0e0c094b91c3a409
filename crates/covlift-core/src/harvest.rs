//! Harvest orchestration.
//!
//! Drives a full run: select the eligible builds, prepare the appliance,
//! accumulate every build's coverage archive in the remote coverage
//! directory, merge, pull the merged report back, and hand the result to
//! the sonar scan. Strictly sequential; the first failing step aborts the
//! run.

use std::process::Stdio;

use regex::Regex;
use tracing::info;

use crate::appliance::Appliance;
use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::jenkins::JenkinsApi;
use crate::remote::RemoteShell;
use crate::select::{eligible_builds, COVERAGE_ARTIFACT};
use crate::sonar;
use crate::version::ApplianceVersion;

/// Outcome of a completed harvest run.
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Builds whose coverage data went into the merge, ascending.
    pub eligible_builds: Vec<u64>,

    /// Covered-LOC percentage reported by the merger, when present.
    pub coverage: Option<String>,
}

/// Run the whole harvest against one job and appliance.
pub async fn harvest_coverage(
    api: &dyn JenkinsApi,
    shell: &dyn RemoteShell,
    appliance: &dyn Appliance,
    config: &HarvestConfig,
    job: &str,
    target: &ApplianceVersion,
) -> HarvestResult<HarvestReport> {
    info!("Looking for appliance version {} in {}", target, job);
    let builds = eligible_builds(api, job, target).await?;

    // The server is not needed while merging and holds most of the
    // appliance's memory.
    appliance.stop_server().await?;
    appliance.install_coverage_tools().await?;

    checked_run(shell, config, &format!("mkdir -p {}", config.coverage_dir)).await?;

    for build in &builds {
        download_and_extract(api, shell, config, job, *build).await?;
    }

    let coverage = merge_coverage_data(shell, config).await?;
    pull_merged_coverage_data(shell, config).await?;
    sonar::scan(shell, config, target).await?;

    Ok(HarvestReport {
        eligible_builds: builds,
        coverage,
    })
}

/// Download one build's archive into the coverage directory and unpack it.
///
/// The archive nests everything under a single top-level directory, which
/// `--strip-components=1` removes so all builds accumulate into the same
/// tree.
async fn download_and_extract(
    api: &dyn JenkinsApi,
    shell: &dyn RemoteShell,
    config: &HarvestConfig,
    job: &str,
    build: u64,
) -> HarvestResult<()> {
    info!("Downloading the coverage data from build {}", build);

    let build_info = api.build_info(job, build).await?;
    let entry =
        build_info
            .artifact(COVERAGE_ARTIFACT)
            .ok_or_else(|| HarvestError::HttpFailed {
                url: format!("job/{}/{}/artifact/{}", job, build, COVERAGE_ARTIFACT),
                status: 404,
            })?;
    let url = api.artifact_url(job, build, &entry.relative_path)?;

    let download = format!("curl -k -o {}/tmp.tgz '{}'", config.coverage_dir, url);
    let output = shell
        .run_with_timeout(&download, config.download_timeout)
        .await?;
    if !output.success() {
        return Err(HarvestError::RemoteCommandFailed {
            command: download,
            detail: output.describe(),
        });
    }

    info!("Extracting the coverage data from build {}", build);
    let extract = format!(
        "cd {} && tar xf tmp.tgz --strip-components=1 && rm -f tmp.tgz",
        config.coverage_dir
    );
    checked_run(shell, config, &extract).await
}

/// Merge the accumulated per-process resultsets on the appliance.
///
/// Runs the uploaded merger through the rails runner; the merge writes
/// `merged/` under the coverage directory. The scanner expects the merged
/// resultset at the coverage root, hence the symlink. Returns the
/// covered-LOC percentage when the merger reports one.
async fn merge_coverage_data(
    shell: &dyn RemoteShell,
    config: &HarvestConfig,
) -> HarvestResult<Option<String>> {
    info!("Merging coverage data");

    let merge = format!(
        "cd {} && bin/rails runner {} --coverageRoot={}",
        config.rails_root,
        config.merger_script(),
        config.coverage_dir
    );
    let output = shell.run_with_timeout(&merge, config.merge_timeout).await?;
    if !output.success() {
        return Err(HarvestError::RemoteCommandFailed {
            command: merge,
            detail: output.describe(),
        });
    }

    info!("Coverage report generation was successful");
    let combined = format!("{}\n{}", output.stdout, output.stderr);
    let coverage = coverage_percent(&combined);
    match &coverage {
        Some(percent) => info!("COVERAGE={}", percent),
        None => info!("COVERAGE=unknown"),
    }

    let link = format!(
        "ln -s merged/.resultset.json {}/.resultset.json",
        config.coverage_dir
    );
    checked_run(shell, config, &link).await?;

    Ok(coverage)
}

/// Pack the merged report remotely, pull it down, and unpack it locally.
async fn pull_merged_coverage_data(
    shell: &dyn RemoteShell,
    config: &HarvestConfig,
) -> HarvestResult<()> {
    info!("Packing the generated HTML");
    let pack = format!("cd {} && tar cfz /tmp/merged.tgz merged", config.coverage_dir);
    checked_run(shell, config, &pack).await?;

    info!("Grabbing the generated HTML");
    let local_archive = config.output_dir.join("merged.tgz");
    shell.download("/tmp/merged.tgz", &local_archive).await?;

    info!("Locally decompressing the generated HTML");
    let output = tokio::process::Command::new("tar")
        .arg("xf")
        .arg(&local_archive)
        .arg("-C")
        .arg(&config.output_dir)
        .stdin(Stdio::null())
        .output()
        .await?;
    if !output.status.success() {
        return Err(HarvestError::LocalCommandFailed {
            command: format!("tar xf {}", local_archive.display()),
            detail: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    info!("Done!");
    Ok(())
}

async fn checked_run(
    shell: &dyn RemoteShell,
    config: &HarvestConfig,
    command: &str,
) -> HarvestResult<()> {
    let output = shell
        .run_with_timeout(command, config.command_timeout)
        .await?;
    if !output.success() {
        return Err(HarvestError::RemoteCommandFailed {
            command: command.to_string(),
            detail: output.describe(),
        });
    }
    Ok(())
}

/// Extract the covered-LOC percentage from the merger output.
fn coverage_percent(output: &str) -> Option<String> {
    let re = Regex::new(r"LOC\s+\((\d+\.\d+%)\)\s+covered\.").ok()?;
    re.captures(output).map(|captures| captures[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_percent_extracted() {
        let output = "Formatting...\n12034 / 20000 LOC (60.17%) covered.\n";
        assert_eq!(coverage_percent(output), Some("60.17%".to_string()));
    }

    #[test]
    fn test_coverage_percent_absent() {
        assert_eq!(coverage_percent("merger said nothing useful"), None);
    }
}
