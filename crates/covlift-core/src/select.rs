//! Build selection.
//!
//! Walks a job's build history newest first and keeps the builds whose
//! declared appliance version equals the target and whose coverage archive
//! is confirmed downloadable. Versions are monotonically non-increasing as
//! build numbers decrease, so the scan stops at the first build declaring a
//! strictly lower version.

use std::collections::BTreeSet;

use tracing::info;

use crate::error::{HarvestError, HarvestResult};
use crate::jenkins::JenkinsApi;
use crate::version::ApplianceVersion;

/// Artifact declaring the appliance version a build ran against.
pub const VERSION_ARTIFACT: &str = "appliance_version";

/// Artifact holding the per-process coverage archive of a build.
pub const COVERAGE_ARTIFACT: &str = "coverage-results.tgz";

/// Build numbers eligible for harvesting, sorted ascending.
///
/// A build is eligible when it has an `appliance_version` artifact whose
/// content equals `target` and a `coverage-results.tgz` artifact that
/// responds to an existence check. Fails with [`HarvestError::NoBuilds`]
/// when the job has no builds at all, and with
/// [`HarvestError::NoEligibleBuilds`] when the scan finds nothing.
pub async fn eligible_builds(
    api: &dyn JenkinsApi,
    job: &str,
    target: &ApplianceVersion,
) -> HarvestResult<Vec<u64>> {
    let job_info = api.job_info(job).await?;
    if job_info.builds.is_empty() {
        return Err(HarvestError::NoBuilds {
            job: job.to_string(),
        });
    }

    let mut eligible = BTreeSet::new();

    for build_ref in &job_info.builds {
        let number = build_ref.number;
        let build = api.build_info(job, number).await?;

        if build.artifacts.is_empty() {
            info!("No artifacts for {}/{}", job, number);
            continue;
        }

        let version_artifact = match build.artifact(VERSION_ARTIFACT) {
            Some(entry) => entry,
            None => {
                info!("{} not in artifacts of {}/{}", VERSION_ARTIFACT, job, number);
                continue;
            }
        };

        let declared = api
            .fetch_artifact(job, number, &version_artifact.relative_path)
            .await?;
        let declared = declared.trim();
        if declared.is_empty() {
            info!("Appliance version unspecified for build {}", number);
            continue;
        }

        let build_version: ApplianceVersion = match declared.parse() {
            Ok(v) => v,
            Err(_) => {
                info!(
                    "Unparseable appliance version {:?} for build {}",
                    declared, number
                );
                continue;
            }
        };

        if build_version < *target {
            info!(
                "Build {} already has lower version ({})",
                number, build_version
            );
            info!("Ending here");
            break;
        }

        let coverage_artifact = match build.artifact(COVERAGE_ARTIFACT) {
            Some(entry) => entry,
            None => {
                info!(
                    "{} not in artifacts of {}/{}",
                    COVERAGE_ARTIFACT, job, number
                );
                continue;
            }
        };

        if !api
            .artifact_exists(job, number, &coverage_artifact.relative_path)
            .await?
        {
            info!("Coverage archive not possible to be downloaded, skipping");
            continue;
        }

        if build_version == *target {
            info!("Build {} was found to contain what is needed", number);
            eligible.insert(number);
        } else {
            info!(
                "Skipping build {} because it does not have correct version ({})",
                number, build_version
            );
        }
    }

    if eligible.is_empty() {
        return Err(HarvestError::NoEligibleBuilds {
            version: target.to_string(),
            job: job.to_string(),
        });
    }

    Ok(eligible.into_iter().collect())
}
