//! covlift-core: Jenkins coverage harvesting for SonarQube upload.
//!
//! A harvest run walks a Jenkins job's build history for builds matching
//! the target appliance's version, accumulates their per-process coverage
//! archives on the appliance over SSH, merges them there, pulls the merged
//! report back to the local machine, and drives a sonar-scanner run on the
//! appliance to upload the result.
//!
//! ## Seams
//!
//! The two external collaborators sit behind traits so the orchestration
//! is testable without a lab:
//!
//! - [`JenkinsApi`]: build lists, artifact fetches and existence checks
//!   ([`HttpJenkinsClient`] in production, [`jenkins::fakes::FakeJenkins`]
//!   in tests).
//! - [`RemoteShell`]: command execution and file transfer on the
//!   appliance ([`SshShell`] in production,
//!   [`remote::fakes::ScriptedShell`] in tests), with [`Appliance`]
//!   layering the appliance-specific operations on top.

pub mod appliance;
pub mod config;
pub mod error;
pub mod harvest;
pub mod jenkins;
pub mod remote;
pub mod select;
pub mod sonar;
pub mod telemetry;
pub mod version;

pub use appliance::{Appliance, SshAppliance};
pub use config::HarvestConfig;
pub use error::{HarvestError, HarvestResult};
pub use harvest::{harvest_coverage, HarvestReport};
pub use jenkins::{Credentials, HttpJenkinsClient, JenkinsApi};
pub use remote::{RemoteShell, ShellOutput, SshShell};
pub use select::{eligible_builds, COVERAGE_ARTIFACT, VERSION_ARTIFACT};
pub use sonar::gen_project_key;
pub use telemetry::init_tracing;
pub use version::ApplianceVersion;
