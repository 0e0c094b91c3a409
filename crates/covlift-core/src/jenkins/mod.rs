//! Jenkins API client and wire models.

pub mod client;
pub mod fakes;
pub mod model;

pub use client::{Credentials, HttpJenkinsClient, JenkinsApi};
pub use model::{ArtifactEntry, BuildInfo, BuildRef, JobInfo};
