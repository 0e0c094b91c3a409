//! Error types for covlift

use thiserror::Error;

/// Errors that can occur while harvesting and uploading coverage data
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Jenkins credentials were not supplied
    #[error(
        "Jenkins credentials missing: pass --jenkins-user/--jenkins-token \
         or set JENKINS_USER/JENKINS_TOKEN"
    )]
    MissingCredentials,

    /// The job exists but returned no builds
    #[error("No builds for job {job}")]
    NoBuilds { job: String },

    /// No build matched the target version with a downloadable archive
    #[error("Could not find any coverage reports for {version} in {job}")]
    NoEligibleBuilds { version: String, job: String },

    /// Version string could not be parsed
    #[error("Invalid version string, expected #.#[... .#], received: {input}")]
    InvalidVersion { input: String },

    /// A URL could not be constructed
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    /// HTTP request completed with a failure status
    #[error("HTTP request to {url} failed with status {status}")]
    HttpFailed { url: String, status: u16 },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(String),

    /// A command on the appliance failed or timed out
    #[error("Remote command failed: {command} - {detail}")]
    RemoteCommandFailed { command: String, detail: String },

    /// A command on the local machine failed
    #[error("Local command failed: {command} - {detail}")]
    LocalCommandFailed { command: String, detail: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for HarvestError {
    fn from(err: reqwest::Error) -> Self {
        HarvestError::Http(err.to_string())
    }
}

/// Result type for harvest operations
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;
