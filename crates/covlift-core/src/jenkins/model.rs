//! Wire models for the Jenkins JSON API.

use serde::Deserialize;

/// Response of `/job/{name}/api/json?tree=builds[number]`.
///
/// Jenkins returns builds newest first; the selector depends on that order.
#[derive(Debug, Clone, Deserialize)]
pub struct JobInfo {
    #[serde(default)]
    pub builds: Vec<BuildRef>,
}

/// A build reference inside a job's build list.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildRef {
    pub number: u64,
}

/// Response of `/job/{name}/{number}/api/json?tree=artifacts[fileName,relativePath]`.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildInfo {
    #[serde(default)]
    pub artifacts: Vec<ArtifactEntry>,
}

impl BuildInfo {
    /// Look up an artifact by its file name.
    pub fn artifact(&self, file_name: &str) -> Option<&ArtifactEntry> {
        self.artifacts.iter().find(|a| a.file_name == file_name)
    }
}

/// A single archived artifact of a build.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntry {
    pub file_name: String,
    pub relative_path: String,
}

impl ArtifactEntry {
    pub fn new(file_name: impl Into<String>, relative_path: impl Into<String>) -> Self {
        ArtifactEntry {
            file_name: file_name.into(),
            relative_path: relative_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_info_deserializes_build_list() {
        let raw = r#"{"_class":"hudson.model.FreeStyleProject",
                      "builds":[{"number":42},{"number":41}]}"#;
        let info: JobInfo = serde_json::from_str(raw).expect("job info should parse");
        assert_eq!(info.builds.len(), 2);
        assert_eq!(info.builds[0].number, 42);
    }

    #[test]
    fn test_job_info_missing_builds_is_empty() {
        let info: JobInfo = serde_json::from_str("{}").expect("job info should parse");
        assert!(info.builds.is_empty());
    }

    #[test]
    fn test_build_info_artifact_lookup() {
        let raw = r#"{"artifacts":[
            {"fileName":"appliance_version","relativePath":"log/appliance_version"},
            {"fileName":"coverage-results.tgz","relativePath":"log/coverage-results.tgz"}
        ]}"#;
        let info: BuildInfo = serde_json::from_str(raw).expect("build info should parse");
        let entry = info.artifact("coverage-results.tgz").expect("artifact present");
        assert_eq!(entry.relative_path, "log/coverage-results.tgz");
        assert!(info.artifact("nope.txt").is_none());
    }
}
