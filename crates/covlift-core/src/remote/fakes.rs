//! Scripted remote shell (testing only)
//!
//! [`ScriptedShell`] answers every command with exit 0 unless a rule says
//! otherwise. Rules match on a substring of the command, in registration
//! order; the full command history plus uploads and downloads are recorded
//! for assertions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::HarvestResult;
use crate::remote::{RemoteShell, ShellOutput};

struct Rule {
    needle: String,
    output: ShellOutput,
}

/// In-memory shell that never talks to a real host.
#[derive(Default)]
pub struct ScriptedShell {
    rules: Mutex<Vec<Rule>>,
    history: Mutex<Vec<String>>,
    uploads: Mutex<Vec<(PathBuf, String)>>,
    downloads: Mutex<Vec<(String, PathBuf)>>,
    staged_downloads: Mutex<HashMap<String, PathBuf>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `needle` respond with the given stdout (exit 0).
    pub fn respond_with(self, needle: &str, stdout: &str) -> Self {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_string(),
            output: ShellOutput {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        });
        self
    }

    /// Commands containing `needle` fail with the given exit code and stderr.
    pub fn fail_matching(self, needle: &str, exit_code: i32, stderr: &str) -> Self {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_string(),
            output: ShellOutput {
                exit_code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        });
        self
    }

    /// Serve `source` as the content of `remote` when it is downloaded,
    /// so steps that read the downloaded file can run for real.
    pub fn stage_download(self, remote: &str, source: &Path) -> Self {
        self.staged_downloads
            .lock()
            .unwrap()
            .insert(remote.to_string(), source.to_path_buf());
        self
    }

    /// Every command run, in order.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }

    /// Every upload as (local, remote).
    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.uploads.lock().unwrap().clone()
    }

    /// Every download as (remote, local).
    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        self.downloads.lock().unwrap().clone()
    }

    /// Whether some command in the history contains `needle`.
    pub fn ran(&self, needle: &str) -> bool {
        self.history().iter().any(|c| c.contains(needle))
    }
}

#[async_trait]
impl RemoteShell for ScriptedShell {
    async fn run_with_timeout(
        &self,
        command: &str,
        _timeout: Duration,
    ) -> HarvestResult<ShellOutput> {
        self.history.lock().unwrap().push(command.to_string());

        let rules = self.rules.lock().unwrap();
        for rule in rules.iter() {
            if command.contains(&rule.needle) {
                return Ok(rule.output.clone());
            }
        }

        Ok(ShellOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    async fn upload(&self, local: &Path, remote: &str) -> HarvestResult<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((local.to_path_buf(), remote.to_string()));
        Ok(())
    }

    async fn download(&self, remote: &str, local: &Path) -> HarvestResult<()> {
        self.downloads
            .lock()
            .unwrap()
            .push((remote.to_string(), local.to_path_buf()));

        let staged = self.staged_downloads.lock().unwrap().get(remote).cloned();
        if let Some(source) = staged {
            std::fs::copy(&source, local)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_response_is_success() {
        let shell = ScriptedShell::new();
        let output = shell.run("true").await.expect("run");
        assert!(output.success());
        assert!(shell.ran("true"));
    }

    #[tokio::test]
    async fn test_rules_match_substring() {
        let shell = ScriptedShell::new()
            .respond_with("cat /etc/release", "Appliance 5.9\n")
            .fail_matching("tar xf", 2, "tar: broken");

        let release = shell.run("cat /etc/release").await.expect("run");
        assert_eq!(release.stdout, "Appliance 5.9\n");

        let tar = shell.run("cd /coverage && tar xf tmp.tgz").await.expect("run");
        assert_eq!(tar.exit_code, 2);
        assert_eq!(shell.history().len(), 2);
    }
}
