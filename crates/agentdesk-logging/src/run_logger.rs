use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// One line of a run log
#[derive(Debug, Clone, Serialize)]
pub struct RunEntry<'a> {
    pub timestamp: DateTime<Local>,
    pub role: &'a str,
    pub content: &'a str,
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<&'a str>,
}

impl<'a> RunEntry<'a> {
    pub fn new(role: &'a str, content: &'a str) -> Self {
        Self {
            timestamp: Local::now(),
            role,
            content,
            model: None,
            agent_name: None,
            run_id: None,
        }
    }

    pub fn model(mut self, model: &'a str) -> Self {
        self.model = Some(model);
        self
    }

    /// Tag with the agent and the run that produced the message
    pub fn from_agent(mut self, agent_name: &'a str, run_id: &'a str) -> Self {
        self.agent_name = Some(agent_name);
        self.run_id = Some(run_id);
        self
    }
}

/// JSON-lines transcript of a workflow run, at `<workspace>/logs/<prefix>-<local time>.jsonl`.
///
/// Write failures are logged and swallowed so a full disk never aborts a run.
pub struct RunLogger {
    path: PathBuf,
    file: Option<File>,
}

impl RunLogger {
    pub async fn new(workspace: &Path, prefix: &str) -> Result<Self> {
        let dir = workspace.join("logs");
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(format!("{}-{}.jsonl", prefix, Local::now().format("%Y-%m-%d-%H%M%S")));
        let file = OpenOptions::new().create(true).append(true).open(&path).await?;
        Ok(Self { path, file: Some(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&mut self, entry: &RunEntry<'_>) {
        let Some(file) = self.file.as_mut() else {
            log::debug!("run log {} already closed", self.path.display());
            return;
        };
        let mut line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("could not encode run log entry: {}", e);
                return;
            }
        };
        line.push('\n');

        let written = async {
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        };
        if let Err(e) = written.await {
            log::warn!("could not write {}: {}", self.path.display(), e);
        }
    }

    /// Sync and close; later appends are dropped
    pub async fn shutdown(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.sync_all().await {
                log::warn!("could not sync {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_entries_are_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = RunLogger::new(dir.path(), "review").await.unwrap();

        logger.append(&RunEntry::new("user", "review this")).await;
        logger
            .append(
                &RunEntry::new("assistant", "looks fine")
                    .model("gpt-4o")
                    .from_agent("Security Reviewer", "r1"),
            )
            .await;
        let path = logger.path().to_path_buf();
        logger.shutdown().await;

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["role"], "user");
        assert_eq!(lines[0]["model"], serde_json::Value::Null);
        assert!(lines[0].get("agent_name").is_none());
        assert_eq!(lines[1]["agent_name"], "Security Reviewer");
        assert_eq!(lines[1]["run_id"], "r1");
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("review-"));
    }

    #[tokio::test]
    async fn test_append_after_shutdown_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = RunLogger::new(dir.path(), "plan").await.unwrap();
        logger.shutdown().await;
        logger.append(&RunEntry::new("user", "late")).await;

        assert!(read_lines(logger.path()).is_empty());
    }
}
