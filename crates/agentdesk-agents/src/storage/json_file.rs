use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{validate_session_id, AgentSession, AgentStorage};

/// One pretty-printed JSON file per session under a directory
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{}.json", session_id)))
    }
}

#[async_trait]
impl AgentStorage for JsonFileStorage {
    async fn create(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create session directory {}", self.dir.display()))
    }

    async fn read(&self, session_id: &str) -> Result<Option<AgentSession>> {
        let path = self.session_path(session_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let session = serde_json::from_str(&raw)
                    .with_context(|| format!("Corrupt session file {}", path.display()))?;
                Ok(Some(session))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert(&self, session: &AgentSession) -> Result<()> {
        let path = self.session_path(&session.session_id)?;
        self.create().await?;
        let json = serde_json::to_string_pretty(session)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write session file {}", path.display()))
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let path = self.session_path(session_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn session_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_roundtrip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("sessions"));

        assert!(storage.read("s1").await.unwrap().is_none());
        assert!(storage.session_ids().await.unwrap().is_empty());

        let mut session = AgentSession::new("s1", "helper");
        session.record_exchange("question", "answer");
        storage.upsert(&session).await.unwrap();
        storage.upsert(&AgentSession::new("s0", "helper")).await.unwrap();

        assert_eq!(storage.read("s1").await.unwrap(), Some(session));
        assert_eq!(storage.session_ids().await.unwrap(), vec!["s0", "s1"]);

        storage.delete_session("s1").await.unwrap();
        storage.delete_session("s1").await.unwrap();
        assert_eq!(storage.session_ids().await.unwrap(), vec!["s0"]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        assert!(storage.read("../escape").await.is_err());
    }
}
