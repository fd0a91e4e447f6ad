use std::path::Path;

use serde_json::Value;

use agentdesk_types::{Document, DocumentMetadata};

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::reader::{collect_files, document_name, source_id};

/// Reads `.json` files: one document per top-level array element, or one per object
#[derive(Debug, Clone, Default)]
pub struct JsonReader;

impl JsonReader {
    pub fn new() -> Self {
        Self
    }

    fn element_content(value: &Value) -> KnowledgeResult<String> {
        Ok(match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other)?,
        })
    }

    /// Read one file; its id is the file name
    pub async fn read_file(&self, path: &Path) -> KnowledgeResult<Vec<Document>> {
        self.read_source(path, source_id(path, path)).await
    }

    async fn read_source(&self, path: &Path, id: String) -> KnowledgeResult<Vec<Document>> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| KnowledgeError::read(path.display(), e))?;
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| KnowledgeError::read(path.display(), e))?;

        let name = document_name(path);
        let metadata = DocumentMetadata::new(&name, "json", &path.display().to_string());

        let documents = match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    Ok(Document::chunk(&id, &name, index, Self::element_content(item)?).with_metadata(&metadata))
                })
                .collect::<KnowledgeResult<Vec<_>>>()?,
            other => vec![Document::new(&name, Self::element_content(&other)?)
                .with_id(id)
                .with_metadata(&metadata)],
        };
        Ok(documents)
    }

    pub async fn read(&self, path: &Path) -> KnowledgeResult<Vec<Document>> {
        let mut documents = Vec::new();
        for file in collect_files(path, &[".json".to_string()])? {
            documents.extend(self.read_source(&file, source_id(path, &file)).await?);
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_array_and_object_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bills.json"),
            r#"[{"number": "1234"}, "plain text", {"number": "42"}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("summary.json"), r#"{"summaries": []}"#).unwrap();

        let docs = JsonReader::new().read(dir.path()).await.unwrap();
        assert_eq!(docs.len(), 4);
        assert_eq!(docs[0].id, "bills.json_1");
        assert_eq!(docs[0].content, r#"{"number":"1234"}"#);
        assert_eq!(docs[1].content, "plain text");
        assert_eq!(docs[3].id, "summary.json");
        assert_eq!(docs[3].name, "summary");
        assert_eq!(docs[3].meta_data["source_type"], "json");
    }

    #[tokio::test]
    async fn test_invalid_json_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        assert!(JsonReader::new().read(dir.path()).await.is_err());
    }
}
