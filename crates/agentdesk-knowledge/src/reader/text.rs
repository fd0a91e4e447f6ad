use std::path::Path;

use agentdesk_types::{Document, DocumentMetadata};

use crate::chunking::Chunker;
use crate::error::{KnowledgeError, KnowledgeResult};
use crate::reader::{collect_files, document_name, source_id};

/// Reads plain-text files (`.txt`, `.md` unless configured otherwise)
#[derive(Debug, Clone)]
pub struct TextReader {
    formats: Vec<String>,
    chunker: Option<Chunker>,
}

impl Default for TextReader {
    fn default() -> Self {
        Self {
            formats: vec![".txt".to_string(), ".md".to_string()],
            chunker: Some(Chunker::default()),
        }
    }
}

impl TextReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formats(mut self, formats: &[&str]) -> Self {
        self.formats = formats.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_chunker(mut self, chunker: Option<Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    /// Read one file; its id is the file name
    pub async fn read_file(&self, path: &Path) -> KnowledgeResult<Vec<Document>> {
        self.read_source(path, source_id(path, path)).await
    }

    async fn read_source(&self, path: &Path, id: String) -> KnowledgeResult<Vec<Document>> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| KnowledgeError::read(path.display(), e))?;
        let name = document_name(path);
        let metadata = DocumentMetadata::new(&name, "text", &path.display().to_string());
        let document = Document::new(&name, content).with_id(id).with_metadata(&metadata);

        Ok(match &self.chunker {
            Some(chunker) => chunker.chunk_document(&document),
            None => vec![document],
        })
    }

    /// Read a file or every matching file below a directory
    pub async fn read(&self, path: &Path) -> KnowledgeResult<Vec<Document>> {
        let mut documents = Vec::new();
        for file in collect_files(path, &self.formats)? {
            log::debug!("reading text file {}", file.display());
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
    async fn test_reads_only_configured_formats() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("guide.md"), "# Guide\nUse the portal.").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "Plain notes").unwrap();
        std::fs::write(dir.path().join("data.csv"), "a,b").unwrap();

        let docs = TextReader::new().read(dir.path()).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["guide", "notes"]);
        assert_eq!(docs[0].id, "guide.md_1");
        assert_eq!(docs[0].meta_data["source_type"], "text");

        let docs = TextReader::new().with_formats(&[".txt"]).read(dir.path()).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_unchunked_uses_file_name_as_id() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("policy.txt");
        std::fs::write(&file, "Policy text").unwrap();

        let docs = TextReader::new().with_chunker(None).read(&file).await.unwrap();
        assert_eq!(docs[0].id, "policy.txt");
        assert_eq!(docs[0].name, "policy");
        assert_eq!(docs[0].content, "Policy text");
    }

    #[tokio::test]
    async fn test_same_stem_in_different_folders_gets_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        for folder in ["a", "b"] {
            std::fs::create_dir(dir.path().join(folder)).unwrap();
            std::fs::write(dir.path().join(folder).join("notes.txt"), format!("{} team notes", folder)).unwrap();
        }

        let docs = TextReader::new().read(dir.path()).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a/notes.txt_1", "b/notes.txt_1"]);
        assert_eq!(docs[1].source_id(), "b/notes.txt");
        assert_eq!(docs[1].name, "notes");
    }

    #[tokio::test]
    async fn test_missing_path_is_error() {
        let err = TextReader::new().read(Path::new("/definitely/not/here")).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::Read { .. }));
    }
}
