use std::path::{Path, PathBuf};

use agentdesk_types::{Document, DocumentMetadata};

use crate::chunking::Chunker;
use crate::error::{KnowledgeError, KnowledgeResult};
use crate::reader::{collect_files, document_name, source_id};

/// Extracts text from `.pdf` files and chunks it
#[derive(Debug, Clone, Default)]
pub struct PdfReader {
    chunker: Chunker,
}

impl PdfReader {
    pub fn new(chunker: Chunker) -> Self {
        Self { chunker }
    }

    /// Read one file; its id is the file name
    pub async fn read_file(&self, path: &Path) -> KnowledgeResult<Vec<Document>> {
        self.read_source(path, source_id(path, path)).await
    }

    async fn read_source(&self, path: &Path, id: String) -> KnowledgeResult<Vec<Document>> {
        let owned: PathBuf = path.to_path_buf();
        // pdf-extract is synchronous and CPU bound
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
            .await
            .map_err(|e| KnowledgeError::read(path.display(), e))?
            .map_err(|e| KnowledgeError::read(path.display(), e))?;

        let name = document_name(path);
        let metadata = DocumentMetadata::new(&name, "pdf", &path.display().to_string());
        let document = Document::new(&name, text).with_id(id).with_metadata(&metadata);
        Ok(self.chunker.chunk_document(&document))
    }

    pub async fn read(&self, path: &Path) -> KnowledgeResult<Vec<Document>> {
        let mut documents = Vec::new();
        for file in collect_files(path, &[".pdf".to_string()])? {
            log::info!("extracting text from {}", file.display());
            match self.read_source(&file, source_id(path, &file)).await {
                Ok(docs) => documents.extend(docs),
                // one unreadable PDF must not abort the whole ingest
                Err(e) => log::warn!("skipping {}: {}", file.display(), e),
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not a pdf").unwrap();
        let docs = PdfReader::default().read(dir.path()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), "%PDF-1.4 garbage").unwrap();
        let docs = PdfReader::default().read(dir.path()).await.unwrap();
        assert!(docs.is_empty());
    }
}
