use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use agentdesk_llm_api::Embedder;
use agentdesk_types::{Document, MessagePayload, StatusResponse};

use crate::error::KnowledgeResult;
use crate::knowledge_base::{KnowledgeBase, KnowledgeSource, PdfSource, TextSource};
use crate::reader::{PdfReader, TextReader};
use crate::store::StoreBackend;

pub const PDF_TABLE: &str = "pdf_documents";
pub const TEXT_TABLE: &str = "text_documents";

/// Stored chunk counts per knowledge base
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCounts {
    pub pdf_documents: usize,
    pub text_documents: usize,
    pub total: usize,
}

/// Ingests document directories into the PDF and text knowledge bases and
/// into the combined table that queries search
pub struct DocumentProcessor {
    pdf_knowledge: KnowledgeBase,
    text_knowledge: KnowledgeBase,
    combined_knowledge: KnowledgeBase,
    pdf_reader: PdfReader,
    text_reader: TextReader,
}

impl DocumentProcessor {
    pub fn new(
        backend: &StoreBackend,
        embedder: Arc<dyn Embedder>,
        data_dir: &Path,
        combined_table: &str,
    ) -> KnowledgeResult<Self> {
        let pdf_reader = PdfReader::default();
        let text_reader = TextReader::default();

        let pdf_knowledge = KnowledgeBase::new(
            Arc::new(PdfSource {
                path: data_dir.join("pdfs"),
                reader: pdf_reader.clone(),
            }),
            backend.open(PDF_TABLE)?,
            embedder.clone(),
        );
        let text_knowledge = KnowledgeBase::new(
            Arc::new(TextSource {
                path: data_dir.join("text"),
                reader: text_reader.clone(),
            }),
            backend.open(TEXT_TABLE)?,
            embedder.clone(),
        );
        // Loaded only through `ingest`, so the configured source is empty
        let combined_knowledge =
            KnowledgeBase::new(Arc::new(Vec::<Document>::new()), backend.open(combined_table)?, embedder);

        Ok(Self {
            pdf_knowledge,
            text_knowledge,
            combined_knowledge,
            pdf_reader,
            text_reader,
        })
    }

    async fn ensure_dir(path: &Path) -> KnowledgeResult<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    /// Read `source` once and load it into its own table and the combined table
    async fn ingest(&self, knowledge: &KnowledgeBase, source: &dyn KnowledgeSource) -> KnowledgeResult<usize> {
        let documents = source.documents().await?;
        knowledge.prepare_table(false).await?;
        self.combined_knowledge.prepare_table(false).await?;

        let written = knowledge.load_documents(documents.clone(), false).await?;
        let combined = self.combined_knowledge.load_documents(documents, false).await?;
        log::debug!("{} chunks written to {}", combined, self.combined_knowledge.table_name());
        Ok(written)
    }

    /// Ingest every PDF below `path`; the directory is created when missing
    pub async fn ingest_pdfs(&self, path: &Path) -> StatusResponse<MessagePayload> {
        let source = PdfSource {
            path: path.to_path_buf(),
            reader: self.pdf_reader.clone(),
        };
        let result = async {
            Self::ensure_dir(path).await?;
            self.ingest(&self.pdf_knowledge, &source).await
        }
        .await;

        match result {
            Ok(written) => {
                log::info!("ingested {} PDF chunks from {}", written, path.display());
                StatusResponse::ok_message(format!("PDFs ingested from {}", path.display()))
            }
            Err(e) => StatusResponse::error(e.to_string()),
        }
    }

    /// Ingest every text file below `path`; the directory is created when missing
    pub async fn ingest_text(&self, path: &Path) -> StatusResponse<MessagePayload> {
        let source = TextSource {
            path: path.to_path_buf(),
            reader: self.text_reader.clone(),
        };
        let result = async {
            Self::ensure_dir(path).await?;
            self.ingest(&self.text_knowledge, &source).await
        }
        .await;

        match result {
            Ok(written) => {
                log::info!("ingested {} text chunks from {}", written, path.display());
                StatusResponse::ok_message(format!("Text documents ingested from {}", path.display()))
            }
            Err(e) => StatusResponse::error(e.to_string()),
        }
    }

    /// Counts per knowledge base; any failure reports zeros
    pub async fn get_document_count(&self) -> DocumentCounts {
        let counts = async {
            let pdf_documents = self.pdf_knowledge.count().await?;
            let text_documents = self.text_knowledge.count().await?;
            KnowledgeResult::Ok(DocumentCounts {
                pdf_documents,
                text_documents,
                total: pdf_documents + text_documents,
            })
        }
        .await;

        counts.unwrap_or_else(|e| {
            log::warn!("could not count documents: {}", e);
            DocumentCounts::default()
        })
    }

    pub async fn clear_knowledge_base(&self) -> StatusResponse<MessagePayload> {
        let result = async {
            self.pdf_knowledge.clear().await?;
            self.text_knowledge.clear().await?;
            self.combined_knowledge.clear().await
        }
        .await;

        match result {
            Ok(()) => StatusResponse::ok_message("Knowledge bases cleared"),
            Err(e) => StatusResponse::error(e.to_string()),
        }
    }
}
