use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use agentdesk_llm_api::Embedder;
use agentdesk_types::{Document, SearchResult};

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::reader::{JsonReader, PdfReader, TextReader, WebsiteReader};
use crate::relevance::rescore;
use crate::store::{SearchType, VectorStore};

const EMBED_BATCH_SIZE: usize = 100;
const DEFAULT_NUM_DOCUMENTS: usize = 5;

/// Something a knowledge base can load documents from
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    async fn documents(&self) -> KnowledgeResult<Vec<Document>>;
}

#[async_trait]
impl KnowledgeSource for Vec<Document> {
    async fn documents(&self) -> KnowledgeResult<Vec<Document>> {
        Ok(self.clone())
    }
}

/// Text files below a path
pub struct TextSource {
    pub path: PathBuf,
    pub reader: TextReader,
}

#[async_trait]
impl KnowledgeSource for TextSource {
    async fn documents(&self) -> KnowledgeResult<Vec<Document>> {
        self.reader.read(&self.path).await
    }
}

/// PDF files below a path
pub struct PdfSource {
    pub path: PathBuf,
    pub reader: PdfReader,
}

#[async_trait]
impl KnowledgeSource for PdfSource {
    async fn documents(&self) -> KnowledgeResult<Vec<Document>> {
        self.reader.read(&self.path).await
    }
}

/// JSON files below a path
pub struct JsonSource {
    pub path: PathBuf,
    pub reader: JsonReader,
}

#[async_trait]
impl KnowledgeSource for JsonSource {
    async fn documents(&self) -> KnowledgeResult<Vec<Document>> {
        self.reader.read(&self.path).await
    }
}

/// Web pages, optionally following links
pub struct WebsiteSource {
    pub urls: Vec<String>,
    pub reader: WebsiteReader,
}

#[async_trait]
impl KnowledgeSource for WebsiteSource {
    async fn documents(&self) -> KnowledgeResult<Vec<Document>> {
        self.reader.read(&self.urls).await
    }
}

/// Concatenation of several sources
pub struct CombinedSource {
    sources: Vec<Arc<dyn KnowledgeSource>>,
}

impl CombinedSource {
    pub fn new(sources: Vec<Arc<dyn KnowledgeSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl KnowledgeSource for CombinedSource {
    async fn documents(&self) -> KnowledgeResult<Vec<Document>> {
        let mut documents = Vec::new();
        for source in &self.sources {
            documents.extend(source.documents().await?);
        }
        Ok(documents)
    }
}

/// A source of documents bound to a vector table and an embedder
pub struct KnowledgeBase {
    source: Arc<dyn KnowledgeSource>,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    num_documents: usize,
    search_type: SearchType,
    min_relevance: f32,
}

impl KnowledgeBase {
    pub fn new(
        source: Arc<dyn KnowledgeSource>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            source,
            store,
            embedder,
            num_documents: DEFAULT_NUM_DOCUMENTS,
            search_type: SearchType::default(),
            min_relevance: 0.0,
        }
    }

    /// Number of hits `search` returns
    pub fn with_num_documents(mut self, num_documents: usize) -> Self {
        self.num_documents = num_documents.max(1);
        self
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    pub fn with_min_relevance(mut self, min_relevance: f32) -> Self {
        self.min_relevance = min_relevance.clamp(0.0, 1.0);
        self
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn table_name(&self) -> &str {
        self.store.table_name()
    }

    /// Load the configured source; see [`KnowledgeBase::load_from`]
    pub async fn load(&self, recreate: bool, upsert: bool) -> KnowledgeResult<usize> {
        let source = self.source.clone();
        self.load_from(source.as_ref(), recreate, upsert).await
    }

    /// Load documents from `source` into the table.
    ///
    /// `recreate` drops the table first. Otherwise a source whose chunks all
    /// have stored content hashes is skipped. A source with any new hash is
    /// rewritten: its old rows are deleted first, so an edited file leaves
    /// neither stale text nor orphaned chunks behind. With `upsert` every
    /// document is written and rows with the same id are replaced. Returns
    /// the number of documents written.
    pub async fn load_from(
        &self,
        source: &dyn KnowledgeSource,
        recreate: bool,
        upsert: bool,
    ) -> KnowledgeResult<usize> {
        self.prepare_table(recreate).await?;
        let documents = source.documents().await?;
        self.load_documents(documents, upsert).await
    }

    /// Create the table when missing; `recreate` drops it first
    pub async fn prepare_table(&self, recreate: bool) -> KnowledgeResult<()> {
        if recreate {
            log::info!("dropping table {}", self.table_name());
            self.store.drop_table().await?;
        }
        if !self.store.exists().await? {
            log::info!("creating table {}", self.table_name());
            self.store.create().await?;
        }
        Ok(())
    }

    pub async fn load_documents(&self, documents: Vec<Document>, upsert: bool) -> KnowledgeResult<usize> {
        let pending = if upsert {
            documents
        } else {
            self.changed_sources(documents).await?
        };

        let mut written = 0;
        for batch in pending.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let embeddings = self
                .embedder
                .embed(&texts)
                .await
                .map_err(|e| KnowledgeError::Embedding(e.to_string()))?;

            written += self.store.upsert(batch, &embeddings).await?;
        }

        log::info!("loaded {} documents into {}", written, self.table_name());
        Ok(written)
    }

    /// Documents of every source with at least one unseen content hash, after
    /// deleting the rows those sources left in the table
    async fn changed_sources(&self, documents: Vec<Document>) -> KnowledgeResult<Vec<Document>> {
        let mut changed: HashSet<String> = HashSet::new();
        for document in &documents {
            if !changed.contains(document.source_id())
                && !self.store.doc_exists(&document.content_hash).await?
            {
                changed.insert(document.source_id().to_string());
            }
        }

        for source_id in &changed {
            let removed = self.store.delete_source(source_id).await?;
            if removed > 0 {
                log::info!("replacing {} stale rows of {} in {}", removed, source_id, self.table_name());
            }
        }

        Ok(documents
            .into_iter()
            .filter(|document| changed.contains(document.source_id()))
            .collect())
    }

    /// Top hits for `query`, re-scored and filtered by minimum relevance
    pub async fn search(&self, query: &str) -> KnowledgeResult<Vec<SearchResult>> {
        self.search_with_limit(query, self.num_documents).await
    }

    pub async fn search_with_limit(&self, query: &str, limit: usize) -> KnowledgeResult<Vec<SearchResult>> {
        let embedding = self
            .embedder
            .embed_one(query)
            .await
            .map_err(|e| KnowledgeError::Embedding(e.to_string()))?;

        let hits = self
            .store
            .search(&embedding, query, limit, self.search_type)
            .await?;
        let mut results = rescore(query, hits, self.min_relevance);
        results.truncate(limit);
        Ok(results)
    }

    pub async fn exists(&self) -> KnowledgeResult<bool> {
        self.store.exists().await
    }

    /// Number of stored documents; a missing table counts as empty
    pub async fn count(&self) -> KnowledgeResult<usize> {
        if !self.store.exists().await? {
            return Ok(0);
        }
        self.store.count().await
    }

    pub async fn clear(&self) -> KnowledgeResult<()> {
        self.store.delete_all().await
    }
}

/// Knowledge base loading every source into one shared table
pub struct CombinedKnowledgeBase {
    inner: KnowledgeBase,
}

impl CombinedKnowledgeBase {
    pub fn new(
        sources: Vec<Arc<dyn KnowledgeSource>>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            inner: KnowledgeBase::new(Arc::new(CombinedSource::new(sources)), store, embedder),
        }
    }

    pub fn with_num_documents(mut self, num_documents: usize) -> Self {
        self.inner = self.inner.with_num_documents(num_documents);
        self
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.inner = self.inner.with_search_type(search_type);
        self
    }

    pub fn with_min_relevance(mut self, min_relevance: f32) -> Self {
        self.inner = self.inner.with_min_relevance(min_relevance);
        self
    }

    pub async fn load(&self, recreate: bool, upsert: bool) -> KnowledgeResult<usize> {
        self.inner.load(recreate, upsert).await
    }

    pub async fn search(&self, query: &str) -> KnowledgeResult<Vec<SearchResult>> {
        self.inner.search(query).await
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.inner
    }

    pub fn into_inner(self) -> KnowledgeBase {
        self.inner
    }
}
