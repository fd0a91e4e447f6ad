use async_trait::async_trait;
use tokio::sync::RwLock;

use agentdesk_types::{Document, SearchResult};

use crate::error::KnowledgeResult;
use crate::relevance::{query_terms, term_overlap};
use crate::store::{check_lengths, SearchType, VectorStore};

#[derive(Default)]
struct Table {
    created: bool,
    rows: Vec<(Document, Vec<f32>)>,
}

/// Vector store kept in process memory, with the same semantics as the
/// PostgreSQL store
pub struct InMemoryVectorStore {
    table_name: String,
    table: RwLock<Table>,
}

impl InMemoryVectorStore {
    pub fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            table: RwLock::new(Table::default()),
        }
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn create(&self) -> KnowledgeResult<()> {
        self.table.write().await.created = true;
        Ok(())
    }

    async fn exists(&self) -> KnowledgeResult<bool> {
        Ok(self.table.read().await.created)
    }

    async fn drop_table(&self) -> KnowledgeResult<()> {
        let mut table = self.table.write().await;
        table.created = false;
        table.rows.clear();
        Ok(())
    }

    async fn delete_all(&self) -> KnowledgeResult<()> {
        self.table.write().await.rows.clear();
        Ok(())
    }

    async fn delete_source(&self, source_id: &str) -> KnowledgeResult<usize> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|(d, _)| d.source_id() != source_id);
        Ok(before - table.rows.len())
    }

    async fn insert(&self, documents: &[Document], embeddings: &[Vec<f32>]) -> KnowledgeResult<usize> {
        check_lengths(documents, embeddings)?;
        let mut table = self.table.write().await;
        table.created = true;
        let mut written = 0;
        for (document, embedding) in documents.iter().zip(embeddings) {
            if table.rows.iter().any(|(d, _)| d.id == document.id) {
                continue;
            }
            table.rows.push((document.clone(), embedding.clone()));
            written += 1;
        }
        Ok(written)
    }

    async fn upsert(&self, documents: &[Document], embeddings: &[Vec<f32>]) -> KnowledgeResult<usize> {
        check_lengths(documents, embeddings)?;
        let mut table = self.table.write().await;
        table.created = true;
        for (document, embedding) in documents.iter().zip(embeddings) {
            match table.rows.iter_mut().find(|(d, _)| d.id == document.id) {
                Some(row) => *row = (document.clone(), embedding.clone()),
                None => table.rows.push((document.clone(), embedding.clone())),
            }
        }
        Ok(documents.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        query_text: &str,
        limit: usize,
        search_type: SearchType,
    ) -> KnowledgeResult<Vec<SearchResult>> {
        let table = self.table.read().await;
        let terms = query_terms(query_text);

        let mut hits: Vec<SearchResult> = table
            .rows
            .iter()
            .filter_map(|(document, embedding)| {
                let vector = cosine_similarity(query_embedding, embedding).clamp(0.0, 1.0);
                let keyword = term_overlap(&terms, &document.content);
                let score = match search_type {
                    SearchType::Vector => vector,
                    SearchType::Keyword if keyword == 0.0 => return None,
                    SearchType::Keyword => keyword,
                    SearchType::Hybrid => (vector + keyword) / 2.0,
                };
                Some(SearchResult::new(document.clone(), score))
            })
            .collect();

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self) -> KnowledgeResult<usize> {
        Ok(self.table.read().await.rows.len())
    }

    async fn doc_exists(&self, content_hash: &str) -> KnowledgeResult<bool> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .iter()
            .any(|(d, _)| d.content_hash == content_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KnowledgeError;
    use pretty_assertions::assert_eq;

    fn doc(name: &str, content: &str) -> Document {
        Document::new(name, content)
    }

    #[tokio::test]
    async fn test_insert_skips_existing_ids_and_upsert_replaces() {
        let store = InMemoryVectorStore::new("t");
        assert!(!store.exists().await.unwrap());

        let written = store
            .insert(&[doc("a", "one"), doc("b", "two")], &[vec![1.0, 0.0], vec![0.0, 1.0]])
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert!(store.exists().await.unwrap());

        let written = store.insert(&[doc("a", "changed")], &[vec![1.0, 0.0]]).await.unwrap();
        assert_eq!(written, 0);
        assert!(store.doc_exists(&doc("a", "one").content_hash).await.unwrap());

        store.upsert(&[doc("a", "changed")], &[vec![1.0, 0.0]]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        assert!(store.doc_exists(&doc("a", "changed").content_hash).await.unwrap());
        assert!(!store.doc_exists(&doc("a", "one").content_hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_source_removes_its_chunks_only() {
        let store = InMemoryVectorStore::new("t");
        let rows = [
            Document::chunk("a/notes.txt", "notes", 0, "one"),
            Document::chunk("a/notes.txt", "notes", 1, "two"),
            Document::chunk("b/notes.txt", "notes", 0, "three"),
            doc("loose", "four"),
        ];
        store.insert(&rows, &[vec![1.0], vec![1.0], vec![1.0], vec![1.0]]).await.unwrap();

        assert_eq!(store.delete_source("a/notes.txt").await.unwrap(), 2);
        assert_eq!(store.delete_source("loose").await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.doc_exists(&doc("x", "three").content_hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_mismatched_embeddings_rejected() {
        let store = InMemoryVectorStore::new("t");
        let err = store.insert(&[doc("a", "one")], &[]).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::EmbeddingMismatch { documents: 1, embeddings: 0 }));
    }

    #[tokio::test]
    async fn test_search_types() {
        let store = InMemoryVectorStore::new("t");
        store
            .insert(
                &[doc("gun", "firearm regulation bill"), doc("health", "insurance coverage bill")],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .await
            .unwrap();

        let vector = store.search(&[0.9, 0.1], "", 5, SearchType::Vector).await.unwrap();
        assert_eq!(vector[0].document.name, "gun");
        assert_eq!(vector.len(), 2);

        let keyword = store.search(&[1.0, 0.0], "insurance", 5, SearchType::Keyword).await.unwrap();
        assert_eq!(keyword.len(), 1);
        assert_eq!(keyword[0].document.name, "health");

        let hybrid = store.search(&[1.0, 0.0], "insurance", 1, SearchType::Hybrid).await.unwrap();
        assert_eq!(hybrid.len(), 1);
        assert!((hybrid[0].similarity - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_drop_and_delete_all() {
        let store = InMemoryVectorStore::new("t");
        store.insert(&[doc("a", "one")], &[vec![1.0]]).await.unwrap();
        store.delete_all().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.exists().await.unwrap());
        store.drop_table().await.unwrap();
        assert!(!store.exists().await.unwrap());
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }
}
