use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentdesk_knowledge::{
    CombinedKnowledgeBase, JsonReader, KnowledgeBase, KnowledgeResult, KnowledgeSource, SearchType,
    StoreBackend,
};
use agentdesk_llm_api::Embedder;
use agentdesk_types::Document;

use crate::constitution::{
    ConstitutionalReader, BILL_OF_RIGHTS_URL, CONSTITUTIONAL_URLS, CONSTITUTION_URL, FEDERALIST_PAPERS_URL,
};

/// Links followed from the Federalist Papers guide
const FEDERALIST_MAX_LINKS: usize = 100;
const FEDERALIST_LINK_PREFIX: &str = "https://guides.loc.gov/federalist-papers";

/// A saved Congress.gov response; a file that was never fetched yields nothing
struct DataFileSource {
    path: PathBuf,
    reader: JsonReader,
}

#[async_trait]
impl KnowledgeSource for DataFileSource {
    async fn documents(&self) -> KnowledgeResult<Vec<Document>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            log::warn!("{} not found, run `congress fetch` first", self.path.display());
            return Ok(Vec::new());
        }
        self.reader.read(&self.path).await
    }
}

/// The vector tables behind the congress analysis
pub struct CongressKnowledge {
    pub congress_docs: Arc<KnowledgeBase>,
    pub records: Arc<KnowledgeBase>,
    pub reports: Arc<KnowledgeBase>,
    /// Bills, records and reports in one table
    pub combined: Arc<KnowledgeBase>,
    /// Constitution, Federalist Papers and Bill of Rights in one table
    pub constitutional: Arc<KnowledgeBase>,
    pub constitution_summaries: Arc<KnowledgeBase>,
    pub federalism: Arc<KnowledgeBase>,
    pub bill_of_rights: Arc<KnowledgeBase>,
}

impl CongressKnowledge {
    pub fn new(backend: &StoreBackend, embedder: Arc<dyn Embedder>, data_dir: &Path) -> KnowledgeResult<Self> {
        let data_file = |file: &str| -> Arc<dyn KnowledgeSource> {
            Arc::new(DataFileSource {
                path: data_dir.join(file),
                reader: JsonReader::new(),
            })
        };
        let hybrid = |source: Arc<dyn KnowledgeSource>, table: &str| -> KnowledgeResult<Arc<KnowledgeBase>> {
            Ok(Arc::new(
                KnowledgeBase::new(source, backend.open(table)?, embedder.clone())
                    .with_search_type(SearchType::Hybrid),
            ))
        };

        let bills = data_file("bills.json");
        let records = data_file("records.json");
        let reports = data_file("reports.json");

        let combined = CombinedKnowledgeBase::new(
            vec![bills.clone(), records.clone(), reports.clone()],
            backend.open("congress_knowledge")?,
            embedder.clone(),
        )
        .with_search_type(SearchType::Hybrid)
        .into_inner();

        let reader = ConstitutionalReader::new();
        let federalist_reader =
            ConstitutionalReader::new().following_links(FEDERALIST_MAX_LINKS, FEDERALIST_LINK_PREFIX);

        Ok(Self {
            congress_docs: hybrid(bills, "congress_docs")?,
            records: hybrid(records, "congress_records")?,
            reports: hybrid(reports, "congress_reports")?,
            combined: Arc::new(combined),
            constitutional: hybrid(Arc::new(reader.source(&CONSTITUTIONAL_URLS)), "constitutional_docs")?,
            constitution_summaries: hybrid(Arc::new(reader.source(&[CONSTITUTION_URL])), "constitutional_summaries")?,
            federalism: hybrid(
                Arc::new(federalist_reader.source(&[FEDERALIST_PAPERS_URL])),
                "federalism_knowledge",
            )?,
            bill_of_rights: hybrid(Arc::new(reader.source(&[BILL_OF_RIGHTS_URL])), "bill_of_rights_knowledge")?,
        })
    }

    /// Load the congress data and constitutional tables.
    ///
    /// Always upserts; `force_reload` recreates every table first.
    pub async fn load(&self, force_reload: bool) -> KnowledgeResult<usize> {
        log::info!(
            "{} congress knowledge bases",
            if force_reload { "reloading" } else { "updating" }
        );
        let mut written = 0;
        for knowledge in [
            &self.congress_docs,
            &self.records,
            &self.reports,
            &self.combined,
            &self.constitutional,
        ] {
            written += knowledge.load(force_reload, true).await?;
        }
        Ok(written)
    }

    /// Load the three tables the expert agents search
    pub async fn load_experts(&self, force_reload: bool) -> KnowledgeResult<usize> {
        let mut written = 0;
        for knowledge in [&self.constitution_summaries, &self.federalism, &self.bill_of_rights] {
            written += knowledge.load(force_reload, true).await?;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_llm_api::HashingEmbedder;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_data_tables_load_from_saved_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bills.json"),
            r#"{"bills": [{"number": "1", "title": "Infrastructure Act"}], "pagination": {"count": 1}}"#,
        )
        .unwrap();

        let backend = StoreBackend::memory();
        let knowledge =
            CongressKnowledge::new(&backend, Arc::new(HashingEmbedder::new(64)), dir.path()).unwrap();

        for kb in [&knowledge.congress_docs, &knowledge.records, &knowledge.reports, &knowledge.combined] {
            kb.load(false, true).await.unwrap();
        }

        assert_eq!(knowledge.congress_docs.count().await.unwrap(), 1);
        assert_eq!(knowledge.records.count().await.unwrap(), 0);
        assert_eq!(knowledge.combined.count().await.unwrap(), 1);
        assert_eq!(knowledge.combined.table_name(), "congress_knowledge");
    }
}
