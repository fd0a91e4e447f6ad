use agentdesk_knowledge::{Chunker, KnowledgeResult, SelectorRule, WebsiteReader, WebsiteSource};
use agentdesk_types::Document;

pub const CONSTITUTION_URL: &str = "https://www.archives.gov/founding-docs/constitution-transcript";
pub const FEDERALIST_PAPERS_URL: &str = "https://guides.loc.gov/federalist-papers/full-text";
pub const BILL_OF_RIGHTS_URL: &str = "https://www.archives.gov/founding-docs/bill-of-rights-transcript";

pub const CONSTITUTIONAL_URLS: [&str; 3] = [CONSTITUTION_URL, FEDERALIST_PAPERS_URL, BILL_OF_RIGHTS_URL];

/// Founding-document chunks are large and never overlap
const CONSTITUTIONAL_CHUNK_SIZE: usize = 2000;

/// Scrapes founding documents from archives.gov and loc.gov.
///
/// archives.gov pages keep their text in `div#main-col`, loc.gov guides in
/// `div.col-md-9`. Pages from any other host produce no document.
#[derive(Debug, Clone)]
pub struct ConstitutionalReader {
    reader: WebsiteReader,
}

impl Default for ConstitutionalReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstitutionalReader {
    pub fn new() -> Self {
        let reader = WebsiteReader::new()
            .with_rule(SelectorRule::new("archives.gov", "div#main-col"))
            .with_rule(SelectorRule::new("loc.gov", "div.col-md-9"))
            .with_fallback_selector(None)
            .with_max_links(0)
            .with_chunker(Chunker::new(CONSTITUTIONAL_CHUNK_SIZE, 0));
        Self { reader }
    }

    /// Follow up to `max_links` links from the start pages that stay under `prefix`
    pub fn following_links(mut self, max_links: usize, prefix: &str) -> Self {
        self.reader = self.reader.with_max_links(max_links).with_link_filters(&[prefix]);
        self
    }

    pub fn reader(&self) -> &WebsiteReader {
        &self.reader
    }

    pub async fn read(&self, urls: &[String]) -> KnowledgeResult<Vec<Document>> {
        self.reader.read(urls).await
    }

    /// Knowledge source over `urls`
    pub fn source(&self, urls: &[&str]) -> WebsiteSource {
        WebsiteSource {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            reader: self.reader.clone(),
        }
    }
}
