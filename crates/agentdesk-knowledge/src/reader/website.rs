use std::collections::{HashSet, VecDeque};

use reqwest::Url;
use scraper::{Html, Selector};

use agentdesk_types::{Document, DocumentMetadata};

use crate::chunking::Chunker;
use crate::error::{KnowledgeError, KnowledgeResult};

/// CSS selector to apply to pages whose host contains `host`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRule {
    pub host: String,
    pub selector: String,
}

impl SelectorRule {
    pub fn new(host: &str, selector: &str) -> Self {
        Self {
            host: host.to_string(),
            selector: selector.to_string(),
        }
    }
}

/// Fetches pages, extracts their main text and optionally follows links
#[derive(Debug, Clone)]
pub struct WebsiteReader {
    rules: Vec<SelectorRule>,
    /// Selector used when no rule matches; `None` means such pages are skipped
    fallback_selector: Option<String>,
    max_links: usize,
    link_filters: Vec<String>,
    chunker: Chunker,
    client: reqwest::Client,
}

impl Default for WebsiteReader {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            fallback_selector: Some("body".to_string()),
            max_links: 0,
            link_filters: Vec::new(),
            chunker: Chunker::default(),
            client: reqwest::Client::new(),
        }
    }
}

impl WebsiteReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: SelectorRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_fallback_selector(mut self, selector: Option<&str>) -> Self {
        self.fallback_selector = selector.map(str::to_string);
        self
    }

    /// Follow up to `max_links` same-host links found on the start pages
    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    /// Only follow links whose URL contains one of these substrings
    pub fn with_link_filters(mut self, filters: &[&str]) -> Self {
        self.link_filters = filters.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Selector that applies to `url`, if any
    pub fn selector_for(&self, url: &Url) -> Option<&str> {
        let host = url.host_str().unwrap_or_default();
        self.rules
            .iter()
            .find(|rule| host.contains(&rule.host))
            .map(|rule| rule.selector.as_str())
            .or(self.fallback_selector.as_deref())
    }

    async fn fetch(&self, url: &Url) -> KnowledgeResult<String> {
        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", "agentdesk/0.1")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(KnowledgeError::read(url, format!("HTTP {}", response.status())));
        }
        Ok(response.text().await?)
    }

    /// Extract documents from one already-fetched page
    pub fn parse_page(&self, url: &Url, html: &str) -> KnowledgeResult<(Vec<Document>, Vec<Url>)> {
        let Some(selector) = self.selector_for(url) else {
            log::debug!("no extraction rule for {}", url);
            return Ok((Vec::new(), Vec::new()));
        };

        let text = extract_text(html, selector)?;
        let links = if self.max_links > 0 { self.extract_links(url, html) } else { Vec::new() };

        if text.is_empty() {
            return Ok((Vec::new(), links));
        }

        let name = page_name(url);
        let metadata = DocumentMetadata::new(&name, "url", url.as_str());
        let document = Document::new(&name, text)
            .with_id(url.as_str())
            .with_metadata(&metadata);
        Ok((self.chunker.chunk_document(&document), links))
    }

    fn extract_links(&self, base: &Url, html: &str) -> Vec<Url> {
        let document = Html::parse_document(html);
        let Ok(anchor) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        document
            .select(&anchor)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| base.join(href).ok())
            .filter(|link| link.host_str() == base.host_str())
            .filter(|link| {
                self.link_filters.is_empty()
                    || self.link_filters.iter().any(|f| link.as_str().contains(f.as_str()))
            })
            .collect()
    }

    /// Read every start URL plus at most `max_links` followed pages
    pub async fn read(&self, urls: &[String]) -> KnowledgeResult<Vec<Document>> {
        let mut queue: VecDeque<Url> = VecDeque::new();
        for url in urls {
            queue.push_back(Url::parse(url).map_err(|e| KnowledgeError::read(url, e))?);
        }

        let start_count = queue.len();
        let mut visited: HashSet<Url> = HashSet::new();
        let mut followed = 0;
        let mut documents = Vec::new();

        while let Some(mut url) = queue.pop_front() {
            url.set_fragment(None);
            if !visited.insert(url.clone()) {
                continue;
            }

            let html = match self.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    log::warn!("failed to fetch {}: {}", url, e);
                    continue;
                }
            };

            let (docs, links) = self.parse_page(&url, &html)?;
            documents.extend(docs);

            // Only start pages contribute links
            if visited.len() <= start_count {
                for link in links {
                    if followed >= self.max_links {
                        break;
                    }
                    if !visited.contains(&link) && !queue.contains(&link) {
                        queue.push_back(link);
                        followed += 1;
                    }
                }
            }
        }

        Ok(documents)
    }
}

fn page_name(url: &Url) -> String {
    let host = url.host_str().unwrap_or("page");
    let path = url.path().trim_matches('/').replace('/', "_");
    if path.is_empty() {
        host.to_string()
    } else {
        format!("{}_{}", host, path)
    }
}

/// Text of every element matching `selector`, with `script`/`style` content
/// removed, one trimmed line per text node and blank lines dropped
pub fn extract_text(html: &str, selector: &str) -> KnowledgeResult<String> {
    let selector = Selector::parse(selector)
        .map_err(|e| KnowledgeError::read(selector, format!("invalid selector: {:?}", e)))?;
    let document = Html::parse_document(html);

    let mut pieces: Vec<String> = Vec::new();
    for element in document.select(&selector) {
        for node in element.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|e| e.name() == "script" || e.name() == "style")
                    .unwrap_or(false)
            });
            if !hidden {
                pieces.push(text.to_string());
            }
        }
    }

    Ok(pieces
        .join("\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <html><body>
          <div id="nav">Skip me</div>
          <div id="main-col">
            <h1>  Article I  </h1>
            <script>var x = 1;</script>
            <style>.a { color: red }</style>
            <p>All legislative Powers herein granted</p>

            <p>shall be vested in a Congress</p>
            <a href="/founding-docs/bill-of-rights">Bill of Rights</a>
            <a href="https://elsewhere.org/x">External</a>
          </div>
        </body></html>"#;

    #[test]
    fn test_extract_text_strips_scripts_and_blank_lines() {
        let text = extract_text(PAGE, "div#main-col").unwrap();
        assert_eq!(
            text,
            "Article I\nAll legislative Powers herein granted\nshall be vested in a Congress\nBill of Rights\nExternal"
        );
    }

    #[test]
    fn test_rules_and_fallback() {
        let reader = WebsiteReader::new()
            .with_rule(SelectorRule::new("archives.gov", "div#main-col"))
            .with_fallback_selector(None);

        let archives = Url::parse("https://www.archives.gov/founding-docs/constitution-transcript").unwrap();
        let other = Url::parse("https://example.com/").unwrap();
        assert_eq!(reader.selector_for(&archives), Some("div#main-col"));
        assert_eq!(reader.selector_for(&other), None);

        let (docs, _) = reader.parse_page(&other, PAGE).unwrap();
        assert!(docs.is_empty());

        let (docs, links) = reader.parse_page(&archives, PAGE).unwrap();
        assert_eq!(docs[0].name, "www.archives.gov_founding-docs_constitution-transcript");
        assert!(links.is_empty());
    }

    #[test]
    fn test_links_same_host_and_filtered() {
        let reader = WebsiteReader::new()
            .with_max_links(5)
            .with_link_filters(&["founding-docs"]);
        let base = Url::parse("https://www.archives.gov/founding-docs/constitution").unwrap();

        let (_, links) = reader.parse_page(&base, PAGE).unwrap();
        assert_eq!(
            links,
            vec![Url::parse("https://www.archives.gov/founding-docs/bill-of-rights").unwrap()]
        );
    }
}
