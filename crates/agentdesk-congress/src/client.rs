use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::{CongressError, CongressResult};

pub const CONGRESS_API_URL: &str = "https://api.congress.gov/v3";

/// Congress.gov collections the client knows how to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Bills,
    Summaries,
    Records,
    Reports,
    Members,
    Committees,
    Hearings,
    Nominations,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::Bills,
        Endpoint::Summaries,
        Endpoint::Records,
        Endpoint::Reports,
        Endpoint::Members,
        Endpoint::Committees,
        Endpoint::Hearings,
        Endpoint::Nominations,
    ];

    /// The collections saved to the data directory by default
    pub const DATA_FILES: [Endpoint; 4] = [
        Endpoint::Bills,
        Endpoint::Summaries,
        Endpoint::Records,
        Endpoint::Reports,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Bills => "bill",
            Endpoint::Summaries => "summaries",
            Endpoint::Records => "congressional-record",
            Endpoint::Reports => "committee-report",
            Endpoint::Members => "member",
            Endpoint::Committees => "committee",
            Endpoint::Hearings => "hearing",
            Endpoint::Nominations => "nomination",
        }
    }

    /// Short name, also the stem of the saved data file
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Bills => "bills",
            Endpoint::Summaries => "summaries",
            Endpoint::Records => "records",
            Endpoint::Reports => "reports",
            Endpoint::Members => "members",
            Endpoint::Committees => "committees",
            Endpoint::Hearings => "hearings",
            Endpoint::Nominations => "nominations",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|endpoint| endpoint.name().eq_ignore_ascii_case(name))
    }

    pub fn default_limit(&self) -> u32 {
        match self {
            Endpoint::Bills => 50,
            _ => 20,
        }
    }
}

/// Client for the Congress.gov v3 REST API
#[derive(Debug, Clone)]
pub struct CongressClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CongressClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: CONGRESS_API_URL.to_string(),
            api_key,
        }
    }

    /// Client keyed by `CONGRESS_API_KEY`
    pub fn from_env() -> CongressResult<Self> {
        match std::env::var("CONGRESS_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(CongressError::MissingApiKey),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> CongressResult<Value> {
        let url = format!("{}/{}", self.base_url, path);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("format", "json")])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CongressError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// List a collection
    pub async fn fetch(&self, endpoint: Endpoint, limit: u32) -> CongressResult<Value> {
        let mut query = vec![("limit", limit.to_string())];
        if endpoint == Endpoint::Bills {
            query.push(("offset", "0".to_string()));
        }
        self.get_json(endpoint.path(), &query).await
    }

    /// One bill, e.g. `get_bill(118, "hr", 1234)`
    pub async fn get_bill(&self, congress: u32, bill_type: &str, number: u32) -> CongressResult<Value> {
        let path = format!("bill/{}/{}/{}", congress, bill_type.to_lowercase(), number);
        self.get_json(&path, &[]).await
    }

    /// Fetch each endpoint and save it as pretty-printed `<name>.json` under
    /// `data_dir`; failing endpoints are logged and skipped
    pub async fn fetch_and_save(&self, data_dir: &Path, endpoints: &[Endpoint]) -> CongressResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(data_dir).await?;

        let mut saved = Vec::new();
        for endpoint in endpoints {
            let data = match self.fetch(*endpoint, endpoint.default_limit()).await {
                Ok(data) => data,
                Err(e) => {
                    log::warn!("skipping {}: {}", endpoint.name(), e);
                    continue;
                }
            };

            if let Some(object) = data.as_object() {
                let keys: Vec<&String> = object.keys().collect();
                log::info!("fetched {} data, response structure: {:?}", endpoint.name(), keys);
            }

            let path = data_dir.join(format!("{}.json", endpoint.name()));
            tokio::fs::write(&path, serde_json::to_string_pretty(&data)?).await?;
            saved.push(path);
        }
        Ok(saved)
    }
}
