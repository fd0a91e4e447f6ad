use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

use agentdesk_llm_api::embeddings::{DEFAULT_EMBEDDINGS_DIMENSIONS, DEFAULT_EMBEDDINGS_MODEL};
use agentdesk_llm_api::{BackendType, ModelSpec, DEFAULT_MODEL};
use agentdesk_types::DEFAULT_DB_URL;

/// Application settings, read from the environment (and `.env` through
/// dotenvy). Keys are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub db_url: String,
    pub app_env: String,
    pub debug: bool,
    pub log_level: String,
    pub vector_db_table: String,
    pub embeddings_model: String,
    pub embeddings_dimensions: usize,
    pub congress_api_key: Option<String>,
    /// `model@backend(url)` spec every agent is created from
    pub model: String,
    /// Holds `pdfs/` and `text/` for the document knowledge base
    pub data_dir: PathBuf,
    pub congress_data_dir: PathBuf,
    pub analyses_dir: PathBuf,
    /// Project-planning documents
    pub docs_dir: PathBuf,
    /// Agent sessions when no database is used
    pub sessions_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            db_url: DEFAULT_DB_URL.to_string(),
            app_env: "development".to_string(),
            debug: true,
            log_level: "INFO".to_string(),
            vector_db_table: "knowledge_base".to_string(),
            embeddings_model: DEFAULT_EMBEDDINGS_MODEL.to_string(),
            embeddings_dimensions: DEFAULT_EMBEDDINGS_DIMENSIONS,
            congress_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            data_dir: PathBuf::from("data"),
            congress_data_dir: PathBuf::from("democracy/data"),
            analyses_dir: PathBuf::from("democracy/analyses"),
            docs_dir: PathBuf::from("docs"),
            sessions_dir: PathBuf::from("tmp/sessions"),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid boolean for {}: {}", key, other),
    }
}

/// SQLAlchemy-style URLs name a driver (`postgresql+psycopg://`); sqlx does not
fn normalize_db_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) if scheme.starts_with("postgresql+") || scheme.starts_with("postgres+") => {
            format!("postgresql://{}", rest)
        }
        _ => url.to_string(),
    }
}

impl Settings {
    /// The OpenAI key applies only to OpenAI models; other backends read
    /// their own key variable when the client is created
    pub fn llm_api_key(&self) -> Option<String> {
        match ModelSpec::parse(&self.model).backend {
            None | Some(BackendType::OpenAI) => self.openai_api_key.clone(),
            Some(_) => None,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect();
        let get = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();
        let path = |key: &str, default: PathBuf| get(key).map(PathBuf::from).unwrap_or(default);

        let defaults = Self::default();
        let debug = match get("debug") {
            Some(value) => parse_bool("DEBUG", &value)?,
            None => defaults.debug,
        };
        let embeddings_dimensions = match get("embeddings_dimensions") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Invalid EMBEDDINGS_DIMENSIONS: {}", value))?,
            None => defaults.embeddings_dimensions,
        };

        Ok(Self {
            openai_api_key: get("openai_api_key"),
            db_url: normalize_db_url(&get("db_url").unwrap_or(defaults.db_url)),
            app_env: get("app_env").unwrap_or(defaults.app_env),
            debug,
            log_level: get("log_level").unwrap_or(defaults.log_level),
            vector_db_table: get("vector_db_table").unwrap_or(defaults.vector_db_table),
            embeddings_model: get("embeddings_model").unwrap_or(defaults.embeddings_model),
            embeddings_dimensions,
            congress_api_key: get("congress_api_key"),
            model: get("agentdesk_model").unwrap_or(defaults.model),
            data_dir: path("data_dir", defaults.data_dir),
            congress_data_dir: path("congress_data_dir", defaults.congress_data_dir),
            analyses_dir: path("analyses_dir", defaults.analyses_dir),
            docs_dir: path("docs_dir", defaults.docs_dir),
            sessions_dir: path("sessions_dir", defaults.sessions_dir),
        })
    }
}
