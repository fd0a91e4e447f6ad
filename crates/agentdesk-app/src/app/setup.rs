use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use agentdesk_agents::{AgentStorage, JsonFileStorage, PgAgentStorage};
use agentdesk_knowledge::{DocumentationAgent, SearchType, StoreBackend};
use agentdesk_llm_api::{ClientFactory, Embedder, HashingEmbedder, LlmClient, OpenAiEmbedder};
use agentdesk_logging::mask_api_key;

use crate::cli::Cli;
use crate::config::Settings;

/// Table agent sessions are stored in when PostgreSQL is used
pub const SESSIONS_TABLE: &str = "agent_sessions";

/// Everything a command needs: the settings plus the shared LLM client,
/// embedder, vector-store backend and session storage
pub struct AppContext {
    pub settings: Settings,
    pub llm: Arc<dyn LlmClient>,
    pub embedder: Arc<dyn Embedder>,
    pub backend: StoreBackend,
    pub storage: Arc<dyn AgentStorage>,
    pub verbose: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli, mut settings: Settings) -> Result<Self> {
        if let Some(model) = &cli.model {
            settings.model = model.clone();
        }

        let llm = ClientFactory::from_model_spec(&settings.model, settings.llm_api_key(), "agentdesk", cli.verbose)
            .with_context(|| format!("Failed to create LLM client for {}", settings.model))?;

        if cli.verbose {
            println!("{}", format!("🔧 Model: {}", settings.model).bright_black());
            if let Some(key) = &settings.openai_api_key {
                println!("{}", format!("🔧 OpenAI key: {}", mask_api_key(key)).bright_black());
            }
        }

        if cli.memory {
            return Ok(Self::in_memory(settings, llm, cli.verbose));
        }

        let embedder: Arc<dyn Embedder> = match &settings.openai_api_key {
            Some(key) => Arc::new(OpenAiEmbedder::new(
                key.clone(),
                settings.embeddings_model.clone(),
                settings.embeddings_dimensions,
            )),
            None => {
                log::warn!("OPENAI_API_KEY is not set; using local hashing embeddings");
                Arc::new(HashingEmbedder::new(settings.embeddings_dimensions))
            }
        };
        let backend = StoreBackend::postgres(&settings.db_url, settings.embeddings_dimensions)
            .context("Failed to configure the PostgreSQL connection")?;
        let pool = backend
            .pool()
            .cloned()
            .context("PostgreSQL backend has no connection pool")?;
        let storage: Arc<dyn AgentStorage> = Arc::new(PgAgentStorage::new(pool, SESSIONS_TABLE)?);

        Ok(Self {
            settings,
            llm,
            embedder,
            backend,
            storage,
            verbose: cli.verbose,
        })
    }

    /// Process-local tables, hashing embeddings and JSON session files
    pub fn in_memory(settings: Settings, llm: Arc<dyn LlmClient>, verbose: bool) -> Self {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(settings.embeddings_dimensions));
        let storage: Arc<dyn AgentStorage> = Arc::new(JsonFileStorage::new(settings.sessions_dir.clone()));
        Self {
            settings,
            llm,
            embedder,
            backend: StoreBackend::memory(),
            storage,
            verbose,
        }
    }

    pub async fn documentation_agent(&self) -> Result<DocumentationAgent> {
        self.documentation_agent_in(&self.settings.data_dir).await
    }

    /// Open the documentation agent and bring its tables up to date with the
    /// files under `data_dir`; unchanged files are not re-embedded
    pub async fn documentation_agent_in(&self, data_dir: &Path) -> Result<DocumentationAgent> {
        let agent = DocumentationAgent::new(
            &self.backend,
            self.embedder.clone(),
            self.llm.clone(),
            data_dir,
            &self.settings.vector_db_table,
            SearchType::Hybrid,
        )
        .await
        .with_context(|| format!("Failed to open the knowledge base under {}", data_dir.display()))?;
        let written = agent
            .load(false)
            .await
            .with_context(|| format!("Failed to load the knowledge base under {}", data_dir.display()))?;
        log::debug!("{} new chunks loaded from {}", written, data_dir.display());
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_llm_api::testing::ScriptedLlmClient;

    #[tokio::test]
    async fn test_in_memory_context_opens_documentation_agent() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.data_dir = dir.path().join("data");
        settings.sessions_dir = dir.path().join("sessions");

        let context = AppContext::in_memory(settings, Arc::new(ScriptedLlmClient::new()), false);
        let agent = context.documentation_agent().await.unwrap();

        assert!(dir.path().join("data/pdfs").is_dir());
        assert!(dir.path().join("data/text").is_dir());
        let stats = agent.get_stats().await.into_result().unwrap();
        assert_eq!(stats.stats.total_documents, 0);
    }

    #[tokio::test]
    async fn test_documentation_agent_answers_from_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.data_dir = dir.path().join("data");
        settings.sessions_dir = dir.path().join("sessions");
        std::fs::create_dir_all(settings.data_dir.join("text")).unwrap();
        std::fs::write(
            settings.data_dir.join("text/billing.txt"),
            "Outside counsel invoices follow the billing guidelines.",
        )
        .unwrap();

        let llm = Arc::new(ScriptedLlmClient::with_replies(["See [1]."]));
        let context = AppContext::in_memory(settings, llm, false);
        let agent = context.documentation_agent().await.unwrap();

        let answer = agent.query("billing guidelines for invoices").await.into_result().unwrap();
        assert!(answer.metadata.has_sources);
        assert_eq!(answer.metadata.sources[0].document.id, "billing.txt_1");
    }
}
