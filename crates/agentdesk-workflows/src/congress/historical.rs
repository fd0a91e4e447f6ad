use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentdesk_agents::{AgentStorage, TeamAgent};
use agentdesk_congress::{verify_json_data, CongressClient, CongressKnowledge, Endpoint};
use agentdesk_llm_api::LlmClient;
use agentdesk_types::RunResponse;

use super::agents;

pub const RECENT_BILLS_PROMPT: &str = "Analyze the most recent significant bills in Congress, \
    comparing modern implementation with founding constitutional principles. \
    What would the founding fathers think about these changes?";

pub const INTERACTIVE_EXAMPLES: [&str; 4] = [
    "What are the recent gun control bills and their constitutional implications?",
    "Analyze healthcare legislation from 2023",
    "What would the founding fathers think about H.R. 1234?",
    "Compare recent privacy laws with constitutional principles",
];

/// Prompt the team receives for one interactive question
pub fn interactive_prompt(query: &str) -> String {
    format!(
        "Analyze the following query about congressional legislation \
         and provide both modern and historical constitutional perspectives:\n\n\
         {}\n\n\
         Consider:\n\
         - Relevant bills and their status\n\
         - Constitutional implications\n\
         - Historical context\n\
         - Current impact",
        query
    )
}

/// Modern analyst plus constitutional analyst, led by a team leader that
/// keeps its session history
pub struct HistoricalAnalysis {
    knowledge: Option<Arc<CongressKnowledge>>,
    team: TeamAgent,
    analyses_dir: PathBuf,
}

impl HistoricalAnalysis {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        knowledge: Option<Arc<CongressKnowledge>>,
        storage: Option<Arc<dyn AgentStorage>>,
        analyses_dir: PathBuf,
    ) -> Self {
        let combined = knowledge.as_ref().map(|k| k.combined.clone());
        let constitutional = knowledge.as_ref().map(|k| k.constitutional.clone());

        let team = TeamAgent::new(
            agents::analysis_team_leader(llm.clone(), storage),
            vec![
                agents::congress_analyst(llm.clone(), combined),
                agents::constitutional_perspective_analyst(llm, constitutional),
            ],
        )
        .with_verbose(true);

        Self {
            knowledge,
            team,
            analyses_dir,
        }
    }

    pub fn team(&self) -> &TeamAgent {
        &self.team
    }

    /// Fetch the Congress.gov data files when `bills.json` is missing.
    ///
    /// Returns whether new data was written, which callers use as the
    /// force-reload flag for [`HistoricalAnalysis::load_knowledge`].
    pub async fn prepare_data(client: Option<&CongressClient>, data_dir: &Path) -> Result<bool> {
        let mut updated = false;
        if !tokio::fs::try_exists(data_dir.join("bills.json")).await.unwrap_or(false) {
            match client {
                Some(client) => {
                    let saved = client.fetch_and_save(data_dir, &Endpoint::DATA_FILES).await?;
                    updated = !saved.is_empty();
                }
                None => log::warn!("no Congress.gov client configured, skipping data fetch"),
            }
        }

        for summary in verify_json_data(data_dir).await? {
            println!("\nVerifying {}:", summary.file);
            println!("Structure: {:?}", summary.keys);
            println!("Size: {} characters", summary.size);
        }
        Ok(updated)
    }

    pub async fn load_knowledge(&self, force_reload: bool) -> Result<()> {
        let Some(knowledge) = &self.knowledge else {
            return Ok(());
        };

        println!("\n{}", "Loading Knowledge Bases...".bold());
        println!("-------------------------");
        if force_reload {
            println!("Force reloading all knowledge...");
        } else {
            println!("Updating knowledge bases...");
        }
        let written = knowledge
            .load(force_reload)
            .await
            .context("Failed to load congress knowledge bases")?;
        log::info!("{} documents written to congress knowledge bases", written);
        Ok(())
    }

    /// The canned "recent significant bills" analysis
    pub async fn analyze_recent_bills(&self) -> Result<RunResponse> {
        self.team.run(RECENT_BILLS_PROMPT).await
    }

    pub async fn analyze_query(&self, query: &str) -> Result<RunResponse> {
        self.team.run(&interactive_prompt(query)).await
    }

    /// Save an interactive answer as `<filename>.txt` under the analyses dir
    pub async fn save_interactive(&self, filename: &str, query: &str, content: &str) -> Result<PathBuf> {
        let filename = filename.trim();
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            anyhow::bail!("Invalid file name: {:?}", filename);
        }

        tokio::fs::create_dir_all(&self.analyses_dir).await?;
        let path = self.analyses_dir.join(format!("{}.txt", filename));
        tokio::fs::write(&path, format!("Query: {}\n\nAnalysis:\n{}", query, content))
            .await
            .with_context(|| format!("Failed to save {}", path.display()))?;
        Ok(path)
    }
}
