use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentdesk_agents::Agent;
use agentdesk_congress::{amendment_context, get_bill_details, CongressClient, CongressKnowledge};
use agentdesk_knowledge::KnowledgeBase;
use agentdesk_llm_api::LlmClient;
use agentdesk_types::run::new_run_id;
use agentdesk_types::RunResponse;

use super::agents;

const TWEET_GUIDANCE: &str = "Persona Development:
    Emulate Elon Musk's style with tweets that are concise, witty, and often provocative. Use humor and irony to make points on liberty, free markets, and innovation.
    Adopt Donald Trump's bold and direct communication, focusing on strong, opinionated statements that challenge the status quo, with an emphasis on national pride and traditional values.
    Craft language that aligns with conservative ideologies, highlighting themes of personal responsibility, patriotism, and skepticism towards government expansion.
Content Creation:
    Keep tweets short, ideally within the 280-character limit, to maximize impact and shareability.
    Inject humor or sarcasm to engage followers, often by exaggerating or satirizing current events or political moves.
    Use rhetorical questions or bold claims to incite discussion, reflecting the influencer's knack for creating buzz.
Engagement Tactics:
    Encourage interaction by challenging popular narratives or directly addressing opponents in politics or business.
    Use hashtags to join or start conversations on trending topics, but sparingly, to avoid seeming too promotional or spammy.
    Occasionally stir debate by taking a controversial stance or by critiquing current policies or laws in a way that resonates with conservative audiences.
Specific to the Task:
    When commenting on legislation or current events:
    Frame your tweet as if you're the influencer in question, focusing on how they would critique or support the issue based on their public stances or tweets.

Use a blend of humor, directness, and sometimes even shock value, much like Musk's tweets on regulatory overreach or Trump's on policy.
Include a call to action or a rhetorical flourish that would make the tweet memorable or shareable.";

/// Query → interpretation → modern analysis → three constitutional experts →
/// a founding-father tweet.
///
/// Every step's output is saved under the analyses directory and returned
/// as a [`RunResponse`]. A failing step ends the run with one error response.
pub struct CongressAnalysisWorkflow {
    query_interpreter: Agent,
    congress_analyst: Agent,
    federalism_expert: Agent,
    civil_rights_expert: Agent,
    constitutional_expert: Agent,
    founding_father_voice: Agent,
    client: Option<CongressClient>,
    analyses_dir: PathBuf,
}

impl CongressAnalysisWorkflow {
    /// Without `knowledge` the agents answer from the prompt alone; without
    /// `client` queries are never enriched with Congress.gov bill data
    pub fn new(
        llm: Arc<dyn LlmClient>,
        knowledge: Option<&CongressKnowledge>,
        client: Option<CongressClient>,
        analyses_dir: PathBuf,
    ) -> Self {
        let kb = |select: fn(&CongressKnowledge) -> &Arc<KnowledgeBase>| {
            knowledge.map(|k| select(k).clone())
        };

        Self {
            query_interpreter: agents::query_interpreter(llm.clone()),
            congress_analyst: agents::congress_analyst(llm.clone(), kb(|k| &k.combined)),
            federalism_expert: agents::federalism_expert(llm.clone(), kb(|k| &k.federalism)),
            civil_rights_expert: agents::civil_rights_expert(llm.clone(), kb(|k| &k.bill_of_rights)),
            constitutional_expert: agents::constitutional_expert(llm.clone(), kb(|k| &k.constitution_summaries)),
            founding_father_voice: agents::founding_father_voice(llm),
            client,
            analyses_dir,
        }
    }

    pub fn analyses_dir(&self) -> &Path {
        &self.analyses_dir
    }

    /// Write `<name>_<YYYYmmdd_HHMMSS>.txt` holding the query and the content
    pub async fn save_analysis(&self, name: &str, content: &str, query: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.analyses_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.analyses_dir.display()))?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self.analyses_dir.join(format!("{}_{}.txt", name, timestamp));
        tokio::fs::write(&path, format!("Query: {}\n\n{}", query, content))
            .await
            .with_context(|| format!("Failed to save {}", path.display()))?;
        log::debug!("saved {}", path.display());
        Ok(path)
    }

    /// Add bill details (and what the bill amends) when the query names a bill
    async fn enrich_query(&self, query: &str) -> String {
        let Some(client) = &self.client else {
            return query.to_string();
        };
        let Some(details) = get_bill_details(client, query).await else {
            return query.to_string();
        };

        let mut enriched = details.enrich_query(query);
        if details.has_amendments() {
            let context = amendment_context(client, &json!({ "amendments": details.amendments })).await;
            enriched.push_str(&format!("\nAmendment Context: {}", context));
        }
        enriched
    }

    pub async fn run(&self, query: &str) -> Vec<RunResponse> {
        self.run_with(query, |_| {}).await
    }

    /// Run the workflow, handing each response to `emit` as soon as it exists
    pub async fn run_with<F>(&self, query: &str, mut emit: F) -> Vec<RunResponse>
    where
        F: FnMut(&RunResponse),
    {
        let run_id = new_run_id();
        log::info!("Starting analysis workflow for query: {}", query);

        let mut responses = Vec::new();
        if let Err(e) = self.run_steps(&run_id, query, &mut responses, &mut emit).await {
            log::error!("Error in workflow: {:#}", e);
            let error = RunResponse::new(&run_id, format!("Error analyzing query: {:#}", e));
            emit(&error);
            responses.push(error);
        }
        responses
    }

    async fn run_steps<F>(
        &self,
        run_id: &str,
        query: &str,
        responses: &mut Vec<RunResponse>,
        emit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&RunResponse),
    {
        let mut respond = |content: String| {
            let response = RunResponse::new(run_id, content);
            emit(&response);
            responses.push(response);
        };

        let query = self.enrich_query(query).await;

        let interpretation = self
            .query_interpreter
            .run(&format!("Format this query for congressional analysis: {}", query))
            .await?
            .content;
        self.save_analysis("query_interpretation", &interpretation, &query).await?;
        respond(format!("🔍 Interpreting query...\n\n{}", interpretation));

        let mut modern_analysis = self.congress_analyst.run(&query).await?.content;
        if let (Some(client), Ok(bill_data)) = (&self.client, serde_json::from_str::<Value>(&modern_analysis)) {
            if bill_data.is_object() {
                let context = amendment_context(client, &bill_data).await;
                modern_analysis = format!("{}\n\n{}", modern_analysis, context);
            }
        }
        self.save_analysis("modern_analysis", &modern_analysis, &query).await?;
        respond(format!("📊 Modern Analysis:\n\n{}", modern_analysis));

        let perspectives = [
            (&self.federalism_expert, "federalism", "federalism_analysis", "Federalism"),
            (&self.civil_rights_expert, "rights", "rights_analysis", "Rights"),
            (&self.constitutional_expert, "constitutional structure", "constitutional_analysis", "Structure"),
        ];
        let mut analyses = Vec::with_capacity(perspectives.len());
        for (expert, subject, file_name, title) in perspectives {
            let analysis = expert
                .run(&format!("Analyze the {} implications of: {}", subject, modern_analysis))
                .await?
                .content;
            self.save_analysis(file_name, &analysis, &query).await?;
            analyses.push((title, analysis));
        }
        for (title, analysis) in &analyses {
            respond(format!("🏛 {} Analysis:\n\n{}", title, analysis));
        }

        let combined = analyses
            .iter()
            .map(|(_, analysis)| analysis.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let tweet = self
            .founding_father_voice
            .run(&format!(
                "Based on this analysis of modern legislation:\n{}\n\nAnd these historical perspectives:\n{}\n\n{}",
                modern_analysis, combined, TWEET_GUIDANCE
            ))
            .await?
            .content;
        self.save_analysis("founding_father_tweet", &tweet, &query).await?;
        respond(format!("📜 Founding Father's Tweet:\n\n{}", tweet));

        Ok(())
    }
}
