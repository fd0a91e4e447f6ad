use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use agentdesk_congress::{
    check_knowledge_bases, reset_database, topic_query, verify_json_data, CongressClient, CongressKnowledge, Endpoint,
};
use agentdesk_logging::safe_truncate;
use agentdesk_workflows::{CongressAnalysisWorkflow, HistoricalAnalysis};

use crate::app::AppContext;

/// Client for Congress.gov when `CONGRESS_API_KEY` is configured
pub fn congress_client(ctx: &AppContext) -> Option<CongressClient> {
    match &ctx.settings.congress_api_key {
        Some(key) => Some(CongressClient::new(key.clone())),
        None => {
            log::warn!("CONGRESS_API_KEY is not set; bill lookups are disabled");
            None
        }
    }
}

pub fn congress_knowledge(ctx: &AppContext) -> Result<CongressKnowledge> {
    CongressKnowledge::new(&ctx.backend, ctx.embedder.clone(), &ctx.settings.congress_data_dir)
        .context("Failed to open congress knowledge bases")
}

/// Historical analysis with its knowledge and session storage
pub fn historical_analysis(ctx: &AppContext) -> Result<HistoricalAnalysis> {
    Ok(HistoricalAnalysis::new(
        ctx.llm.clone(),
        Some(Arc::new(congress_knowledge(ctx)?)),
        Some(ctx.storage.clone()),
        ctx.settings.analyses_dir.clone(),
    ))
}

pub async fn run_fetch(ctx: &AppContext) -> Result<()> {
    let client = congress_client(ctx).context("CONGRESS_API_KEY is required to fetch data")?;
    let data_dir = &ctx.settings.congress_data_dir;

    println!("{}", format!("📥 Fetching Congress.gov data into {}", data_dir.display()).bright_cyan());
    let saved = client.fetch_and_save(data_dir, &Endpoint::DATA_FILES).await?;
    for path in &saved {
        println!("{} Saved {}", "✅".green(), path.display());
    }
    if saved.len() < Endpoint::DATA_FILES.len() {
        println!(
            "{}",
            format!("⚠️  {} of {} collections failed, see the log", Endpoint::DATA_FILES.len() - saved.len(), Endpoint::DATA_FILES.len())
                .yellow()
        );
    }
    Ok(())
}

pub async fn run_verify(ctx: &AppContext) -> Result<()> {
    let summaries = verify_json_data(&ctx.settings.congress_data_dir).await?;
    if summaries.is_empty() {
        println!("{}", "No data files found. Run `agentdesk congress fetch` first.".yellow());
    }
    for summary in summaries {
        println!("\nVerifying {}:", summary.file.bold());
        println!("Structure: {:?}", summary.keys);
        println!("Size: {} characters", summary.size);
    }
    Ok(())
}

pub async fn run_check(ctx: &AppContext) -> Result<()> {
    let report = check_knowledge_bases(&ctx.backend, &ctx.settings.congress_data_dir).await;
    print!("{}", report);
    Ok(())
}

pub async fn run_reset(ctx: &AppContext) -> Result<()> {
    println!("{}", "🗑️  Dropping congress knowledge tables...".yellow());
    let results = reset_database(&ctx.backend).await;
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    for result in &results {
        println!("{}", result);
    }
    if failed > 0 {
        anyhow::bail!("{} tables could not be dropped", failed);
    }
    println!("{}", "✅ Database reset complete".green());
    Ok(())
}

pub async fn run_analyze(ctx: &AppContext, query: &str) -> Result<()> {
    let knowledge = congress_knowledge(ctx)?;
    let workflow = CongressAnalysisWorkflow::new(
        ctx.llm.clone(),
        Some(&knowledge),
        congress_client(ctx),
        ctx.settings.analyses_dir.clone(),
    );

    let responses = workflow
        .run_with(query, |response| {
            println!("\n{}\n", response.content);
            println!("{}", "=".repeat(50).bright_black());
        })
        .await;
    println!(
        "{}",
        format!("{} steps written to {}", responses.len(), workflow.analyses_dir().display()).bright_black()
    );
    Ok(())
}

pub async fn run_historical(ctx: &AppContext, force_reload: bool, knowledge_only: bool) -> Result<()> {
    println!("{}", "Starting Congressional Analysis System...".bright_cyan().bold());
    let client = congress_client(ctx);
    let data_updated = HistoricalAnalysis::prepare_data(client.as_ref(), &ctx.settings.congress_data_dir).await?;

    let analysis = historical_analysis(ctx)?;
    analysis.load_knowledge(force_reload || data_updated).await?;
    if knowledge_only {
        return Ok(());
    }

    println!("\n{}", "Analyzing Recent Bills...".bold());
    println!("------------------------");
    let response = analysis.analyze_recent_bills().await?;
    println!("\n{}", response.content);
    Ok(())
}

pub async fn run_topic(ctx: &AppContext, topic: &str) -> Result<()> {
    let knowledge = congress_knowledge(ctx)?;
    let query = topic_query(topic);
    println!("{}", format!("🔎 Searching congressional data for: {}", query).bright_cyan());

    let hits = knowledge.combined.search(&query).await?;
    if hits.is_empty() {
        println!("{}", "No matching documents. Load the knowledge bases with `agentdesk congress historical --knowledge-only`.".yellow());
    }
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "  [{}] {} ({:.2}): {}",
            i + 1,
            hit.document.name,
            hit.relevance,
            safe_truncate(hit.document.content.trim(), 160)
        );
    }

    let analysis = historical_analysis(ctx)?;
    let response = analysis
        .analyze_query(&format!("Recent legislation on {} (search terms: {})", topic, query))
        .await?;
    println!("\n{}", response.content);
    Ok(())
}
