use anyhow::{anyhow, Result};
use colored::Colorize;
use std::path::PathBuf;

use agentdesk_knowledge::{DocumentProcessor, QueryResponse};
use agentdesk_logging::safe_truncate;
use agentdesk_types::{MessagePayload, StatusResponse};

use crate::app::AppContext;

fn print_status(response: &StatusResponse<MessagePayload>) {
    if response.is_success() {
        println!("{} {}", "✅".green(), response.message());
    } else {
        println!("{} {}", "❌".red(), response.message().red());
    }
}

/// Ingest the PDF and text directories, then print the stored counts
pub async fn run_ingest(
    ctx: &AppContext,
    pdf_path: Option<PathBuf>,
    text_path: Option<PathBuf>,
    clear_existing: bool,
) -> Result<()> {
    let data_dir = &ctx.settings.data_dir;
    let pdf_path = pdf_path.unwrap_or_else(|| data_dir.join("pdfs"));
    let text_path = text_path.unwrap_or_else(|| data_dir.join("text"));
    let processor = DocumentProcessor::new(
        &ctx.backend,
        ctx.embedder.clone(),
        data_dir,
        &ctx.settings.vector_db_table,
    )?;

    if clear_existing {
        println!("{}", "🗑️  Clearing existing documents...".yellow());
        print_status(&processor.clear_knowledge_base().await);
    }

    println!("{}", format!("📄 Processing PDFs from {}", pdf_path.display()).bright_cyan());
    print_status(&processor.ingest_pdfs(&pdf_path).await);

    println!("{}", format!("📝 Processing text files from {}", text_path.display()).bright_cyan());
    print_status(&processor.ingest_text(&text_path).await);

    let counts = processor.get_document_count().await;
    println!("\n{}", "Document Count Summary:".bright_white().bold());
    println!("PDF Documents: {}", counts.pdf_documents);
    println!("Text Documents: {}", counts.text_documents);
    println!("Total Documents: {}", counts.total);
    Ok(())
}

pub async fn run_stats(ctx: &AppContext) -> Result<()> {
    let agent = ctx.documentation_agent().await?;
    let stats = agent.get_stats().await.into_result().map_err(|e| anyhow!(e))?.stats;

    println!("{}", "📊 Knowledge Base Statistics".bright_cyan().bold());
    println!("Total Documents: {}", stats.total_documents);
    println!("PDF Documents: {}", stats.pdf_documents);
    println!("Text Documents: {}", stats.text_documents);
    Ok(())
}

pub async fn run_query(ctx: &AppContext, question: &str) -> Result<()> {
    let agent = ctx.documentation_agent().await?;
    let answer = agent.query(question).await.into_result().map_err(|e| anyhow!(e))?;
    print_answer(&answer);
    Ok(())
}

/// Answer text followed by the sources it was built from
pub fn print_answer(answer: &QueryResponse) {
    println!("\n{}", answer.response);

    if !answer.metadata.has_sources {
        return;
    }
    println!(
        "\n{}",
        format!(
            "📚 Sources ({} of {} relevant documents):",
            answer.metadata.used_docs, answer.metadata.total_relevant_docs
        )
        .bright_black()
    );
    for (i, source) in answer.metadata.sources.iter().enumerate() {
        println!(
            "{}",
            format!(
                "  [{}] {} (relevance {:.2}): {}",
                i + 1,
                source.document.name,
                source.relevance,
                safe_truncate(source.document.content.trim(), 120)
            )
            .bright_black()
        );
    }
}
