use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use agentdesk_workflows::{CodeReviewAgent, CodeReviewTeam, ReviewReport};

use crate::app::AppContext;

fn team(ctx: &AppContext) -> Result<CodeReviewTeam> {
    let work_dir = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(CodeReviewTeam::new(ctx.llm.clone(), work_dir, Some(ctx.storage.clone())).with_verbose(true))
}

fn print_report(report: &ReviewReport) {
    let sections = [
        ("🔒 Security", &report.security),
        ("⚡ Performance", &report.performance),
        ("🎨 Style", &report.style),
        ("📖 Documentation", &report.documentation),
        ("🧪 Testing", &report.testing),
        ("🧭 Summary", &report.summary),
    ];
    println!("\n{}", format!("Review of {}", report.file_path).bright_cyan().bold());
    for (title, body) in sections {
        println!("\n{}\n{}", title.bright_white().bold(), body.trim());
    }
}

pub async fn run_review_code(ctx: &AppContext, code: &str, file_path: &str, quick: bool) -> Result<()> {
    if quick {
        let review = CodeReviewAgent::new(ctx.llm.clone()).review_code(code).await?;
        println!("{}", review);
        return Ok(());
    }
    let report = team(ctx)?.review_code(code, file_path).await?;
    print_report(&report);
    Ok(())
}

pub async fn run_review_file(ctx: &AppContext, path: &Path, json: bool) -> Result<()> {
    let code = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let report = team(ctx)?.review_code(&code, &path.display().to_string()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

pub async fn run_validate_fix(ctx: &AppContext, original: &Path, modified: &Path) -> Result<()> {
    let original_code = tokio::fs::read_to_string(original)
        .await
        .with_context(|| format!("Failed to read {}", original.display()))?;
    let modified_code = tokio::fs::read_to_string(modified)
        .await
        .with_context(|| format!("Failed to read {}", modified.display()))?;

    println!("{}", "🔒 Validating security fix...".bright_cyan());
    let verdict = team(ctx)?.security().validate_fix(&original_code, &modified_code).await?;
    println!("{}", verdict);
    Ok(())
}
