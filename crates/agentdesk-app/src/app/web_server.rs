use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;
use std::sync::Arc;

use agentdesk_workflows::CodeReviewAgent;

use crate::app::AppContext;
use crate::web::server::WebServer;
use crate::web::AppState;

/// Serve the knowledge base API and the chat and review pages
pub async fn run_web_server(ctx: &AppContext, bind: &str, port: u16, load: bool) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    println!("{}", "🌐 Starting agentdesk web server...".bright_cyan());
    println!("   Data directory: {}", ctx.settings.data_dir.display());

    let docs = ctx.documentation_agent().await?;
    if load {
        println!("{}", "📚 Rebuilding knowledge base...".bright_cyan());
        let written = docs.load(true).await.context("Failed to rebuild the knowledge base")?;
        println!("   {} chunks loaded", written);
    }

    let state = AppState {
        docs: Arc::new(docs),
        reviewer: Arc::new(CodeReviewAgent::new(ctx.llm.clone())),
    };
    WebServer::new(addr, state).start().await
}
