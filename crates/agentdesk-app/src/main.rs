use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use agentdesk::{dispatch, AppContext, Cli, Settings};
use agentdesk_logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    init_logging(&settings.log_level, cli.verbose);
    log::debug!("environment: {}, debug: {}", settings.app_env, settings.debug);

    let ctx = AppContext::from_cli(&cli, settings)?;
    if let Err(e) = dispatch(cli, ctx).await {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
