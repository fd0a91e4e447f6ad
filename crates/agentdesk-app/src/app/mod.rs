pub mod congress;
pub mod kb;
pub mod project;
pub mod repl;
pub mod review;
pub mod setup;
pub mod web_server;

pub use repl::{run_congress_interactive, run_kb_chat};
pub use setup::AppContext;
pub use web_server::run_web_server;

use anyhow::Result;

use crate::cli::{Cli, Commands, CongressCommands, KbCommands, ReviewCommands};

/// Run the command selected on the command line
pub async fn dispatch(cli: Cli, ctx: AppContext) -> Result<()> {
    match cli.command {
        Commands::Kb { command } => match command {
            KbCommands::Ingest {
                pdf_path,
                text_path,
                clear_existing,
            } => kb::run_ingest(&ctx, pdf_path, text_path, clear_existing).await,
            KbCommands::Stats => kb::run_stats(&ctx).await,
            KbCommands::Query { question } => kb::run_query(&ctx, &question).await,
            KbCommands::Chat => run_kb_chat(&ctx).await,
            KbCommands::Serve { port, bind, load } => run_web_server(&ctx, &bind, port, load).await,
        },
        Commands::Review { command } => match command {
            ReviewCommands::Code { code, file_path, quick } => {
                review::run_review_code(&ctx, &code, &file_path, quick).await
            }
            ReviewCommands::File { path, json } => review::run_review_file(&ctx, &path, json).await,
            ReviewCommands::ValidateFix { original, modified } => {
                review::run_validate_fix(&ctx, &original, &modified).await
            }
        },
        Commands::Implement {
            task_file,
            description,
            requirements,
            max_iterations,
        } => project::run_implement(&ctx, task_file, description, requirements, max_iterations).await,
        Commands::Congress { command } => match command {
            CongressCommands::Fetch => congress::run_fetch(&ctx).await,
            CongressCommands::Verify => congress::run_verify(&ctx).await,
            CongressCommands::Check => congress::run_check(&ctx).await,
            CongressCommands::Reset => congress::run_reset(&ctx).await,
            CongressCommands::Analyze { query } => congress::run_analyze(&ctx, &query).await,
            CongressCommands::Historical {
                force_reload,
                knowledge_only,
            } => congress::run_historical(&ctx, force_reload, knowledge_only).await,
            CongressCommands::Interactive { force_reload } => run_congress_interactive(&ctx, force_reload).await,
            CongressCommands::Topic { topic } => congress::run_topic(&ctx, &topic).await,
        },
        Commands::Plan {
            max_iterations,
            docs_dir,
        } => project::run_plan(&ctx, max_iterations, docs_dir).await,
    }
}
