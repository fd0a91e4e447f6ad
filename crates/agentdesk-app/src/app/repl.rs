use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use agentdesk_types::StatusResponse;
use agentdesk_workflows::congress::INTERACTIVE_EXAMPLES;
use agentdesk_workflows::HistoricalAnalysis;

use crate::app::congress::{congress_client, historical_analysis};
use crate::app::kb::print_answer;
use crate::app::AppContext;

fn is_exit(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "exit" | "quit")
}

/// Documentation chat over the knowledge base
pub async fn run_kb_chat(ctx: &AppContext) -> Result<()> {
    println!("{}", "📚 Knowledge Base Chat".bright_cyan().bold());
    println!(
        "{}",
        format!("Data directory: {}", ctx.settings.data_dir.display()).bright_black()
    );
    println!("{}", "Type 'exit' or 'quit' to exit\n".bright_black());

    let agent = ctx.documentation_agent().await?;
    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline(&format!("{} ", "❯".bright_green()));
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if is_exit(line) {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                let _ = rl.add_history_entry(line);

                match agent.query(line).await {
                    StatusResponse::Success(answer) => print_answer(&answer),
                    StatusResponse::Error { message } => eprintln!("{} {}", "Error:".bright_red().bold(), message),
                }
                println!();
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {}", "Error:".bright_red().bold(), err);
                break;
            }
        }
    }

    Ok(())
}

/// Question-by-question congressional analysis with optional saving
pub async fn run_congress_interactive(ctx: &AppContext, force_reload: bool) -> Result<()> {
    let client = congress_client(ctx);
    let data_updated = HistoricalAnalysis::prepare_data(client.as_ref(), &ctx.settings.congress_data_dir).await?;
    let analysis = historical_analysis(ctx)?;
    analysis.load_knowledge(force_reload || data_updated).await?;

    println!("\n{}", "Welcome to the Congressional Analysis System".bright_cyan().bold());
    println!("{}", "You can ask questions like:".bright_black());
    for example in INTERACTIVE_EXAMPLES {
        println!("{}", format!("- {}", example).bright_black());
    }
    println!();

    let mut rl = DefaultEditor::new()?;
    loop {
        let query = match rl.readline("\nWhat would you like to know? (or 'exit' to quit): ") {
            Ok(line) => line.trim().to_string(),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {}", "Error:".bright_red().bold(), err);
                break;
            }
        };
        if query.is_empty() {
            continue;
        }
        if is_exit(&query) {
            break;
        }
        let _ = rl.add_history_entry(&query);

        println!("\n{}", "Analyzing...".bright_black());
        let response = match analysis.analyze_query(&query).await {
            Ok(response) => response,
            Err(e) => {
                eprintln!("\n{} {:#}", "Error processing query:".bright_red(), e);
                println!("Please try rephrasing your question.");
                continue;
            }
        };

        println!("\n{}", "Analysis Results:".bold());
        println!("----------------");
        println!("{}", response.content);

        let save = match rl.readline("\nWould you like to save this analysis? (y/n): ") {
            Ok(answer) => answer.trim().eq_ignore_ascii_case("y"),
            Err(_) => false,
        };
        if !save {
            continue;
        }
        let filename = match rl.readline("Enter filename to save as: ") {
            Ok(name) => name,
            Err(_) => continue,
        };
        match analysis.save_interactive(&filename, &query, &response.content).await {
            Ok(path) => println!("{}", format!("Analysis saved to {}", path.display()).green()),
            Err(e) => eprintln!("{} {:#}", "Could not save analysis:".bright_red(), e),
        }
    }

    println!("{}", "Goodbye!".bright_cyan());
    Ok(())
}
