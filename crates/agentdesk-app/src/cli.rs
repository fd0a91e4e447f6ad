use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for agentdesk
#[derive(Parser)]
#[command(name = "agentdesk")]
#[command(about = "agentdesk - multi-agent document Q&A, code review and analysis workflows")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model every agent uses, as model@backend(url) (e.g. gpt-4o, llama3@llama(http://localhost:8080))
    #[arg(long, global = true, env = "AGENTDESK_MODEL")]
    pub model: Option<String>,

    /// Keep knowledge bases and sessions in memory instead of PostgreSQL
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub memory: bool,

    /// Debug logging and request dumps under logs/
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Document knowledge base
    Kb {
        #[command(subcommand)]
        command: KbCommands,
    },
    /// Code review agents
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
    /// Implement a task iteratively with the code agent
    Implement {
        /// JSON task definition file
        #[arg(long, value_name = "FILE", conflicts_with = "description")]
        task_file: Option<PathBuf>,
        /// Task description (used when no task file is given)
        #[arg(short, long)]
        description: Option<String>,
        /// Requirement for an inline task; repeat for several
        #[arg(short, long = "requirement")]
        requirements: Vec<String>,
        /// Override the task's iteration limit (1 to 4 improvement goals)
        #[arg(long)]
        max_iterations: Option<usize>,
    },
    /// Congressional data and analysis
    Congress {
        #[command(subcommand)]
        command: CongressCommands,
    },
    /// Refine project documentation with the planning agents
    Plan {
        /// Maximum refinement iterations (capped at 20)
        #[arg(long, default_value = "1")]
        max_iterations: usize,
        /// Directory holding requirements/ and tasks/
        #[arg(long, value_name = "DIR")]
        docs_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum KbCommands {
    /// Ingest PDF and text documents into the knowledge base
    Ingest {
        /// PDF directory (defaults to <data dir>/pdfs)
        #[arg(long)]
        pdf_path: Option<PathBuf>,
        /// Text directory (defaults to <data dir>/text)
        #[arg(long)]
        text_path: Option<PathBuf>,
        /// Drop existing documents first
        #[arg(long)]
        clear_existing: bool,
    },
    /// Show document counts
    Stats,
    /// Ask the documentation agent one question
    Query {
        question: String,
    },
    /// Interactive documentation chat
    Chat,
    /// Serve the knowledge base API and web pages
    Serve {
        #[arg(long, default_value = "8000", env = "AGENTDESK_PORT")]
        port: u16,
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Drop and rebuild the knowledge base tables before serving
        #[arg(long)]
        load: bool,
    },
}

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// Review a code snippet
    Code {
        code: String,
        /// Path reported to the reviewers
        #[arg(long, default_value = "snippet")]
        file_path: String,
        /// Single reviewer instead of the full team
        #[arg(long)]
        quick: bool,
    },
    /// Review a file with the full team
    File {
        path: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the security reviewer whether a change fixes its findings
    ValidateFix {
        /// File with the original code
        original: PathBuf,
        /// File with the modified code
        modified: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum CongressCommands {
    /// Download bills, amendments, records and reports from Congress.gov
    Fetch,
    /// Show the saved data files and their top-level keys
    Verify,
    /// Report data freshness and knowledge table sizes
    Check,
    /// Drop every congress knowledge table
    Reset,
    /// Run the step-by-step analysis workflow for one query
    Analyze {
        query: String,
    },
    /// Analyze recent bills with the modern and constitutional analysts
    Historical {
        /// Rebuild knowledge tables even when they hold documents
        #[arg(long)]
        force_reload: bool,
        /// Stop after preparing data and knowledge
        #[arg(long)]
        knowledge_only: bool,
    },
    /// Interactive congressional analysis
    Interactive {
        #[arg(long)]
        force_reload: bool,
    },
    /// Analyze a policy topic
    Topic {
        topic: String,
    },
}
