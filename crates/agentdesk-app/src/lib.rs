//! agentdesk application library
//!
//! Command-line front end, configuration, REPLs and the web server over the
//! agentdesk workspace crates.

// Re-export workspace crates
pub use agentdesk_agents as agents;
pub use agentdesk_congress as congress;
pub use agentdesk_knowledge as knowledge;
pub use agentdesk_llm_api as llm_api;
pub use agentdesk_types as types;
pub use agentdesk_workflows as workflows;

// Local modules
pub mod app;
pub mod cli;
pub mod config;
pub mod web;

pub use app::{dispatch, AppContext};
pub use cli::{Cli, Commands};
pub use config::Settings;
