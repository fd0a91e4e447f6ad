//! Agents for agentdesk
//!
//! An [`Agent`] binds an LLM client to a prompt, an optional tool set, an
//! optional knowledge base and optional session storage. [`TeamAgent`] runs a
//! group of agents in order and lets a leader combine their answers.

pub mod agent;
pub mod storage;
pub mod team;
pub mod tools;

pub use agent::{Agent, AgentBuilder, DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_NUM_HISTORY_MESSAGES};
pub use storage::{AgentSession, AgentStorage, JsonFileStorage, PgAgentStorage};
pub use team::{MemberResponse, TeamAgent, TeamRun};
pub use tools::{ListFilesTool, ReadFileTool, SaveFileTool, SearchKnowledgeBaseTool};
