//! Tools agents can call: file access confined to the tool context's work
//! directory, and knowledge-base search.

pub mod file_tools;
pub mod knowledge_tool;

pub use file_tools::{ListFilesTool, ReadFileTool, SaveFileTool};
pub use knowledge_tool::SearchKnowledgeBaseTool;
