//! Tool abstraction shared by every agent: the `Tool` trait, parameter
//! handling, the registry and the per-call execution context.

pub mod tool;
pub mod tool_context;
pub mod tool_registry;

pub use tool::{object_schema, ParamKind, ParameterDefinition, Tool, ToolParameters, ToolResult};
pub use tool_context::ToolContext;
pub use tool_registry::ToolRegistry;
