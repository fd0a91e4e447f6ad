//! Congressional analysis: the step-by-step analysis workflow, the
//! modern/constitutional analysis team and the agents both are built from.

pub mod agents;
mod historical;
mod workflow;

pub use historical::{interactive_prompt, HistoricalAnalysis, INTERACTIVE_EXAMPLES, RECENT_BILLS_PROMPT};
pub use workflow::CongressAnalysisWorkflow;
