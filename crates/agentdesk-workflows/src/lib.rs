//! Multi-agent workflows built on `agentdesk-agents`:
//!
//! - [`review`]: a code review team and the single-agent quick reviewer
//! - [`implement`]: iterative code implementation from a task definition
//! - [`congress`]: congressional analysis with constitutional perspectives
//! - [`project`]: the project-planning refinement loop

pub mod congress;
pub mod implement;
pub mod project;
pub mod review;

pub use congress::{CongressAnalysisWorkflow, HistoricalAnalysis};
pub use implement::{CodeAgent, IMPROVEMENT_GOALS};
pub use project::{CompletionStatus, ProjectManagementWorkflow, WorkflowMemory, WorkflowRun};
pub use review::{
    parse_review, render_review_html, CodeReviewAgent, CodeReviewTeam, ReviewAgent, ReviewAspect, ReviewBlock,
    ReviewReport, SecurityReviewAgent,
};
