//! Code review: five specialist reviewers, a coordinating leader, a
//! single-agent quick reviewer and display formatting for review text.

mod agents;
mod format;
mod team;

pub use agents::{CodeReviewAgent, ReviewAgent, ReviewAspect, SecurityReviewAgent};
pub use format::{parse_review, render_review_html, ReviewBlock};
pub use team::{CodeReviewTeam, ReviewReport};
