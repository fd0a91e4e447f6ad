use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use agentdesk_agents::{Agent, AgentStorage, ListFilesTool, ReadFileTool};
use agentdesk_llm_api::LlmClient;

use super::agents::{ReviewAgent, ReviewAspect, SecurityReviewAgent};

const TEAM_INSTRUCTIONS: [&str; 10] = [
    "Coordinate code review activities",
    "Synthesize findings from team members",
    "Prioritize issues and recommendations",
    "Generate clear summary reports",
    "Manage review workflow:",
    "1. Security review first",
    "2. Performance analysis",
    "3. Documentation review",
    "4. Testing review",
    "5. Final synthesis and recommendations",
];

/// Structured result of a full team review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub file_path: String,
    pub security: String,
    pub performance: String,
    pub style: String,
    pub documentation: String,
    pub testing: String,
    pub summary: String,
}

/// Five specialists plus a leader that writes the prioritised summary
pub struct CodeReviewTeam {
    security: SecurityReviewAgent,
    performance: ReviewAgent,
    style: ReviewAgent,
    documentation: ReviewAgent,
    testing: ReviewAgent,
    leader: Agent,
    verbose: bool,
}

impl CodeReviewTeam {
    pub fn new(llm: Arc<dyn LlmClient>, work_dir: PathBuf, storage: Option<Arc<dyn AgentStorage>>) -> Self {
        let mut leader = Agent::builder(llm.clone())
            .name("Code Review Team")
            .role("Lead code review coordinator managing the review process")
            .instructions(TEAM_INSTRUCTIONS)
            .tool(ReadFileTool)
            .tool(ListFilesTool)
            .work_dir(work_dir)
            .read_chat_history(true)
            .show_tool_calls(true)
            .markdown(true);
        if let Some(storage) = storage {
            leader = leader.storage(storage).session_id("review_team");
        }

        Self {
            security: SecurityReviewAgent::new(llm.clone()),
            performance: ReviewAgent::new(ReviewAspect::Performance, llm.clone()),
            style: ReviewAgent::new(ReviewAspect::Style, llm.clone()),
            documentation: ReviewAgent::new(ReviewAspect::Documentation, llm.clone()),
            testing: ReviewAgent::new(ReviewAspect::Testing, llm),
            leader: leader.build(),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn security(&self) -> &SecurityReviewAgent {
        &self.security
    }

    fn specialist(&self, aspect: ReviewAspect) -> &ReviewAgent {
        match aspect {
            ReviewAspect::Security => &*self.security,
            ReviewAspect::Performance => &self.performance,
            ReviewAspect::Style => &self.style,
            ReviewAspect::Documentation => &self.documentation,
            ReviewAspect::Testing => &self.testing,
        }
    }

    /// Leader-only review, no specialists
    pub async fn quick_review(&self, code: &str) -> Result<String> {
        Ok(self.leader.run(&format!("Review this code: {}", code)).await?.content)
    }

    /// Run every specialist in order, then have the leader synthesise
    pub async fn review_code(&self, code: &str, file_path: &str) -> Result<ReviewReport> {
        let mut reviews = Vec::with_capacity(ReviewAspect::ALL.len());
        for aspect in ReviewAspect::ALL {
            if self.verbose {
                println!("{} {} review...", "🔍".cyan(), aspect.title());
            }
            let review = self
                .specialist(aspect)
                .review_code(code, file_path)
                .await
                .with_context(|| format!("{} review failed", aspect.title()))?;
            reviews.push(review);
        }

        if self.verbose {
            println!("{} Synthesizing findings...", "🧭".cyan());
        }
        let summary = self
            .leader
            .run(&synthesis_prompt(file_path, &reviews))
            .await
            .context("Review synthesis failed")?
            .content;

        let mut reviews = reviews.into_iter();
        let mut next = || reviews.next().unwrap_or_default();
        Ok(ReviewReport {
            file_path: file_path.to_string(),
            security: next(),
            performance: next(),
            style: next(),
            documentation: next(),
            testing: next(),
            summary,
        })
    }
}

fn synthesis_prompt(file_path: &str, reviews: &[String]) -> String {
    let sections = ReviewAspect::ALL
        .iter()
        .zip(reviews)
        .map(|(aspect, review)| format!("{} Review:\n{}", aspect.title(), review.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Synthesize the following reviews for {}:\n\n{}\n\n\
         Provide a prioritized list of issues and recommendations that:\n\
         1. Highlights the most critical issues\n\
         2. Groups related issues across different aspects\n\
         3. Suggests a prioritized order for addressing the issues\n\
         4. Identifies any conflicts between different recommendations",
        file_path, sections
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_prompt_keeps_order() {
        let reviews: Vec<String> = ["s", "p", "st", "d", "t"].iter().map(|r| r.to_string()).collect();
        let prompt = synthesis_prompt("main.py", &reviews);
        assert!(prompt.starts_with("Synthesize the following reviews for main.py:\n\nSecurity Review:\ns\n\nPerformance Review:\np"));
        assert!(prompt.contains("Documentation Review:\nd\n\nTesting Review:\nt"));
    }
}
