use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use agentdesk_agents::{Agent, AgentStorage};
use agentdesk_knowledge::KnowledgeBase;
use agentdesk_llm_api::LlmClient;
use agentdesk_types::{TaskDefinition, TaskResult};

/// Goal of each implementation iteration, in order
pub const IMPROVEMENT_GOALS: [&str; 4] = [
    "Initial implementation meeting basic requirements",
    "Optimize performance and add comprehensive error handling",
    "Enhance documentation and add usage examples",
    "Final polish and edge case handling",
];

const CODE_AGENT_INSTRUCTIONS: [&str; 13] = [
    "You are a code implementation expert.",
    "Your role is to implement code based on task requirements.",
    "Follow these guidelines:",
    "1. Write clean, efficient, and well-documented code",
    "2. Follow the language's best practices and conventions",
    "3. Include proper error handling",
    "4. Add type annotations where appropriate",
    "5. Include doc comments and comments",
    "6. Consider security implications",
    "7. Optimize for performance where possible",
    "8. Format your responses in markdown",
    "9. Use code blocks for implementation",
    "10. In each iteration, focus on specific improvements",
];

/// Implements a task over a fixed sequence of improvement goals, feeding
/// each iteration's code into the next
pub struct CodeAgent {
    agent: Agent,
}

impl CodeAgent {
    /// `patterns` is searched for reference code on every call when given
    pub fn new(
        llm: Arc<dyn LlmClient>,
        patterns: Option<Arc<KnowledgeBase>>,
        storage: Option<Arc<dyn AgentStorage>>,
    ) -> Self {
        let mut builder = Agent::builder(llm)
            .name("Code Implementation Agent")
            .role("Expert developer implementing code based on requirements")
            .instructions(CODE_AGENT_INSTRUCTIONS)
            .show_tool_calls(true)
            .markdown(true);
        if let Some(patterns) = patterns {
            builder = builder.knowledge(patterns).search_knowledge(true);
        }
        if let Some(storage) = storage {
            builder = builder.storage(storage).session_id("code_agent");
        }
        Self { agent: builder.build() }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Number of iterations a task gets: its own limit capped by the goal
    /// list, and at least one
    pub fn iteration_count(task: &TaskDefinition) -> usize {
        task.max_iterations.clamp(1, IMPROVEMENT_GOALS.len())
    }

    pub async fn implement_task(&self, task: &TaskDefinition) -> Result<TaskResult> {
        let total = Self::iteration_count(task);
        let mut current_code: Option<String> = None;

        println!("{}", "🚀 Starting Code Implementation".bright_cyan().bold());

        for (index, goal) in IMPROVEMENT_GOALS.iter().take(total).enumerate() {
            println!("\n{}", format!("Iteration {}/{}", index + 1, total).cyan().bold());
            println!("{}", format!("Goal: {}", goal).yellow().bold());

            let prompt = format!(
                "Implement or improve code for this task:\n\
                 Description: {}\n\
                 Requirements: {}\n\
                 Previous Code: {}\n\
                 Iteration: {}/{}\n\
                 Current Goal: {}\n\n\
                 Format your response in markdown with code blocks.\n\
                 Include a section explaining how this iteration improves upon the previous one.",
                task.description,
                task.requirements.join("; "),
                current_code.as_deref().unwrap_or("None"),
                index + 1,
                total,
                goal
            );

            let response = self
                .agent
                .run(&prompt)
                .await
                .with_context(|| format!("Implementation iteration {} failed", index + 1))?;

            println!(
                "{}\n{}",
                format!("── Implementation Result - Iteration {} ──", index + 1).green(),
                response.content
            );
            current_code = Some(response.content);
        }

        let final_goal = IMPROVEMENT_GOALS[total - 1].to_string();
        println!(
            "{}\n  Total Iterations: {}\n  Final Goal Achieved: {}",
            "✅ Implementation Complete".green().bold(),
            total,
            final_goal
        );

        Ok(TaskResult {
            task_id: task.id.clone(),
            code: current_code.unwrap_or_default(),
            iterations: total,
            final_goal,
            review_score: None,
            test_coverage: None,
            security_score: None,
        })
    }

    /// Revise `code` according to review `feedback`
    pub async fn modify_code(&self, code: &str, feedback: &str, task: &TaskDefinition) -> Result<String> {
        println!("{}", "🔄 Starting Code Modification".bright_cyan().bold());

        let prompt = format!(
            "Modify this code based on feedback:\n\n\
             Current Code:\n{}\n\n\
             Feedback:\n{}\n\n\
             Original Requirements:\n{}\n\n\
             Format your response in markdown with code blocks.\n\
             Include a section explaining the improvements made.",
            code,
            feedback,
            task.requirements
                .iter()
                .map(|r| format!("- {}", r))
                .collect::<Vec<_>>()
                .join("\n")
        );
        let modified = self.agent.run(&prompt).await.context("Code modification failed")?.content;

        println!("{}", "✅ Modification Complete".green().bold());
        Ok(modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_types::{QualityThresholds, TaskPriority, TaskType};

    fn task(max_iterations: usize) -> TaskDefinition {
        TaskDefinition {
            id: "TASK-001".into(),
            task_type: TaskType::Feature,
            priority: TaskPriority::High,
            description: "Create a function to calculate Fibonacci numbers".into(),
            requirements: vec!["Implement recursive and iterative solutions".into(), "Add type hints".into()],
            acceptance_criteria: vec!["All test cases pass".into()],
            dependencies: None,
            max_iterations,
            quality_thresholds: QualityThresholds::default(),
        }
    }

    #[test]
    fn test_iteration_count_is_capped() {
        assert_eq!(CodeAgent::iteration_count(&task(5)), 4);
        assert_eq!(CodeAgent::iteration_count(&task(2)), 2);
        assert_eq!(CodeAgent::iteration_count(&task(0)), 1);
    }
}
