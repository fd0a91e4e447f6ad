use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use agentdesk_agents::Agent;
use agentdesk_llm_api::LlmClient;

/// One area a specialist reviewer covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAspect {
    Security,
    Performance,
    Style,
    Documentation,
    Testing,
}

impl ReviewAspect {
    /// Order in which the team runs its specialists
    pub const ALL: [ReviewAspect; 5] = [
        ReviewAspect::Security,
        ReviewAspect::Performance,
        ReviewAspect::Style,
        ReviewAspect::Documentation,
        ReviewAspect::Testing,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReviewAspect::Security => "Security",
            ReviewAspect::Performance => "Performance",
            ReviewAspect::Style => "Style",
            ReviewAspect::Documentation => "Documentation",
            ReviewAspect::Testing => "Testing",
        }
    }

    pub fn agent_name(&self) -> String {
        format!("{} Review Agent", self.title())
    }

    fn description(&self) -> &'static str {
        match self {
            ReviewAspect::Security => {
                "I am a security expert that reviews code for potential security vulnerabilities. \
                 I check for issues like hardcoded credentials, injection vulnerabilities, and unsafe operations."
            }
            ReviewAspect::Performance => {
                "I am a performance optimization expert that reviews code for efficiency issues. \
                 I identify performance bottlenecks, memory leaks, and optimization opportunities."
            }
            ReviewAspect::Style => {
                "I am a code style expert that reviews code for readability and maintainability. \
                 I ensure code follows the conventions and best practices of its language."
            }
            ReviewAspect::Documentation => {
                "I am a documentation expert that reviews code for missing or misleading documentation. \
                 I check doc comments, module overviews and usage examples."
            }
            ReviewAspect::Testing => {
                "I am a testing expert that reviews code for testability and test coverage. \
                 I point out untested paths and the tests that should exist."
            }
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            ReviewAspect::Security => {
                "You are an expert security code reviewer. Your task is to:\
                 \n1. Identify security vulnerabilities in code\
                 \n2. Assess the severity of each issue\
                 \n3. Provide clear explanations of the risks\
                 \n4. Suggest secure alternatives and fixes"
            }
            ReviewAspect::Performance => {
                "You are an expert performance code reviewer. Your task is to:\
                 \n1. Identify performance bottlenecks and inefficiencies\
                 \n2. Detect potential memory leaks and resource management issues\
                 \n3. Suggest algorithmic improvements and optimizations\
                 \n4. Provide benchmarking suggestions when relevant\
                 \n5. Consider both time and space complexity"
            }
            ReviewAspect::Style => {
                "You are an expert code style reviewer. Your task is to:\
                 \n1. Ensure compliance with the language's style guidelines\
                 \n2. Check code readability and clarity\
                 \n3. Verify proper documentation and comments\
                 \n4. Assess naming conventions and consistency\
                 \n5. Review code organization and structure"
            }
            ReviewAspect::Documentation => {
                "You are an expert documentation reviewer. Your task is to:\
                 \n1. Find public items without documentation\
                 \n2. Spot comments that contradict the code\
                 \n3. Check that errors, panics and side effects are documented\
                 \n4. Suggest usage examples where they help"
            }
            ReviewAspect::Testing => {
                "You are an expert test reviewer. Your task is to:\
                 \n1. Identify code paths that lack tests\
                 \n2. Point out hard-to-test designs and how to untangle them\
                 \n3. Suggest concrete test cases, including edge cases\
                 \n4. Review existing tests for weak assertions"
            }
        }
    }

    fn subject(&self) -> &'static str {
        match self {
            ReviewAspect::Security => "security vulnerabilities",
            ReviewAspect::Performance => "performance issues",
            ReviewAspect::Style => "style and readability",
            ReviewAspect::Documentation => "documentation quality",
            ReviewAspect::Testing => "testability and test coverage",
        }
    }

    fn focus(&self) -> &'static [&'static str] {
        match self {
            ReviewAspect::Security => &[
                "Authentication/Authorization issues",
                "Data validation and sanitization",
                "Cryptographic misuse",
                "Information disclosure",
                "Access control",
            ],
            ReviewAspect::Performance => &[
                "Time complexity analysis",
                "Memory usage and potential leaks",
                "Resource management",
                "Algorithmic efficiency",
                "Caching opportunities",
                "Database query optimization (if applicable)",
            ],
            ReviewAspect::Style => &[
                "Style guide compliance",
                "Variable and function naming",
                "Code documentation and comments",
                "Code organization and structure",
                "Consistency in style",
                "Readability and maintainability",
            ],
            ReviewAspect::Documentation => &[
                "Missing doc comments on public items",
                "Outdated or misleading comments",
                "Documented errors and edge cases",
                "Usage examples",
            ],
            ReviewAspect::Testing => &[
                "Untested branches and error paths",
                "Edge cases and boundary values",
                "Isolation of external dependencies",
                "Quality of existing assertions",
            ],
        }
    }

    fn issue_format(&self) -> &'static [&'static str] {
        match self {
            ReviewAspect::Security => &[
                "Severity: (critical/major/minor)",
                "Line number: (if applicable)",
                "Issue: (description)",
                "Fix: (suggestion)",
            ],
            ReviewAspect::Performance => &[
                "Impact: (high/medium/low)",
                "Line number: (if applicable)",
                "Issue: (description)",
                "Optimization: (suggestion)",
                "Expected improvement: (estimated performance gain)",
            ],
            ReviewAspect::Style => &[
                "Type: (style/documentation/organization)",
                "Line number: (if applicable)",
                "Issue: (description)",
                "Suggestion: (how to improve)",
            ],
            ReviewAspect::Documentation => &[
                "Item: (function, type or module)",
                "Issue: (what is missing or wrong)",
                "Suggestion: (proposed documentation)",
            ],
            ReviewAspect::Testing => &[
                "Priority: (high/medium/low)",
                "Target: (function or behavior)",
                "Test case: (inputs and expected outcome)",
            ],
        }
    }

    /// Review request for `code` from `file_path`
    pub fn review_prompt(&self, code: &str, file_path: &str) -> String {
        let focus = self
            .focus()
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, item))
            .collect::<Vec<_>>()
            .join("\n");
        let format = self
            .issue_format()
            .iter()
            .map(|field| format!("- {}", field))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Please review this code for {}:\n\nFile: {}\n```{}\n{}\n```\n\nFocus on:\n{}\n\nFormat each issue as:\n{}",
            self.subject(),
            file_path,
            fence_language(file_path),
            code,
            focus,
            format
        )
    }
}

/// Code fence language guessed from the file extension
pub(crate) fn fence_language(file_path: &str) -> &'static str {
    match Path::new(file_path).extension().and_then(|e| e.to_str()) {
        Some("py") => "python",
        Some("rs") => "rust",
        Some("js") => "javascript",
        Some("ts") => "typescript",
        Some("go") => "go",
        Some("java") => "java",
        Some("c") | Some("h") => "c",
        Some("cpp") | Some("hpp") | Some("cc") => "cpp",
        Some("rb") => "ruby",
        Some("sh") => "bash",
        _ => "",
    }
}

/// A reviewer specialised in one [`ReviewAspect`]
pub struct ReviewAgent {
    aspect: ReviewAspect,
    agent: Agent,
}

impl ReviewAgent {
    pub fn new(aspect: ReviewAspect, llm: Arc<dyn LlmClient>) -> Self {
        let agent = Agent::builder(llm)
            .name(&aspect.agent_name())
            .description(aspect.description())
            .system_prompt(aspect.system_prompt())
            .markdown(true)
            .build();
        Self { aspect, agent }
    }

    pub fn aspect(&self) -> ReviewAspect {
        self.aspect
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub async fn review_code(&self, code: &str, file_path: &str) -> Result<String> {
        log::info!("{} reviewing {}", self.agent.name(), file_path);
        let response = self.agent.run(&self.aspect.review_prompt(code, file_path)).await?;
        Ok(response.content)
    }
}

/// Security reviewer that can also check a proposed fix
pub struct SecurityReviewAgent {
    inner: ReviewAgent,
}

impl SecurityReviewAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            inner: ReviewAgent::new(ReviewAspect::Security, llm),
        }
    }

    pub async fn review_code(&self, code: &str, file_path: &str) -> Result<String> {
        self.inner.review_code(code, file_path).await
    }

    /// Compare original and modified code for fixed and newly introduced issues
    pub async fn validate_fix(&self, original_code: &str, modified_code: &str) -> Result<String> {
        let prompt = format!(
            "Please compare the original and modified code for security implications:\n\n\
             Original:\n```\n{}\n```\n\n\
             Modified:\n```\n{}\n```\n\n\
             1. Are all original security issues fixed?\n\
             2. Have any new security issues been introduced?\n\
             3. Are the fixes implemented securely?\n\n\
             Provide a detailed analysis focusing only on security aspects.",
            original_code, modified_code
        );
        Ok(self.inner.agent.run(&prompt).await?.content)
    }
}

impl std::ops::Deref for SecurityReviewAgent {
    type Target = ReviewAgent;

    fn deref(&self) -> &ReviewAgent {
        &self.inner
    }
}

/// Single agent covering security, performance and style in one pass
pub struct CodeReviewAgent {
    agent: Agent,
}

impl CodeReviewAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        let agent = Agent::builder(llm)
            .name("Code Review Agent")
            .description(
                "I am an expert code reviewer that analyzes code for security, performance, and style issues. \
                 I provide comprehensive feedback to help improve code quality.",
            )
            .system_prompt(
                "You are an expert code reviewer with deep knowledge in:\
                 \n1. Security: Identifying vulnerabilities and security best practices\
                 \n2. Performance: Detecting inefficiencies and optimization opportunities\
                 \n3. Style: Ensuring code follows best practices and is maintainable\
                 \n\nFor each code review, analyze all these aspects and provide clear, \
                 actionable feedback with specific recommendations.",
            )
            .build();
        Self { agent }
    }

    pub async fn review_code(&self, code: &str) -> Result<String> {
        let prompt = format!(
            "Please review this code comprehensively:\n\n```\n{}\n```\n\n\
             Analyze the following aspects:\n\n\
             1. Security:\n   - Check for vulnerabilities\n   - Identify security risks\n   - Suggest secure alternatives\n\n\
             2. Performance:\n   - Identify inefficiencies\n   - Analyze complexity\n   - Suggest optimizations\n\n\
             3. Style and Maintainability:\n   - Check style guide compliance\n   - Review naming and organization\n   - Assess documentation\n\n\
             Format your response as:\n\
             1. Critical Issues (if any)\n\
             2. Security Analysis\n\
             3. Performance Analysis\n\
             4. Style Analysis\n\
             5. Prioritized Recommendations",
            code
        );
        Ok(self.agent.run(&prompt).await?.content)
    }
}
