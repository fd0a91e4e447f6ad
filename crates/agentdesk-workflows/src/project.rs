//! Project-planning refinement loop.
//!
//! A requirements analyst seeds (or analyses) the requirements, then each
//! iteration runs supervisor → analyst → planner → QA over the documents in
//! the docs directory until QA reports `NO_GAPS_FOUND` or the iteration
//! budget runs out.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use agentdesk_agents::{Agent, AgentBuilder, AgentStorage, ListFilesTool, ReadFileTool, SaveFileTool};
use agentdesk_knowledge::{
    CombinedKnowledgeBase, KnowledgeBase, KnowledgeResult, KnowledgeSource, StoreBackend, TextReader, TextSource,
};
use agentdesk_llm_api::{Embedder, LlmClient};
use agentdesk_logging::{RunEntry, RunLogger};
use agentdesk_types::run::new_run_id;
use agentdesk_types::{RunEvent, RunResponse, GAP_MARKER, MAX_WORKFLOW_ITERATIONS, NO_GAPS_MARKER};

/// Table the combined project documents are loaded into
pub const PROJECT_TABLE: &str = "project_documents";

/// Documents created with their default content when missing
pub const REQUIRED_DOCS: [(&str, &str); 4] = [
    ("requirements/requirements.txt", "# Project Requirements\n\n"),
    ("requirements/risks.txt", "# Project Risks\n\n"),
    ("requirements/quality.txt", "# Quality Assessment\n\n"),
    (
        "tasks/README.txt",
        "# Project Tasks\n\nThis directory contains task lists organized by project phase.\n",
    ),
];

pub const INITIAL_REQUIREMENTS: &str = "requirements/initial_requirements.txt";

const SUPERVISOR_TASK: &str = "Review all documentation in the requirements and tasks directories. \
    Use the knowledge base to compare with previous iterations. \
    Identify gaps, inconsistencies, and areas needing improvement. \
    Create a status report in requirements/status.txt";

const REQUIREMENTS_TASK: &str = "Review and update requirements based on the latest analysis. \
    Use memory to maintain consistency with previous decisions. \
    Update requirements/requirements.txt";

const PLANNING_TASK: &str = "Review the requirements in requirements/requirements.txt to:\n\
    1. Identify the main project phases\n\
    2. For each phase, create or update '{phase}_tasks.txt' in the tasks directory\n\
    3. Ensure each task file includes:\n   \
    - Clear task descriptions\n   \
    - Priority levels\n   \
    - Dependencies\n   \
    - Estimated effort\n   \
    - Acceptance criteria\n\
    4. Remove any task files for phases no longer relevant";

const QA_TASK: &str = "Review all documentation and tasks. \
    Use memory to compare with previous quality assessments. \
    Verify quality and compliance. \
    Document findings in requirements/quality.txt";

/// QA verdict for one iteration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStatus {
    pub complete: bool,
    pub gaps: Vec<String>,
}

impl CompletionStatus {
    /// Scan QA output line by line for the completion marker and `GAP:` lines
    pub fn from_qa_output(output: &str) -> Self {
        let mut status = Self::default();
        for line in output.lines() {
            if line.contains(NO_GAPS_MARKER) {
                status.complete = true;
            } else if let Some((_, gap)) = line.split_once(GAP_MARKER) {
                let gap = gap.trim();
                if !gap.is_empty() {
                    status.gaps.push(gap.to_string());
                }
            }
        }
        status
    }

    pub fn to_json(&self) -> Value {
        json!({ "complete": self.complete, "gaps": self.gaps })
    }
}

/// One recorded iteration
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub input: Value,
    pub response: RunResponse,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowMemory {
    pub runs: Vec<WorkflowRun>,
}

impl WorkflowMemory {
    pub fn add_run(&mut self, run: WorkflowRun) {
        self.runs.push(run);
    }
}

/// Requirements and task documents as one knowledge base over `docs_dir`
pub fn project_knowledge(
    backend: &StoreBackend,
    embedder: Arc<dyn Embedder>,
    docs_dir: &Path,
) -> KnowledgeResult<KnowledgeBase> {
    let text_dir = |dir: &str| -> Arc<dyn KnowledgeSource> {
        Arc::new(TextSource {
            path: docs_dir.join(dir),
            reader: TextReader::new().with_formats(&[".txt"]),
        })
    };
    Ok(CombinedKnowledgeBase::new(
        vec![text_dir("requirements"), text_dir("tasks")],
        backend.open(PROJECT_TABLE)?,
        embedder,
    )
    .into_inner())
}

pub struct ProjectManagementWorkflow {
    docs_dir: PathBuf,
    planner: Agent,
    analyst: Agent,
    qa: Agent,
    supervisor: Agent,
    knowledge: Option<Arc<KnowledgeBase>>,
    memory: WorkflowMemory,
    run_logger: Option<Arc<Mutex<RunLogger>>>,
}

impl ProjectManagementWorkflow {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        docs_dir: PathBuf,
        knowledge: Option<Arc<KnowledgeBase>>,
        storage: Option<Arc<dyn AgentStorage>>,
    ) -> Self {
        let project_agent = |name: &str, role: &str, session: &str, file_writer: bool| {
            let mut builder = Agent::builder(llm.clone())
                .name(name)
                .role(role)
                .work_dir(docs_dir.clone())
                .tool(ReadFileTool)
                .tool(ListFilesTool)
                .show_tool_calls(true)
                .markdown(true);
            if file_writer {
                builder = builder.tool(SaveFileTool);
            }
            if let Some(knowledge) = &knowledge {
                builder = builder.knowledge(knowledge.clone()).search_knowledge(true);
            }
            if let Some(storage) = &storage {
                builder = builder.storage(storage.clone()).session_id(session);
            }
            builder
        };
        let build = |builder: AgentBuilder, instructions: &[&str]| {
            builder.instructions(instructions.iter().copied()).build()
        };

        let planner = build(
            project_agent(
                "Project Planner",
                "Strategic project planning and task management specialist",
                "project_planner",
                true,
            ),
            &[
                "Create and maintain project documentation",
                "Break down high-level objectives into actionable tasks:",
                "1. First analyze requirements from requirements/requirements.txt",
                "2. For each identified phase, create a task file in tasks/ directory",
                "3. Task files should be named: tasks/{phase}_tasks.txt",
                "For each task list, include:",
                "  - Clear task descriptions",
                "  - Priority levels",
                "  - Dependencies",
                "  - Estimated effort",
                "  - Acceptance criteria",
                "Use the knowledge base to maintain context across iterations",
                "Store important decisions and context in memory",
            ],
        );
        let analyst = build(
            project_agent(
                "Requirements Analyst",
                "Project requirements and risk analysis specialist",
                "requirements_analyst",
                true,
            ),
            &[
                "Review and analyze project requirements",
                "Document requirements in requirements/requirements.txt",
                "Identify and document potential risks in requirements/risks.txt",
                "Ensure requirements are SMART",
                "Maintain a risk register and mitigation strategies",
                "Use the knowledge base to maintain context",
                "Store analysis results and decisions in memory",
            ],
        );
        let qa = build(
            project_agent(
                "Quality Assurance",
                "Project quality and compliance specialist",
                "quality_assurance",
                true,
            ),
            &[
                "Review all project documentation for quality",
                "Validate requirements against best practices",
                "Create and maintain quality metrics",
                "Document quality findings in requirements/quality.txt",
                "Use the knowledge base for consistent evaluation",
                "Store quality assessment results in memory",
                "When the documentation has no remaining gaps, reply with NO_GAPS_FOUND",
                "Otherwise list each remaining gap on its own line starting with GAP:",
            ],
        );
        let supervisor = build(
            project_agent(
                "Project Supervisor",
                "Project orchestration and oversight specialist",
                "project_supervisor",
                true,
            ),
            &[
                "Coordinate the project management process",
                "Monitor all documentation in requirements/ and tasks/ directories",
                "Assign specific tasks to each team member: the Project Planner, the Requirements Analyst and Quality Assurance",
                "Monitor progress and ensure quality",
                "Identify gaps and delegate work to appropriate agents",
                "Use team memory and knowledge base for decision making",
                "Store coordination decisions and progress in memory",
            ],
        );

        Self {
            docs_dir,
            planner,
            analyst,
            qa,
            supervisor,
            knowledge,
            memory: WorkflowMemory::default(),
            run_logger: None,
        }
    }

    /// Append every agent answer to a JSONL run log
    pub fn with_run_logger(mut self, logger: Arc<Mutex<RunLogger>>) -> Self {
        self.run_logger = Some(logger);
        self
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    pub fn memory(&self) -> &WorkflowMemory {
        &self.memory
    }

    /// Create `requirements/`, `tasks/` and any missing required document
    pub async fn initialize_docs(&self) -> Result<()> {
        for dir in ["requirements", "tasks"] {
            let path = self.docs_dir.join(dir);
            tokio::fs::create_dir_all(&path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
        }
        for (file, default_content) in REQUIRED_DOCS {
            let path = self.docs_dir.join(file);
            if !tokio::fs::try_exists(&path).await? {
                tokio::fs::write(&path, default_content)
                    .await
                    .with_context(|| format!("Failed to create {}", path.display()))?;
            }
        }
        Ok(())
    }

    async fn reload_knowledge(&self) -> Result<()> {
        if let Some(knowledge) = &self.knowledge {
            let written = knowledge
                .load(false, true)
                .await
                .context("Failed to load project documents")?;
            log::debug!("{} project document chunks written", written);
        }
        Ok(())
    }

    async fn step(&self, agent: &Agent, run_id: &str, task: &str) -> Result<String> {
        let content = agent
            .run(task)
            .await
            .with_context(|| format!("{} failed", agent.name()))?
            .content;
        println!("{}", content);

        if let Some(logger) = &self.run_logger {
            let entry = RunEntry::new("assistant", &content)
                .model(agent.model())
                .from_agent(agent.name(), run_id);
            logger.lock().await.append(&entry).await;
        }
        Ok(content)
    }

    async fn initial_requirements(&self) -> Option<String> {
        let content = tokio::fs::read_to_string(self.docs_dir.join(INITIAL_REQUIREMENTS))
            .await
            .ok()?;
        (!content.trim().is_empty()).then_some(content)
    }

    async fn setup(&self, run_id: &str) -> Result<()> {
        self.initialize_docs().await?;
        self.reload_knowledge().await?;

        if self.initial_requirements().await.is_some() {
            println!("\n{}", "Found existing initial requirements. Analyzing...".cyan());
            let task = format!(
                "Read and analyze the existing requirements in {}. \
                 Use this as a basis for further refinement.",
                INITIAL_REQUIREMENTS
            );
            self.step(&self.analyst, run_id, &task).await?;
        } else {
            println!("\n{}", "Initializing project setup...".cyan());
            self.step(
                &self.analyst,
                run_id,
                "Create initial project requirements document in requirements/requirements.txt. \
                 Include sections for objectives, scope, and success criteria.",
            )
            .await?;
        }
        Ok(())
    }

    async fn iterate(&self, run_id: &str) -> Result<CompletionStatus> {
        println!("\n{}", "Analyzing current project state...".yellow());
        self.step(&self.supervisor, run_id, SUPERVISOR_TASK).await?;

        println!("\n{}", "Updating requirements...".yellow());
        self.step(&self.analyst, run_id, REQUIREMENTS_TASK).await?;

        println!("\n{}", "Updating task lists by project phase...".yellow());
        self.step(&self.planner, run_id, PLANNING_TASK).await?;

        println!("\n{}", "Performing quality check...".yellow());
        let qa_output = self.step(&self.qa, run_id, QA_TASK).await?;
        Ok(CompletionStatus::from_qa_output(&qa_output))
    }

    /// Run at most `max_iterations` refinement iterations (capped at 20).
    ///
    /// The returned response is `WorkflowComplete` with `total_iterations`
    /// and `completion_status` metrics, or `WorkflowError` when setup fails.
    /// `total_iterations` is the number of iterations actually run, so a QA
    /// pass that completes in the first iteration reports 1. The per-iteration
    /// records in memory keep the 0-based index.
    pub async fn run(&mut self, max_iterations: usize) -> RunResponse {
        let run_id = new_run_id();
        let max_iterations = max_iterations.min(MAX_WORKFLOW_ITERATIONS);

        if let Err(e) = self.setup(&run_id).await {
            println!("\n{} {:#}", "Critical workflow error:".red().bold(), e);
            log::error!("project workflow setup failed: {:#}", e);
            return RunResponse::new(&run_id, format!("Workflow failed: {:#}", e))
                .with_event(RunEvent::WorkflowError)
                .with_metric("error", format!("{:#}", e))
                .with_metric("iteration", 0);
        }

        let mut status = CompletionStatus::default();
        let mut iteration = 0;
        while iteration < max_iterations {
            println!(
                "\n{}",
                format!(
                    "Iteration {}/{}: Refining project documentation and tasks...",
                    iteration + 1,
                    max_iterations
                )
                .cyan()
                .bold()
            );

            let outcome = self.iterate(&run_id).await;
            iteration += 1;

            match outcome {
                Ok(iteration_status) => {
                    status = iteration_status;
                    self.memory.add_run(WorkflowRun {
                        input: json!({ "iteration": iteration - 1 }),
                        response: RunResponse::new(&run_id, format!("Iteration {} completed", iteration - 1))
                            .with_event(RunEvent::IterationComplete)
                            .with_metric("completion_status", status.to_json())
                            .with_metric("timestamp", chrono::Local::now().to_rfc3339()),
                    });

                    if status.complete {
                        println!(
                            "\n{}",
                            "Project planning is complete! All documentation meets quality standards."
                                .green()
                                .bold()
                        );
                        break;
                    }
                    if !status.gaps.is_empty() {
                        println!("\n{}", "Identified gaps to address:".yellow());
                        for gap in &status.gaps {
                            println!("- {}", gap);
                        }
                    }
                    if let Err(e) = self.reload_knowledge().await {
                        log::warn!("Error during iteration {}: {:#}", iteration, e);
                    }
                }
                Err(e) => {
                    println!("\n{} {:#}", format!("Error during iteration {}:", iteration).red(), e);
                    println!("Attempting to continue with next iteration...");
                    log::warn!("project iteration {} failed: {:#}", iteration, e);
                }
            }
        }

        if !status.complete && iteration == max_iterations {
            println!(
                "\n{}",
                "Maximum iterations reached. Please review the current state and adjust if needed.".yellow()
            );
        }

        RunResponse::new(&run_id, "Workflow completed")
            .with_event(RunEvent::WorkflowComplete)
            .with_metric("total_iterations", iteration)
            .with_metric("completion_status", status.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_completion_status_parsing() {
        let status = CompletionStatus::from_qa_output(
            "Quality review:\nGAP: risks lack owners\n- GAP:  no acceptance criteria for phase 2\nGAP:\n",
        );
        assert_eq!(
            status,
            CompletionStatus {
                complete: false,
                gaps: vec!["risks lack owners".to_string(), "no acceptance criteria for phase 2".to_string()],
            }
        );

        let done = CompletionStatus::from_qa_output("All good.\nNO_GAPS_FOUND");
        assert!(done.complete);
        assert!(done.gaps.is_empty());
        assert_eq!(done.to_json(), json!({"complete": true, "gaps": []}));
    }

    #[tokio::test]
    async fn test_initialize_docs_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("requirements")).unwrap();
        std::fs::write(dir.path().join("requirements/requirements.txt"), "# Mine\n").unwrap();

        let llm = Arc::new(agentdesk_llm_api::testing::ScriptedLlmClient::new());
        let workflow = ProjectManagementWorkflow::new(llm, dir.path().to_path_buf(), None, None);
        workflow.initialize_docs().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("requirements/requirements.txt")).unwrap(),
            "# Mine\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("requirements/risks.txt")).unwrap(),
            "# Project Risks\n\n"
        );
        assert!(dir.path().join("tasks/README.txt").exists());
    }
}
