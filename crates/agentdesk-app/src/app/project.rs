use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use agentdesk_logging::RunLogger;
use agentdesk_types::{QualityThresholds, RunEvent, TaskDefinition, TaskPriority, TaskType};
use agentdesk_workflows::project::project_knowledge;
use agentdesk_workflows::{CodeAgent, ProjectManagementWorkflow};

use crate::app::AppContext;

/// Read a task file, or describe an inline task from the command line
pub async fn load_task(
    task_file: Option<&Path>,
    description: Option<String>,
    requirements: Vec<String>,
) -> Result<TaskDefinition> {
    if let Some(path) = task_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&text).with_context(|| format!("Invalid task definition in {}", path.display()));
    }

    let Some(description) = description else {
        bail!("Provide --task-file or --description");
    };
    Ok(TaskDefinition {
        id: "TASK-CLI".to_string(),
        task_type: TaskType::Feature,
        priority: TaskPriority::Medium,
        description,
        requirements,
        acceptance_criteria: Vec::new(),
        dependencies: None,
        max_iterations: 5,
        quality_thresholds: QualityThresholds::default(),
    })
}

pub async fn run_implement(
    ctx: &AppContext,
    task_file: Option<PathBuf>,
    description: Option<String>,
    requirements: Vec<String>,
    max_iterations: Option<usize>,
) -> Result<()> {
    let mut task = load_task(task_file.as_deref(), description, requirements).await?;
    if let Some(max_iterations) = max_iterations {
        task.max_iterations = max_iterations;
    }

    println!(
        "{}",
        format!(
            "🛠️  Implementing {} ({} iterations)",
            task.id,
            CodeAgent::iteration_count(&task)
        )
        .bright_cyan()
        .bold()
    );
    let agent = CodeAgent::new(ctx.llm.clone(), None, Some(ctx.storage.clone()));
    let result = agent.implement_task(&task).await?;

    println!(
        "\n{}",
        format!("✅ Finished after {} iterations (last goal: {})", result.iterations, result.final_goal).green()
    );
    println!("\n{}", result.code);
    Ok(())
}

pub async fn run_plan(ctx: &AppContext, max_iterations: usize, docs_dir: Option<PathBuf>) -> Result<()> {
    let docs_dir = docs_dir.unwrap_or_else(|| ctx.settings.docs_dir.clone());
    let knowledge = project_knowledge(&ctx.backend, ctx.embedder.clone(), &docs_dir)?;

    let workspace = std::env::current_dir().context("Failed to read the current directory")?;
    let logger = Arc::new(Mutex::new(RunLogger::new(&workspace, "plan").await?));

    let mut workflow = ProjectManagementWorkflow::new(
        ctx.llm.clone(),
        docs_dir.clone(),
        Some(Arc::new(knowledge)),
        Some(ctx.storage.clone()),
    )
    .with_run_logger(logger.clone());

    println!(
        "{}",
        format!("📋 Planning project in {} (up to {} iterations)", docs_dir.display(), max_iterations)
            .bright_cyan()
            .bold()
    );
    let response = workflow.run(max_iterations).await;

    {
        let mut logger = logger.lock().await;
        println!("{}", format!("Run log: {}", logger.path().display()).bright_black());
        logger.shutdown().await;
    }

    match response.event {
        RunEvent::WorkflowError => bail!("{}", response.content),
        _ => {
            println!("\n{}", response.content.green().bold());
            let mut metrics: Vec<_> = response.metrics.iter().collect();
            metrics.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in metrics {
                println!("  {}: {}", key, value);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_inline_task() {
        let task = load_task(None, Some("Parse CSV input".to_string()), vec!["Handle quoted fields".to_string()])
            .await
            .unwrap();
        assert_eq!(task.id, "TASK-CLI");
        assert_eq!(task.requirements, vec!["Handle quoted fields".to_string()]);
        assert_eq!(task.max_iterations, 5);
    }

    #[tokio::test]
    async fn test_task_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.json");
        tokio::fs::write(
            &path,
            r#"{"id": "TASK-001", "type": "bug", "priority": "high",
                "description": "Fix overflow", "requirements": [], "acceptance_criteria": ["No panic"]}"#,
        )
        .await
        .unwrap();

        let task = load_task(Some(&path), None, Vec::new()).await.unwrap();
        assert_eq!(task.id, "TASK-001");
        assert_eq!(task.task_type, TaskType::Bug);
    }

    #[tokio::test]
    async fn test_task_requires_a_source() {
        assert!(load_task(None, None, Vec::new()).await.is_err());
    }
}
