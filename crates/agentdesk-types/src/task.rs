use serde::{Deserialize, Serialize};

/// Kind of implementation task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Feature,
    Bug,
    Enhancement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// Quality thresholds a task implementation is measured against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub code_review: u32,
    pub test_coverage: u32,
    pub security_score: u32,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            code_review: 85,
            test_coverage: 90,
            security_score: 95,
        }
    }
}

fn default_max_iterations() -> usize {
    5
}

/// Task definition handed to the code implementation agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub priority: TaskPriority,
    pub description: String,
    pub requirements: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub quality_thresholds: QualityThresholds,
}

/// Task execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub code: String,
    pub iterations: usize,
    pub final_goal: String,
    #[serde(default)]
    pub review_score: Option<f64>,
    #[serde(default)]
    pub test_coverage: Option<f64>,
    #[serde(default)]
    pub security_score: Option<f64>,
}
