use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event attached to a workflow or agent response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    RunResponse,
    IterationComplete,
    WorkflowComplete,
    WorkflowError,
}

impl RunEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunEvent::RunResponse => "run_response",
            RunEvent::IterationComplete => "IterationComplete",
            RunEvent::WorkflowComplete => "WorkflowComplete",
            RunEvent::WorkflowError => "WorkflowError",
        }
    }
}

/// Output of one agent run or one workflow step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub run_id: String,
    pub event: RunEvent,
    pub content: String,
    #[serde(default)]
    pub metrics: HashMap<String, serde_json::Value>,
}

impl RunResponse {
    pub fn new(run_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            event: RunEvent::RunResponse,
            content: content.into(),
            metrics: HashMap::new(),
        }
    }

    pub fn with_event(mut self, event: RunEvent) -> Self {
        self.event = event;
        self
    }

    pub fn with_metric(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metrics.insert(key.to_string(), value.into());
        self
    }
}

/// Fresh run identifier
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
