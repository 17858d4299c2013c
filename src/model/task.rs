// ABOUTME: Root task requests and the sub-tasks they decompose into.
// ABOUTME: Sub-tasks are immutable once created by the decomposer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A root task submitted for orchestration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    /// Caller's estimate. Treated as 1 hour when absent.
    #[serde(default)]
    pub estimated_hours: Option<f64>,

    /// Free-form task category, copied into the session context snapshot.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
}

impl TaskRequest {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Set the requirement list.
    pub fn requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    /// Set the estimated effort in hours.
    pub fn estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    /// Set the task category.
    pub fn task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }
}

/// Priority of a sub-task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Kind of work a sub-task represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTaskType {
    Analysis,
    Implementation,
    Validation,
    CodeGeneration,
    Testing,
    Documentation,
    /// Any tag not produced by the built-in templates.
    #[serde(untagged)]
    Other(String),
}

impl SubTaskType {
    pub fn as_str(&self) -> &str {
        match self {
            SubTaskType::Analysis => "analysis",
            SubTaskType::Implementation => "implementation",
            SubTaskType::Validation => "validation",
            SubTaskType::CodeGeneration => "code_generation",
            SubTaskType::Testing => "testing",
            SubTaskType::Documentation => "documentation",
            SubTaskType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for SubTaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomic unit of work produced by decomposing a root task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: String,
    pub parent_id: String,
    #[serde(rename = "type")]
    pub task_type: SubTaskType,
    pub description: String,
    pub priority: Priority,
}
