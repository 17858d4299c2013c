// ABOUTME: Orchestration sessions and the agent executions they own.
// ABOUTME: Execution status moves pending -> in_progress -> completed | failed.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ExecutionError;

/// State of a single agent execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::InProgress => "in_progress",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One agent working one sub-task inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExecution {
    pub agent_id: String,
    pub sub_task_id: String,
    pub status: ExecutionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: Option<Map<String, Value>>,
    pub error: Option<String>,
    pub metrics: Map<String, Value>,
}

impl AgentExecution {
    /// Create a pending execution.
    pub fn new(agent_id: impl Into<String>, sub_task_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            sub_task_id: sub_task_id.into(),
            status: ExecutionStatus::Pending,
            start_time: None,
            end_time: None,
            result: None,
            error: None,
            metrics: Map::new(),
        }
    }

    /// Move to in-progress and stamp the start time.
    pub fn begin(&mut self) -> Result<(), ExecutionError> {
        self.transition(ExecutionStatus::Pending, ExecutionStatus::InProgress)?;
        self.start_time = Some(Utc::now());
        Ok(())
    }

    /// Move to completed with the agent's result payload.
    pub fn complete(&mut self, result: Map<String, Value>) -> Result<(), ExecutionError> {
        self.transition(ExecutionStatus::InProgress, ExecutionStatus::Completed)?;
        self.end_time = Some(Utc::now());
        self.result = Some(result);
        self.record_duration();
        Ok(())
    }

    /// Move to failed with captured error text.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), ExecutionError> {
        self.transition(ExecutionStatus::InProgress, ExecutionStatus::Failed)?;
        self.end_time = Some(Utc::now());
        self.error = Some(error.into());
        self.record_duration();
        Ok(())
    }

    /// Elapsed time, defined only once both timestamps are set.
    pub fn duration(&self) -> Option<TimeDelta> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    fn transition(
        &mut self,
        expected: ExecutionStatus,
        next: ExecutionStatus,
    ) -> Result<(), ExecutionError> {
        if self.status != expected {
            return Err(ExecutionError::InvalidTransition {
                sub_task_id: self.sub_task_id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    fn record_duration(&mut self) {
        if let Some(duration) = self.duration() {
            let millis = duration.num_milliseconds();
            self.metrics
                .insert("duration_ms".into(), Value::from(millis));
        }
    }
}

/// Lifecycle state of an orchestration session.
///
/// `Active` and `Cancelled` are part of the record format but no code path
/// currently produces them: a session stays `Pending` until the engine
/// returns, and there is no cancel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    /// Whether the session has finished and is eligible for eviction.
    pub fn is_finished(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

/// Bookkeeping for one orchestration attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationSession {
    pub session_id: String,
    pub root_task_id: String,
    pub status: SessionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub executions: Vec<AgentExecution>,
    /// Sub-task id to the agent ids assigned to it.
    pub collaboration_map: BTreeMap<String, Vec<String>>,
    pub metrics: Map<String, Value>,
    pub context_snapshot: Map<String, Value>,
}

impl OrchestrationSession {
    /// Start a new pending session with a fresh id.
    pub fn new(root_task_id: impl Into<String>, context_snapshot: Map<String, Value>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            root_task_id: root_task_id.into(),
            status: SessionStatus::Pending,
            start_time: Some(Utc::now()),
            end_time: None,
            executions: Vec::new(),
            collaboration_map: BTreeMap::new(),
            metrics: Map::new(),
            context_snapshot,
        }
    }

    pub fn mark_completed(&mut self) {
        self.finish(SessionStatus::Completed);
    }

    pub fn mark_failed(&mut self) {
        self.finish(SessionStatus::Failed);
    }

    fn finish(&mut self, status: SessionStatus) {
        self.status = status;
        self.end_time = Some(Utc::now());
    }

    pub fn total_duration(&self) -> Option<TimeDelta> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Find the execution for a sub-task.
    pub fn execution(&self, sub_task_id: &str) -> Option<&AgentExecution> {
        self.executions
            .iter()
            .find(|e| e.sub_task_id == sub_task_id)
    }

    pub fn executions_with(&self, status: ExecutionStatus) -> Vec<&AgentExecution> {
        self.executions
            .iter()
            .filter(|e| e.status == status)
            .collect()
    }

    pub fn active_executions(&self) -> Vec<&AgentExecution> {
        self.executions_with(ExecutionStatus::InProgress)
    }

    pub fn completed_executions(&self) -> Vec<&AgentExecution> {
        self.executions_with(ExecutionStatus::Completed)
    }

    pub fn failed_executions(&self) -> Vec<&AgentExecution> {
        self.executions_with(ExecutionStatus::Failed)
    }

    /// Fraction of executions that completed, `None` when nothing was planned.
    pub fn success_rate(&self) -> Option<f64> {
        if self.executions.is_empty() {
            return None;
        }
        Some(self.completed_executions().len() as f64 / self.executions.len() as f64)
    }
}
