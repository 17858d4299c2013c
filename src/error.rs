// ABOUTME: Defines all error types for the ensemble library using thiserror.
// ABOUTME: Execution state errors are unified under OrchestrationError.

use std::time::Duration;

use crate::model::ExecutionStatus;

/// Top-level error type for the ensemble library.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Agent source error: {0}")]
    AgentSource(#[source] anyhow::Error),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Dispatch to agent '{agent_id}' failed: {source}")]
    Dispatch {
        agent_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Agent '{agent_id}' timed out after {limit:?}")]
    Timeout { agent_id: String, limit: Duration },

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the agent execution state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Illegal transition for sub-task {sub_task_id}: {from} -> {to}")]
    InvalidTransition {
        sub_task_id: String,
        from: ExecutionStatus,
        to: ExecutionStatus,
    },
}

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
