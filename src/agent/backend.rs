// ABOUTME: AgentBackend - the seam between orchestration and real agent logic.
// ABOUTME: AgentOutput carries the success flag plus opaque domain fields.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{Agent, AgentStatus, AgentType, SubTask};

/// What an agent returned for one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub success: bool,

    /// Domain fields, opaque to the orchestrator.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AgentOutput {
    /// A successful output with no fields.
    pub fn success() -> Self {
        Self {
            success: true,
            fields: Map::new(),
        }
    }

    /// A failed output carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("error".into(), Value::String(error.into()));
        Self {
            success: false,
            fields,
        }
    }

    /// Add a domain field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Flatten into a single JSON object including `success`.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.fields.clone();
        map.insert("success".into(), Value::Bool(self.success));
        map
    }

    pub fn error(&self) -> Option<&str> {
        self.fields.get("error").and_then(|v| v.as_str())
    }
}

/// Executes sub-tasks on agents.
///
/// Called once per assignment, without retry. The pipeline strategy passes
/// the previous stage's output as `context`.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Run one sub-task on one agent.
    async fn execute(
        &self,
        agent: &Agent,
        sub_task: &SubTask,
        context: Option<&AgentOutput>,
    ) -> Result<AgentOutput, anyhow::Error>;

    /// Probe an agent and report its status.
    ///
    /// The default reports the status already on record.
    async fn ping(&self, agent: &Agent) -> Result<AgentStatus, anyhow::Error> {
        Ok(agent.status)
    }
}

/// A backend that answers every dispatch with a canned per-type result.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedBackend;

#[async_trait]
impl AgentBackend for SimulatedBackend {
    async fn execute(
        &self,
        agent: &Agent,
        sub_task: &SubTask,
        context: Option<&AgentOutput>,
    ) -> Result<AgentOutput, anyhow::Error> {
        let output = match agent.agent_type {
            AgentType::CodeGeneration => AgentOutput::success()
                .with("task_type", "code_generation")
                .with("artifacts", Value::Array(Vec::new())),
            AgentType::Testing => AgentOutput::success()
                .with("task_type", "testing")
                .with("coverage", 0.85),
            AgentType::Documentation => AgentOutput::success()
                .with("task_type", "documentation")
                .with("path", "/docs/README.md"),
            _ => AgentOutput::success().with("task_type", "generic"),
        };

        Ok(output
            .with("sub_task_id", sub_task.id.clone())
            .with("context_received", context.is_some()))
    }
}
