// ABOUTME: Agent records - the pooled workers that sub-tasks are dispatched to.
// ABOUTME: Types and statuses are closed enums with snake_case wire names.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Specialization of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    CodeGeneration,
    Testing,
    Documentation,
    Analysis,
    Review,
    Deployment,
    Monitoring,
}

impl AgentType {
    /// The skill tag this type contributes when matching required skills.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::CodeGeneration => "code_generation",
            AgentType::Testing => "testing",
            AgentType::Documentation => "documentation",
            AgentType::Analysis => "analysis",
            AgentType::Review => "review",
            AgentType::Deployment => "deployment",
            AgentType::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
    Error,
}

/// A pooled agent that can take sub-tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,

    #[serde(rename = "type")]
    pub agent_type: AgentType,

    #[serde(default)]
    pub status: AgentStatus,

    /// Capability tags matched against a sub-task's required skills.
    #[serde(default)]
    pub capabilities: BTreeSet<String>,

    /// Opaque reference used by the execution backend to reach the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Agent {
    /// Create an active agent with no capabilities.
    pub fn new(id: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            id: id.into(),
            agent_type,
            status: AgentStatus::Active,
            capabilities: BTreeSet::new(),
            endpoint: None,
            display_name: None,
        }
    }

    /// Set the capability tags.
    pub fn capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Set the status.
    pub fn status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the endpoint reference.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the human-readable name.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}
