// ABOUTME: AgentSource - where the coordinator loads its agent pool from.
// ABOUTME: Ships a static in-memory source and a JSON file source.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::model::Agent;

/// Supplies agent records to the coordinator's pool.
#[async_trait]
pub trait AgentSource: Send + Sync {
    /// Load the full set of agents. Called at startup and on reload.
    async fn load_agents(&self) -> Result<Vec<Agent>, anyhow::Error>;
}

/// A fixed list of agents held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticAgentSource {
    agents: Vec<Agent>,
}

impl StaticAgentSource {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }
}

#[async_trait]
impl AgentSource for StaticAgentSource {
    async fn load_agents(&self) -> Result<Vec<Agent>, anyhow::Error> {
        Ok(self.agents.clone())
    }
}

/// Agents read from a JSON array on disk, re-read on every load.
#[derive(Debug, Clone)]
pub struct JsonFileAgentSource {
    path: PathBuf,
}

impl JsonFileAgentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AgentSource for JsonFileAgentSource {
    async fn load_agents(&self) -> Result<Vec<Agent>, anyhow::Error> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            anyhow::anyhow!("failed to read agent file {}: {}", self.path.display(), e)
        })?;
        let agents: Vec<Agent> = serde_json::from_str(&contents)?;
        Ok(agents)
    }
}
