// ABOUTME: PerformanceTracker - per-agent rolling score and duration history.
// ABOUTME: Scores move +0.05 on completion and -0.1 on failure, clamped to [0, 1].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::model::{AgentExecution, ExecutionStatus};

const COMPLETION_REWARD: f64 = 0.05;
const FAILURE_PENALTY: f64 = 0.1;

#[derive(Default)]
struct TrackerState {
    scores: HashMap<String, f64>,
    durations: HashMap<String, DurationStats>,
}

#[derive(Default, Clone, Copy)]
struct DurationStats {
    total: Duration,
    count: u32,
}

/// Shared per-agent performance record.
///
/// Cloning yields a handle to the same underlying state.
#[derive(Clone)]
pub struct PerformanceTracker {
    state: Arc<RwLock<TrackerState>>,
    initial_score: f64,
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl PerformanceTracker {
    /// Create a tracker where unseen agents start at `initial_score`.
    pub fn new(initial_score: f64) -> Self {
        Self {
            state: Arc::new(RwLock::new(TrackerState::default())),
            initial_score: initial_score.clamp(0.0, 1.0),
        }
    }

    pub fn initial_score(&self) -> f64 {
        self.initial_score
    }

    /// Current score for an agent.
    pub async fn score(&self, agent_id: &str) -> f64 {
        let state = self.state.read().await;
        state
            .scores
            .get(agent_id)
            .copied()
            .unwrap_or(self.initial_score)
    }

    /// Copy of every recorded score.
    pub async fn scores(&self) -> HashMap<String, f64> {
        self.state.read().await.scores.clone()
    }

    /// Fold a terminal execution into the agent's record.
    ///
    /// Non-terminal executions are ignored. Returns the new score when one
    /// was written.
    pub async fn record(&self, execution: &AgentExecution) -> Option<f64> {
        let delta = match execution.status {
            ExecutionStatus::Completed => COMPLETION_REWARD,
            ExecutionStatus::Failed => -FAILURE_PENALTY,
            ExecutionStatus::Pending | ExecutionStatus::InProgress => return None,
        };

        let mut state = self.state.write().await;

        let current = state
            .scores
            .get(&execution.agent_id)
            .copied()
            .unwrap_or(self.initial_score);
        let updated = (current + delta).clamp(0.0, 1.0);
        state.scores.insert(execution.agent_id.clone(), updated);

        if let Some(elapsed) = execution.duration().and_then(|d| d.to_std().ok()) {
            let stats = state
                .durations
                .entry(execution.agent_id.clone())
                .or_default();
            stats.total += elapsed;
            stats.count += 1;
        }

        debug!(
            agent_id = %execution.agent_id,
            status = %execution.status,
            score = updated,
            "updated agent performance"
        );
        Some(updated)
    }

    /// Mean duration of the agent's recorded executions.
    pub async fn average_duration(&self, agent_id: &str) -> Option<Duration> {
        let state = self.state.read().await;
        state
            .durations
            .get(agent_id)
            .filter(|s| s.count > 0)
            .map(|s| s.total / s.count)
    }
}
