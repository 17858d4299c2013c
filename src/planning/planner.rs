// ABOUTME: ExecutionPlanner - pairs sub-tasks with selected agents.
// ABOUTME: Appends pending executions to the session and estimates total duration.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use tracing::{debug, warn};

use super::decomposer::{CollaborationType, TaskBreakdown};
use crate::agent::AgentSelector;
use crate::error::OrchestrationError;
use crate::execution::PerformanceTracker;
use crate::model::{Agent, AgentExecution, OrchestrationSession, SubTask};

/// A sub-task paired with the agent chosen to run it.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub sub_task: SubTask,
    pub agent_id: String,
    pub score: f64,
}

/// What the engine will run, in decomposition order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub session_id: String,
    pub collaboration_type: CollaborationType,
    pub assignments: Vec<Assignment>,
    /// Sub-tasks no agent qualified for. They are skipped, not failed.
    pub unassigned: Vec<SubTask>,
    pub estimated_duration: Duration,
}

/// Builds execution plans from task breakdowns.
#[derive(Clone)]
pub struct ExecutionPlanner {
    selector: AgentSelector,
    tracker: PerformanceTracker,
    default_duration: Duration,
}

impl ExecutionPlanner {
    /// Create a planner.
    ///
    /// `default_duration` is the estimate for agents with no execution history.
    pub fn new(tracker: PerformanceTracker, default_duration: Duration) -> Self {
        Self {
            selector: AgentSelector::new(tracker.initial_score()),
            tracker,
            default_duration,
        }
    }

    /// Select agents for each sub-task and record the assignments on the session.
    pub async fn plan(
        &self,
        breakdown: &TaskBreakdown,
        agents: &BTreeMap<String, Agent>,
        session: &mut OrchestrationSession,
    ) -> Result<ExecutionPlan, OrchestrationError> {
        let mut seen = HashSet::new();
        for sub_task in &breakdown.sub_tasks {
            if !seen.insert(sub_task.id.as_str()) {
                return Err(OrchestrationError::InvalidTask(format!(
                    "duplicate sub-task id '{}'",
                    sub_task.id
                )));
            }
        }

        debug!(
            session_id = %session.session_id,
            sub_tasks = breakdown.sub_tasks.len(),
            "creating execution plan"
        );

        let scores = self.tracker.scores().await;

        let mut plan = ExecutionPlan {
            session_id: session.session_id.clone(),
            collaboration_type: breakdown.collaboration_type,
            assignments: Vec::new(),
            unassigned: Vec::new(),
            estimated_duration: Duration::ZERO,
        };

        for sub_task in &breakdown.sub_tasks {
            let Some(selection) = self
                .selector
                .select(&sub_task.task_type, agents.values(), &scores)
            else {
                warn!(
                    session_id = %session.session_id,
                    sub_task_id = %sub_task.id,
                    task_type = %sub_task.task_type,
                    "no agent qualified for sub-task, skipping"
                );
                plan.unassigned.push(sub_task.clone());
                continue;
            };

            session
                .executions
                .push(AgentExecution::new(&selection.agent_id, &sub_task.id));
            session
                .collaboration_map
                .insert(sub_task.id.clone(), vec![selection.agent_id.clone()]);

            plan.estimated_duration += self.estimated_duration(&selection.agent_id).await;
            plan.assignments.push(Assignment {
                sub_task: sub_task.clone(),
                agent_id: selection.agent_id,
                score: selection.score,
            });
        }

        Ok(plan)
    }

    async fn estimated_duration(&self, agent_id: &str) -> Duration {
        self.tracker
            .average_duration(agent_id)
            .await
            .unwrap_or(self.default_duration)
    }
}
