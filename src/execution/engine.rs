// ABOUTME: ExecutionEngine - runs a plan under its collaboration strategy.
// ABOUTME: Drives each execution through its state machine and feeds the tracker.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::performance::PerformanceTracker;
use crate::agent::{AgentBackend, AgentOutput};
use crate::error::OrchestrationError;
use crate::model::{Agent, AgentExecution, OrchestrationSession, SubTask};
use crate::planning::{Assignment, CollaborationType, ExecutionPlan};

/// Output of one dispatched assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub sub_task_id: String,
    pub agent_id: String,
    pub output: AgentOutput,
}

/// Everything the engine dispatched, in plan order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub collaboration_type: CollaborationType,
    pub results: Vec<StageResult>,
}

impl ExecutionReport {
    /// Results keyed by sub-task id.
    pub fn result_map(&self) -> Map<String, Value> {
        self.results
            .iter()
            .map(|r| {
                let mut output = r.output.to_map();
                output.insert("agent_id".into(), Value::String(r.agent_id.clone()));
                (r.sub_task_id.clone(), Value::Object(output))
            })
            .collect()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.output.success).count()
    }
}

/// Runs execution plans against an agent backend.
#[derive(Clone)]
pub struct ExecutionEngine {
    backend: Arc<dyn AgentBackend>,
    tracker: PerformanceTracker,
    timeout: Option<Duration>,
    max_concurrency: usize,
}

impl ExecutionEngine {
    /// Create an engine with no dispatch deadline and a concurrency bound of 10.
    pub fn new(backend: Arc<dyn AgentBackend>, tracker: PerformanceTracker) -> Self {
        Self {
            backend,
            tracker,
            timeout: None,
            max_concurrency: 10,
        }
    }

    /// Set the per-dispatch deadline.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound the number of concurrent dispatches in the parallel strategy.
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Run the plan, updating the session's executions in place.
    pub async fn execute(
        &self,
        plan: &ExecutionPlan,
        agents: &BTreeMap<String, Agent>,
        session: &mut OrchestrationSession,
    ) -> Result<ExecutionReport, OrchestrationError> {
        info!(
            session_id = %plan.session_id,
            strategy = %plan.collaboration_type,
            assignments = plan.assignments.len(),
            "executing plan"
        );

        let stages = pair_executions(plan, session);

        let results = match plan.collaboration_type {
            CollaborationType::Sequential | CollaborationType::Hierarchical => {
                self.run_sequential(stages, agents).await?
            }
            CollaborationType::Parallel => self.run_parallel(stages, agents).await?,
            CollaborationType::Pipeline => self.run_pipeline(stages, agents).await?,
        };

        Ok(ExecutionReport {
            collaboration_type: plan.collaboration_type,
            results,
        })
    }

    /// Stops after the first unsuccessful stage; later executions stay pending.
    async fn run_sequential(
        &self,
        stages: Vec<(&Assignment, &mut AgentExecution)>,
        agents: &BTreeMap<String, Agent>,
    ) -> Result<Vec<StageResult>, OrchestrationError> {
        let mut results = Vec::with_capacity(stages.len());

        for (assignment, execution) in stages {
            let agent = agents.get(&assignment.agent_id);
            let result = self.run_stage(assignment, agent, execution, None).await?;
            let succeeded = result.output.success;
            results.push(result);

            if !succeeded {
                warn!(
                    sub_task_id = %assignment.sub_task.id,
                    "stage unsuccessful, abandoning remaining sub-tasks"
                );
                break;
            }
        }

        Ok(results)
    }

    /// Dispatches everything concurrently; a failure never cancels siblings.
    async fn run_parallel(
        &self,
        stages: Vec<(&Assignment, &mut AgentExecution)>,
        agents: &BTreeMap<String, Agent>,
    ) -> Result<Vec<StageResult>, OrchestrationError> {
        let mut dispatches = Vec::with_capacity(stages.len());
        for (assignment, execution) in stages {
            let agent = agents.get(&assignment.agent_id);
            dispatches.push(self.run_stage(assignment, agent, execution, None));
        }

        stream::iter(dispatches)
            .buffered(self.max_concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }

    /// Each stage sees the previous stage's output, successful or not.
    async fn run_pipeline(
        &self,
        stages: Vec<(&Assignment, &mut AgentExecution)>,
        agents: &BTreeMap<String, Agent>,
    ) -> Result<Vec<StageResult>, OrchestrationError> {
        let mut results: Vec<StageResult> = Vec::with_capacity(stages.len());

        for (assignment, execution) in stages {
            let agent = agents.get(&assignment.agent_id);
            let previous = results.last().map(|r| &r.output);
            let result = self
                .run_stage(assignment, agent, execution, previous)
                .await?;
            results.push(result);
        }

        Ok(results)
    }

    /// Drive one execution from pending to a terminal state.
    async fn run_stage(
        &self,
        assignment: &Assignment,
        agent: Option<&Agent>,
        execution: &mut AgentExecution,
        context: Option<&AgentOutput>,
    ) -> Result<StageResult, OrchestrationError> {
        info!(
            sub_task_id = %assignment.sub_task.id,
            agent_id = %assignment.agent_id,
            "dispatching sub-task"
        );

        execution.begin()?;

        let outcome = match agent {
            Some(agent) => self.dispatch(agent, &assignment.sub_task, context).await,
            None => Err(OrchestrationError::AgentNotFound(
                assignment.agent_id.clone(),
            )),
        };

        let output = match outcome {
            Ok(output) if output.success => {
                execution.complete(output.to_map())?;
                output
            }
            Ok(output) => {
                let message = output
                    .error()
                    .unwrap_or("agent reported an unsuccessful result")
                    .to_string();
                execution.result = Some(output.to_map());
                execution.fail(message)?;
                output
            }
            Err(e) => {
                let message = e.to_string();
                warn!(
                    sub_task_id = %assignment.sub_task.id,
                    agent_id = %assignment.agent_id,
                    error = %message,
                    "sub-task execution failed"
                );
                execution.fail(message.clone())?;
                AgentOutput::failure(message)
            }
        };

        self.tracker.record(execution).await;

        Ok(StageResult {
            sub_task_id: assignment.sub_task.id.clone(),
            agent_id: assignment.agent_id.clone(),
            output,
        })
    }

    async fn dispatch(
        &self,
        agent: &Agent,
        sub_task: &SubTask,
        context: Option<&AgentOutput>,
    ) -> Result<AgentOutput, OrchestrationError> {
        let call = self.backend.execute(agent, sub_task, context);

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                OrchestrationError::Timeout {
                    agent_id: agent.id.clone(),
                    limit,
                }
            })?,
            None => call.await,
        };

        result.map_err(|source| OrchestrationError::Dispatch {
            agent_id: agent.id.clone(),
            source,
        })
    }
}

/// Match each planned assignment with its execution record, in session order.
fn pair_executions<'a>(
    plan: &'a ExecutionPlan,
    session: &'a mut OrchestrationSession,
) -> Vec<(&'a Assignment, &'a mut AgentExecution)> {
    let by_sub_task: HashMap<&str, &Assignment> = plan
        .assignments
        .iter()
        .map(|a| (a.sub_task.id.as_str(), a))
        .collect();

    session
        .executions
        .iter_mut()
        .filter_map(|execution| {
            by_sub_task
                .get(execution.sub_task_id.as_str())
                .map(|assignment| (*assignment, execution))
        })
        .collect()
}
