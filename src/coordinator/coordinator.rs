// ABOUTME: Orchestration coordinator - session lifecycle over decompose/plan/execute.
// ABOUTME: Owns the agent pool, session table, stats, and maintenance passes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::maintenance::MaintenanceHandle;
use super::sink::{KnowledgeSink, NoopSink};
use crate::agent::{AgentBackend, AgentSource};
use crate::config::OrchestratorConfig;
use crate::error::OrchestrationError;
use crate::execution::{ExecutionEngine, ExecutionReport, PerformanceTracker};
use crate::model::{
    Agent, AgentStatus, ExecutionStatus, OrchestrationSession, SessionStatus, TaskRequest,
};
use crate::planning::{CollaborationType, ExecutionPlanner, TaskDecomposer};

/// What a caller gets back from [`OrchestrationCoordinator::orchestrate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestrationResponse {
    pub success: bool,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metrics: Map<String, Value>,
}

/// Read-only snapshot of coordinator state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestrationStats {
    /// Sessions currently held in the session table, finished or not.
    pub active_sessions: usize,
    /// Pooled agents whose status is active.
    pub available_agents: usize,
    pub total_sessions_completed: usize,
    /// Mean duration of completed sessions in seconds.
    pub average_session_duration: Option<f64>,
    pub agent_performance_scores: HashMap<String, f64>,
}

/// Central coordinator for multi-agent orchestration.
///
/// Construct one per process and share it behind an `Arc`. All state is
/// behind async locks, so orchestrations and the maintenance loops can run
/// concurrently.
///
/// # Session lifecycle
///
/// - A session is inserted as `Pending` when orchestration starts.
/// - It stays `Pending` until the engine returns, then becomes exactly one
///   of `Completed` or `Failed`.
/// - Finished sessions are evicted once they are older than the configured
///   retention window.
pub struct OrchestrationCoordinator {
    config: OrchestratorConfig,
    source: Arc<dyn AgentSource>,
    sink: Arc<dyn KnowledgeSink>,
    backend: Arc<dyn AgentBackend>,
    agents: RwLock<BTreeMap<String, Agent>>,
    sessions: RwLock<HashMap<String, OrchestrationSession>>,
    tracker: PerformanceTracker,
    decomposer: TaskDecomposer,
    planner: ExecutionPlanner,
    engine: ExecutionEngine,
}

impl OrchestrationCoordinator {
    /// Create a coordinator. Call [`initialize`](Self::initialize) to load agents.
    pub fn new(
        config: OrchestratorConfig,
        source: Arc<dyn AgentSource>,
        backend: Arc<dyn AgentBackend>,
    ) -> Self {
        let tracker = PerformanceTracker::new(config.initial_performance_score);
        let planner = ExecutionPlanner::new(tracker.clone(), config.default_agent_duration());
        let engine = ExecutionEngine::new(backend.clone(), tracker.clone())
            .timeout(config.dispatch_timeout())
            .max_concurrency(config.max_concurrent_agents);

        Self {
            config,
            source,
            sink: Arc::new(NoopSink),
            backend,
            agents: RwLock::new(BTreeMap::new()),
            sessions: RwLock::new(HashMap::new()),
            tracker,
            decomposer: TaskDecomposer::new(),
            planner,
            engine,
        }
    }

    /// Send completion summaries to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn KnowledgeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the task decomposer, e.g. to control sub-task ids.
    pub fn with_decomposer(mut self, decomposer: TaskDecomposer) -> Self {
        self.decomposer = decomposer;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn performance(&self) -> &PerformanceTracker {
        &self.tracker
    }

    /// Load the agent pool. Returns the number of agents loaded.
    pub async fn initialize(&self) -> Result<usize, OrchestrationError> {
        info!("initializing orchestration coordinator");
        let count = self.reload_agents().await?;
        info!(agents = count, "orchestration coordinator ready");
        Ok(count)
    }

    /// Replace the agent pool with a fresh load from the source.
    pub async fn reload_agents(&self) -> Result<usize, OrchestrationError> {
        let loaded = self
            .source
            .load_agents()
            .await
            .map_err(OrchestrationError::AgentSource)?;

        let pool: BTreeMap<String, Agent> =
            loaded.into_iter().map(|a| (a.id.clone(), a)).collect();
        let count = pool.len();
        *self.agents.write().await = pool;
        Ok(count)
    }

    /// Snapshot of the agent pool in id order.
    pub async fn agents(&self) -> Vec<Agent> {
        self.agents.read().await.values().cloned().collect()
    }

    /// Change a pooled agent's status.
    pub async fn set_agent_status(
        &self,
        agent_id: &str,
        status: AgentStatus,
    ) -> Result<(), OrchestrationError> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(agent_id)
            .ok_or_else(|| OrchestrationError::AgentNotFound(agent_id.to_string()))?;
        agent.status = status;
        Ok(())
    }

    /// Copy of a session from the session table.
    pub async fn session(&self, session_id: &str) -> Option<OrchestrationSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Decompose, plan, and execute a task.
    ///
    /// Never fails: errors are reported as `success: false` with the error text.
    pub async fn orchestrate(&self, task: TaskRequest) -> OrchestrationResponse {
        self.run_session(task, None).await
    }

    /// Like [`orchestrate`](Self::orchestrate) but with a caller-chosen strategy.
    pub async fn orchestrate_with_strategy(
        &self,
        task: TaskRequest,
        collaboration_type: CollaborationType,
    ) -> OrchestrationResponse {
        self.run_session(task, Some(collaboration_type)).await
    }

    async fn run_session(
        &self,
        task: TaskRequest,
        strategy: Option<CollaborationType>,
    ) -> OrchestrationResponse {
        let snapshot = self.context_snapshot(&task).await;
        let mut session = OrchestrationSession::new(task.id.clone(), snapshot);
        let session_id = session.session_id.clone();
        info!(session_id = %session_id, task_id = %task.id, "starting orchestration session");

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), session.clone());

        let outcome = self.execute_session(&task, strategy, &mut session).await;

        let response = match outcome {
            Ok(report) => {
                session.mark_completed();
                record_outcome_metrics(&mut session);

                self.log_session_completion(&session).await;
                self.update_performance_optimization(&session).await;

                OrchestrationResponse {
                    success: true,
                    session_id: session_id.clone(),
                    result: Some(Value::Object(report.result_map())),
                    error: None,
                    metrics: session.metrics.clone(),
                }
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "orchestration failed");
                session.mark_failed();
                record_outcome_metrics(&mut session);

                OrchestrationResponse {
                    success: false,
                    session_id: session_id.clone(),
                    result: None,
                    error: Some(e.to_string()),
                    metrics: session.metrics.clone(),
                }
            }
        };

        self.sessions.write().await.insert(session_id, session);
        response
    }

    async fn execute_session(
        &self,
        task: &TaskRequest,
        strategy: Option<CollaborationType>,
        session: &mut OrchestrationSession,
    ) -> Result<ExecutionReport, OrchestrationError> {
        if task.id.trim().is_empty() {
            return Err(OrchestrationError::InvalidTask(
                "task id must not be empty".to_string(),
            ));
        }

        let breakdown = match strategy {
            Some(strategy) => self.decomposer.decompose_as(task, strategy),
            None => self.decomposer.decompose(task),
        };
        debug!(
            session_id = %session.session_id,
            complexity = breakdown.estimated_complexity,
            strategy = %breakdown.collaboration_type,
            "task decomposed"
        );
        session.metrics.insert(
            "complexity_score".into(),
            Value::from(breakdown.estimated_complexity),
        );
        session.metrics.insert(
            "collaboration_type".into(),
            Value::from(breakdown.collaboration_type.as_str()),
        );
        session
            .metrics
            .insert("sub_tasks".into(), Value::from(breakdown.sub_tasks.len()));

        // Status changes made during the run apply to later sessions only
        let agents = self.agents.read().await.clone();

        let plan = self.planner.plan(&breakdown, &agents, session).await?;
        session
            .metrics
            .insert("assigned".into(), Value::from(plan.assignments.len()));
        session.metrics.insert(
            "unassigned_sub_tasks".into(),
            plan.unassigned
                .iter()
                .map(|s| Value::from(s.id.clone()))
                .collect(),
        );
        session.metrics.insert(
            "estimated_duration_secs".into(),
            Value::from(plan.estimated_duration.as_secs()),
        );

        self.engine.execute(&plan, &agents, session).await
    }

    fn completion_summary(session: &OrchestrationSession) -> String {
        let duration = session
            .total_duration()
            .map(|d| format!("{:.3}s", d.num_milliseconds() as f64 / 1000.0))
            .unwrap_or_else(|| "unknown".to_string());
        let success_rate = session
            .success_rate()
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            "Orchestration session {} completed. Duration: {}. Agents used: {}. Success rate: {}",
            session.session_id,
            duration,
            session.executions.len(),
            success_rate
        )
    }

    async fn log_session_completion(&self, session: &OrchestrationSession) {
        let summary = Self::completion_summary(session);
        if let Err(e) = self.sink.record(&summary).await {
            warn!(session_id = %session.session_id, error = %e, "failed to record session summary");
        }
    }

    /// Hook for feeding finished sessions to an assignment optimizer. Nothing
    /// consumes this data yet.
    async fn update_performance_optimization(&self, session: &OrchestrationSession) {
        debug!(
            session_id = %session.session_id,
            executions = session.executions.len(),
            "performance optimization hook"
        );
    }

    async fn context_snapshot(&self, task: &TaskRequest) -> Map<String, Value> {
        let agent_count = self.agents.read().await.len();
        let active_sessions = self.sessions.read().await.len();

        let mut snapshot = Map::new();
        snapshot.insert("task_id".into(), Value::from(task.id.clone()));
        snapshot.insert("timestamp".into(), Value::from(Utc::now().to_rfc3339()));
        snapshot.insert(
            "task_type".into(),
            task.task_type.clone().map_or(Value::Null, Value::from),
        );
        snapshot.insert("agent_count".into(), Value::from(agent_count));
        snapshot.insert("active_sessions".into(), Value::from(active_sessions));
        snapshot
    }

    /// Review assignment performance. Currently reports what it would work
    /// from and changes nothing.
    pub async fn optimize_agent_assignments(&self) -> Result<(), OrchestrationError> {
        let scores = self.tracker.scores().await;
        info!(
            scored_agents = scores.len(),
            "running agent assignment optimization"
        );
        Ok(())
    }

    /// Evict finished sessions that ended before `now - retention`.
    pub async fn cleanup_sessions(&self) -> usize {
        let retention = TimeDelta::from_std(self.config.retention()).unwrap_or(TimeDelta::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.cleanup_sessions_before(cutoff).await
    }

    /// Evict finished sessions whose end time is earlier than `cutoff`.
    ///
    /// Pending and active sessions are never evicted.
    pub async fn cleanup_sessions_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|session_id, session| {
            let expired = session.status.is_finished()
                && session.end_time.is_some_and(|end| end < cutoff);
            if expired {
                info!(session_id = %session_id, "cleaned up finished session");
            }
            !expired
        });

        before - sessions.len()
    }

    /// One iteration of the optimizer loop.
    pub async fn run_optimizer_pass(&self) -> Result<(), OrchestrationError> {
        self.optimize_agent_assignments().await?;
        self.cleanup_sessions().await;
        Ok(())
    }

    /// Ping every pooled agent and record status changes.
    ///
    /// An agent whose ping fails is marked `Error`. Returns how many
    /// statuses changed.
    pub async fn check_agent_health(&self) -> Result<usize, OrchestrationError> {
        let pool = self.agents().await;
        let mut observed = Vec::with_capacity(pool.len());

        for agent in &pool {
            let status = match self.backend.ping(agent).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(agent_id = %agent.id, error = %e, "agent health check failed");
                    AgentStatus::Error
                }
            };
            if status != agent.status {
                observed.push((agent.id.clone(), status));
            }
        }

        let mut agents = self.agents.write().await;
        let mut changed = 0;
        for (agent_id, status) in observed {
            // The pool may have been reloaded while pinging
            if let Some(agent) = agents.get_mut(&agent_id) {
                info!(
                    agent_id = %agent_id,
                    from = ?agent.status,
                    to = ?status,
                    "agent status changed"
                );
                agent.status = status;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Spawn the optimizer and health loops on the current runtime.
    ///
    /// Fails without spawning anything if the configuration is invalid.
    pub fn start_maintenance(self: &Arc<Self>) -> Result<MaintenanceHandle, OrchestrationError> {
        self.config.validate()?;
        let mut handle = MaintenanceHandle::new();

        let coordinator = Arc::clone(self);
        handle.spawn(
            "performance_optimizer",
            self.config.optimization_period(),
            move || {
                let coordinator = coordinator.clone();
                async move { coordinator.run_optimizer_pass().await }
            },
        );

        let coordinator = Arc::clone(self);
        handle.spawn(
            "health_monitor",
            self.config.health_check_period(),
            move || {
                let coordinator = coordinator.clone();
                async move { coordinator.check_agent_health().await.map(|_| ()) }
            },
        );

        Ok(handle)
    }

    /// Read-only statistics snapshot.
    pub async fn orchestration_stats(&self) -> OrchestrationStats {
        let available_agents = self
            .agents
            .read()
            .await
            .values()
            .filter(|a| a.is_active())
            .count();

        let sessions = self.sessions.read().await;
        let completed: Vec<&OrchestrationSession> = sessions
            .values()
            .filter(|s| s.status == SessionStatus::Completed)
            .collect();

        let durations: Vec<f64> = completed
            .iter()
            .filter_map(|s| s.total_duration())
            .map(|d| d.num_milliseconds() as f64 / 1000.0)
            .collect();
        let average_session_duration = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<f64>() / durations.len() as f64)
        };

        OrchestrationStats {
            active_sessions: sessions.len(),
            available_agents,
            total_sessions_completed: completed.len(),
            average_session_duration,
            agent_performance_scores: self.tracker.scores().await,
        }
    }
}

fn record_outcome_metrics(session: &mut OrchestrationSession) {
    let count = |status| {
        session
            .executions
            .iter()
            .filter(|e| e.status == status)
            .count()
    };
    let completed = count(ExecutionStatus::Completed);
    let failed = count(ExecutionStatus::Failed);
    let pending = count(ExecutionStatus::Pending);
    let duration = session
        .total_duration()
        .map(|d| d.num_milliseconds() as f64 / 1000.0);
    let success_rate = session.success_rate();

    let metrics = &mut session.metrics;
    metrics.insert("completed_executions".into(), Value::from(completed));
    metrics.insert("failed_executions".into(), Value::from(failed));
    metrics.insert("pending_executions".into(), Value::from(pending));
    metrics.insert(
        "duration_secs".into(),
        duration.map_or(Value::Null, Value::from),
    );
    metrics.insert(
        "success_rate".into(),
        success_rate.map_or(Value::Null, Value::from),
    );
}
