// ABOUTME: Tests for strategy execution against a scripted backend.
// ABOUTME: Covers abort, fan-out, context chaining, deadlines, and score feedback.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Map;

use super::engine::ExecutionEngine;
use super::performance::PerformanceTracker;
use crate::agent::{AgentBackend, AgentOutput};
use crate::model::{
    Agent, AgentExecution, AgentType, ExecutionStatus, OrchestrationSession, Priority, SubTask,
    SubTaskType,
};
use crate::planning::{Assignment, CollaborationType, ExecutionPlan};

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Unsuccessful,
    Raise,
    Delay(Duration),
}

/// Backend that follows a per-sub-task script and records what it saw.
#[derive(Default)]
struct ScriptedBackend {
    script: HashMap<String, Behavior>,
    calls: Mutex<Vec<(String, Option<AgentOutput>)>>,
}

impl ScriptedBackend {
    fn with(script: &[(&str, Behavior)]) -> Self {
        Self {
            script: script
                .iter()
                .map(|(id, b)| (id.to_string(), *b))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, Option<AgentOutput>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    async fn execute(
        &self,
        _agent: &Agent,
        sub_task: &SubTask,
        context: Option<&AgentOutput>,
    ) -> Result<AgentOutput, anyhow::Error> {
        self.calls
            .lock()
            .unwrap()
            .push((sub_task.id.clone(), context.cloned()));

        match self.script.get(&sub_task.id).copied().unwrap_or(Behavior::Succeed) {
            Behavior::Succeed => Ok(AgentOutput::success().with("stage", sub_task.id.clone())),
            Behavior::Unsuccessful => Ok(AgentOutput::failure("lint errors")),
            Behavior::Raise => Err(anyhow::anyhow!("agent crashed")),
            Behavior::Delay(d) => {
                tokio::time::sleep(d).await;
                Ok(AgentOutput::success())
            }
        }
    }
}

fn agents() -> BTreeMap<String, Agent> {
    ["agent-a", "agent-b"]
        .into_iter()
        .map(|id| (id.to_string(), Agent::new(id, AgentType::CodeGeneration)))
        .collect()
}

/// Plan three sub-tasks s1..s3 on alternating agents.
fn setup(strategy: CollaborationType) -> (ExecutionPlan, OrchestrationSession) {
    let mut session = OrchestrationSession::new("task-1", Map::new());
    let mut assignments = Vec::new();

    for (i, agent_id) in ["agent-a", "agent-b", "agent-a"].iter().enumerate() {
        let sub_task = SubTask {
            id: format!("s{}", i + 1),
            parent_id: "task-1".into(),
            task_type: SubTaskType::CodeGeneration,
            description: "stage".into(),
            priority: Priority::Medium,
        };
        session
            .executions
            .push(AgentExecution::new(*agent_id, &sub_task.id));
        assignments.push(Assignment {
            sub_task,
            agent_id: agent_id.to_string(),
            score: 0.9,
        });
    }

    let plan = ExecutionPlan {
        session_id: session.session_id.clone(),
        collaboration_type: strategy,
        assignments,
        unassigned: Vec::new(),
        estimated_duration: Duration::from_secs(900),
    };
    (plan, session)
}

fn statuses(session: &OrchestrationSession) -> Vec<ExecutionStatus> {
    session.executions.iter().map(|e| e.status).collect()
}

fn engine(backend: Arc<ScriptedBackend>, tracker: PerformanceTracker) -> ExecutionEngine {
    ExecutionEngine::new(backend, tracker)
}

#[tokio::test]
async fn test_sequential_runs_all_in_order() {
    let backend = Arc::new(ScriptedBackend::default());
    let tracker = PerformanceTracker::new(0.5);
    let (plan, mut session) = setup(CollaborationType::Sequential);

    let report = engine(backend.clone(), tracker.clone())
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 3);
    let order: Vec<_> = backend.calls().into_iter().map(|(id, _)| id).collect();
    assert_eq!(order, vec!["s1", "s2", "s3"]);
    assert!(session.executions.iter().all(|e| e.duration().is_some()));
    assert_eq!(statuses(&session), vec![ExecutionStatus::Completed; 3]);

    // agent-a completed twice, agent-b once
    assert!((tracker.score("agent-a").await - 0.6).abs() < 1e-9);
    assert!((tracker.score("agent-b").await - 0.55).abs() < 1e-9);
}

#[tokio::test]
async fn test_sequential_aborts_after_raised_failure() {
    let backend = Arc::new(ScriptedBackend::with(&[("s2", Behavior::Raise)]));
    let tracker = PerformanceTracker::new(0.5);
    let (plan, mut session) = setup(CollaborationType::Sequential);

    let report = engine(backend.clone(), tracker.clone())
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(
        statuses(&session),
        vec![
            ExecutionStatus::Completed,
            ExecutionStatus::Failed,
            ExecutionStatus::Pending
        ]
    );
    assert!(session.executions[1].error.as_ref().unwrap().contains("agent crashed"));
    assert!(session.executions[2].duration().is_none());
    assert_eq!(backend.calls().len(), 2);
    assert!((tracker.score("agent-b").await - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn test_sequential_aborts_on_unsuccessful_result() {
    let backend = Arc::new(ScriptedBackend::with(&[("s1", Behavior::Unsuccessful)]));
    let (plan, mut session) = setup(CollaborationType::Sequential);

    let report = engine(backend, PerformanceTracker::default())
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(session.executions[0].status, ExecutionStatus::Failed);
    assert_eq!(session.executions[0].error.as_deref(), Some("lint errors"));
    assert_eq!(session.executions[1].status, ExecutionStatus::Pending);
}

#[tokio::test]
async fn test_hierarchical_behaves_like_sequential() {
    let backend = Arc::new(ScriptedBackend::with(&[("s1", Behavior::Raise)]));
    let (plan, mut session) = setup(CollaborationType::Hierarchical);

    let report = engine(backend, PerformanceTracker::default())
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    assert_eq!(report.collaboration_type, CollaborationType::Hierarchical);
    assert_eq!(report.results.len(), 1);
    assert_eq!(
        statuses(&session),
        vec![
            ExecutionStatus::Failed,
            ExecutionStatus::Pending,
            ExecutionStatus::Pending
        ]
    );
}

#[tokio::test]
async fn test_parallel_partial_failure_keeps_siblings() {
    let backend = Arc::new(ScriptedBackend::with(&[("s2", Behavior::Raise)]));
    let (plan, mut session) = setup(CollaborationType::Parallel);

    let report = engine(backend.clone(), PerformanceTracker::default())
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    let ids: Vec<_> = report.results.iter().map(|r| r.sub_task_id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2", "s3"]);
    assert!(!report.results[1].output.success);
    assert_eq!(
        statuses(&session),
        vec![
            ExecutionStatus::Completed,
            ExecutionStatus::Failed,
            ExecutionStatus::Completed
        ]
    );

    let map = report.result_map();
    assert_eq!(map.len(), 3);
    assert_eq!(map["s2"]["success"], false);
    assert_eq!(map["s3"]["agent_id"], "agent-a");
}

#[tokio::test(start_paused = true)]
async fn test_parallel_dispatches_concurrently() {
    let delay = Behavior::Delay(Duration::from_millis(100));
    let backend = Arc::new(ScriptedBackend::with(&[
        ("s1", delay),
        ("s2", delay),
        ("s3", delay),
    ]));
    let (plan, mut session) = setup(CollaborationType::Parallel);

    let start = tokio::time::Instant::now();
    engine(backend, PerformanceTracker::default())
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_millis(200));
    assert_eq!(statuses(&session), vec![ExecutionStatus::Completed; 3]);
}

#[tokio::test(start_paused = true)]
async fn test_parallel_respects_concurrency_bound() {
    let delay = Behavior::Delay(Duration::from_millis(100));
    let backend = Arc::new(ScriptedBackend::with(&[
        ("s1", delay),
        ("s2", delay),
        ("s3", delay),
    ]));
    let (plan, mut session) = setup(CollaborationType::Parallel);

    let start = tokio::time::Instant::now();
    engine(backend, PerformanceTracker::default())
        .max_concurrency(1)
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_pipeline_chains_context_through_failures() {
    let backend = Arc::new(ScriptedBackend::with(&[("s1", Behavior::Raise)]));
    let (plan, mut session) = setup(CollaborationType::Pipeline);

    let report = engine(backend.clone(), PerformanceTracker::default())
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 3);
    let calls = backend.calls();
    assert!(calls[0].1.is_none());

    let second_context = calls[1].1.as_ref().unwrap();
    assert!(!second_context.success);

    let third_context = calls[2].1.as_ref().unwrap();
    assert_eq!(third_context.fields["stage"], "s2");
    assert_eq!(
        statuses(&session),
        vec![
            ExecutionStatus::Failed,
            ExecutionStatus::Completed,
            ExecutionStatus::Completed
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_deadline_fails_execution() {
    let backend = Arc::new(ScriptedBackend::with(&[(
        "s1",
        Behavior::Delay(Duration::from_secs(600)),
    )]));
    let (plan, mut session) = setup(CollaborationType::Parallel);

    let report = engine(backend, PerformanceTracker::default())
        .timeout(Some(Duration::from_secs(5)))
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    assert!(!report.results[0].output.success);
    assert_eq!(session.executions[0].status, ExecutionStatus::Failed);
    assert!(session.executions[0].error.as_ref().unwrap().contains("timed out"));
    assert_eq!(session.executions[1].status, ExecutionStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_sub_second_deadline_is_enforced_and_reported() {
    let backend = Arc::new(ScriptedBackend::with(&[(
        "s1",
        Behavior::Delay(Duration::from_secs(1)),
    )]));
    let (plan, mut session) = setup(CollaborationType::Parallel);

    engine(backend, PerformanceTracker::default())
        .timeout(Some(Duration::from_millis(250)))
        .execute(&plan, &agents(), &mut session)
        .await
        .unwrap();

    let error = session.executions[0].error.as_ref().unwrap();
    assert!(error.contains("timed out after 250ms"), "{}", error);
}

#[tokio::test]
async fn test_agent_missing_from_pool_fails_execution() {
    let backend = Arc::new(ScriptedBackend::default());
    let (plan, mut session) = setup(CollaborationType::Parallel);
    let mut pool = agents();
    pool.remove("agent-b");

    engine(backend.clone(), PerformanceTracker::default())
        .execute(&plan, &pool, &mut session)
        .await
        .unwrap();

    assert_eq!(session.executions[1].status, ExecutionStatus::Failed);
    assert!(
        session.executions[1]
            .error
            .as_ref()
            .unwrap()
            .contains("Agent not found: agent-b")
    );
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn test_rerunning_finished_plan_is_rejected() {
    let backend = Arc::new(ScriptedBackend::default());
    let (plan, mut session) = setup(CollaborationType::Sequential);
    let engine = engine(backend, PerformanceTracker::default());

    engine.execute(&plan, &agents(), &mut session).await.unwrap();
    assert!(engine.execute(&plan, &agents(), &mut session).await.is_err());
}
