// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use ensemble::prelude::*;` to get started quickly.

pub use crate::agent::{
    AgentBackend, AgentOutput, AgentSelector, AgentSource, JsonFileAgentSource, Selection,
    SimulatedBackend, StaticAgentSource,
};
pub use crate::config::OrchestratorConfig;
pub use crate::coordinator::{
    KnowledgeSink, MaintenanceHandle, MemorySink, NoopSink, OrchestrationCoordinator,
    OrchestrationResponse, OrchestrationStats, TracingSink,
};
pub use crate::error::{ConfigError, ExecutionError, OrchestrationError};
pub use crate::execution::{ExecutionEngine, ExecutionReport, PerformanceTracker};
pub use crate::model::{
    Agent, AgentExecution, AgentStatus, AgentType, ExecutionStatus, OrchestrationSession,
    Priority, SessionStatus, SubTask, SubTaskType, TaskRequest,
};
pub use crate::planning::{
    Assignment, CollaborationType, ExecutionPlan, ExecutionPlanner, TaskBreakdown, TaskDecomposer,
};
