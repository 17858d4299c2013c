// ABOUTME: Data model shared by every orchestration component.
// ABOUTME: Agents, tasks, sub-tasks, executions, and sessions.

mod agent;
mod session;
mod task;

pub use agent::{Agent, AgentStatus, AgentType};
pub use session::{AgentExecution, ExecutionStatus, OrchestrationSession, SessionStatus};
pub use task::{Priority, SubTask, SubTaskType, TaskRequest};
