// ABOUTME: Planning module - turns a root task into an agent-assigned plan.
// ABOUTME: Contains the TaskDecomposer and the ExecutionPlanner.

mod decomposer;
mod planner;

pub use decomposer::{CollaborationType, TaskAnalysis, TaskBreakdown, TaskDecomposer};
pub use planner::{Assignment, ExecutionPlan, ExecutionPlanner};
