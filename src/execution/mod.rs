// ABOUTME: Execution module - runs plans and learns from their outcomes.
// ABOUTME: Contains the strategy-driven ExecutionEngine and the PerformanceTracker.

mod engine;
mod performance;

pub use engine::{ExecutionEngine, ExecutionReport, StageResult};
pub use performance::PerformanceTracker;

#[cfg(test)]
mod engine_test;
