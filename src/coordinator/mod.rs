// ABOUTME: Coordinator module - the orchestration entry point and its upkeep.
// ABOUTME: Contains the coordinator façade, maintenance loops, and knowledge sinks.

mod coordinator;
mod maintenance;
mod sink;

pub use coordinator::{OrchestrationCoordinator, OrchestrationResponse, OrchestrationStats};
pub use maintenance::MaintenanceHandle;
pub use sink::{KnowledgeSink, MemorySink, NoopSink, TracingSink};
