// ABOUTME: Root module for ensemble - multi-agent task orchestration.
// ABOUTME: Re-exports the coordinator and error types; see prelude for the rest.

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod execution;
pub mod model;
pub mod planning;
pub mod prelude;

pub use coordinator::OrchestrationCoordinator;
pub use error::OrchestrationError;
