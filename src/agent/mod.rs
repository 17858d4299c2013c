// ABOUTME: Agent pool plumbing - where agents come from, how they run, who gets picked.
// ABOUTME: Provides AgentSource, AgentBackend, and the AgentSelector scoring.

mod backend;
mod selector;
mod source;

pub use backend::{AgentBackend, AgentOutput, SimulatedBackend};
pub use selector::{AgentSelector, SELECTION_THRESHOLD, Selection};
pub use source::{AgentSource, JsonFileAgentSource, StaticAgentSource};
