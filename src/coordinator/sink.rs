// ABOUTME: KnowledgeSink - where session completion summaries are sent.
// ABOUTME: Fire-and-forget from the coordinator's point of view.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

/// Receives a one-line summary for every completed session.
#[async_trait]
pub trait KnowledgeSink: Send + Sync {
    /// Store a summary. Errors are logged by the caller and otherwise ignored.
    async fn record(&self, summary: &str) -> Result<(), anyhow::Error>;
}

/// Discards summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl KnowledgeSink for NoopSink {
    async fn record(&self, _summary: &str) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

/// Emits summaries as `info` events on the `ensemble::knowledge` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl KnowledgeSink for TracingSink {
    async fn record(&self, summary: &str) -> Result<(), anyhow::Error> {
        info!(target: "ensemble::knowledge", "{}", summary);
        Ok(())
    }
}

/// Keeps summaries in memory, mostly for tests and inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded summaries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl KnowledgeSink for MemorySink {
    async fn record(&self, summary: &str) -> Result<(), anyhow::Error> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock poisoned"))?
            .push(summary.to_string());
        Ok(())
    }
}
