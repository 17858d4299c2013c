// ABOUTME: Coordinator tunables with defaults, builder setters, and loaders.
// ABOUTME: Values can come from JSON files or ENSEMBLE_* environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for an orchestration coordinator.
///
/// Durations are stored as (possibly fractional) seconds so the struct maps
/// one-to-one onto its JSON and environment representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound on concurrent dispatches in the parallel strategy.
    pub max_concurrent_agents: usize,

    /// Deadline for a single agent dispatch. Zero disables the deadline.
    pub task_timeout_secs: f64,

    /// Period of the optimizer/cleanup loop.
    pub optimization_interval_secs: f64,

    /// Period of the agent health loop.
    pub health_check_interval_secs: f64,

    /// How long a finished session stays in the session table.
    pub session_retention_secs: f64,

    /// Estimated duration for an agent with no recorded executions.
    pub default_agent_duration_secs: f64,

    /// Score assigned to agents the tracker has not seen yet.
    pub initial_performance_score: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_agents: 10,
            task_timeout_secs: 300.0,
            optimization_interval_secs: 60.0,
            health_check_interval_secs: 60.0,
            session_retention_secs: 86_400.0,
            default_agent_duration_secs: 300.0,
            initial_performance_score: 0.5,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Defaults overridden by `ENSEMBLE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup, e.g. the process environment.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ENSEMBLE_MAX_CONCURRENT_AGENTS") {
            self.max_concurrent_agents = parse_value("ENSEMBLE_MAX_CONCURRENT_AGENTS", &v)?;
        }
        if let Some(v) = lookup("ENSEMBLE_TASK_TIMEOUT_SECS") {
            self.task_timeout_secs = parse_value("ENSEMBLE_TASK_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("ENSEMBLE_OPTIMIZATION_INTERVAL_SECS") {
            self.optimization_interval_secs =
                parse_value("ENSEMBLE_OPTIMIZATION_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("ENSEMBLE_HEALTH_CHECK_INTERVAL_SECS") {
            self.health_check_interval_secs =
                parse_value("ENSEMBLE_HEALTH_CHECK_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("ENSEMBLE_SESSION_RETENTION_SECS") {
            self.session_retention_secs = parse_value("ENSEMBLE_SESSION_RETENTION_SECS", &v)?;
        }
        if let Some(v) = lookup("ENSEMBLE_DEFAULT_AGENT_DURATION_SECS") {
            self.default_agent_duration_secs =
                parse_value("ENSEMBLE_DEFAULT_AGENT_DURATION_SECS", &v)?;
        }
        if let Some(v) = lookup("ENSEMBLE_INITIAL_PERFORMANCE_SCORE") {
            self.initial_performance_score =
                parse_value("ENSEMBLE_INITIAL_PERFORMANCE_SCORE", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check every value is usable.
    ///
    /// Durations must be finite and non-negative, and both loop periods must
    /// be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_agents == 0 {
            return Err(invalid("max_concurrent_agents", "0"));
        }

        let durations = [
            ("task_timeout_secs", self.task_timeout_secs),
            ("optimization_interval_secs", self.optimization_interval_secs),
            ("health_check_interval_secs", self.health_check_interval_secs),
            ("session_retention_secs", self.session_retention_secs),
            ("default_agent_duration_secs", self.default_agent_duration_secs),
        ];
        for (key, secs) in durations {
            if !secs.is_finite() || secs < 0.0 {
                return Err(invalid(key, &secs.to_string()));
            }
        }

        let periods = [
            ("optimization_interval_secs", self.optimization_interval_secs),
            ("health_check_interval_secs", self.health_check_interval_secs),
        ];
        for (key, secs) in periods {
            if to_duration(secs).is_zero() {
                return Err(invalid(key, &secs.to_string()));
            }
        }

        if !(0.0..=1.0).contains(&self.initial_performance_score) {
            return Err(invalid(
                "initial_performance_score",
                &self.initial_performance_score.to_string(),
            ));
        }
        Ok(())
    }

    /// Set the parallel dispatch bound.
    pub fn max_concurrent_agents(mut self, max: usize) -> Self {
        self.max_concurrent_agents = max;
        self
    }

    /// Set the dispatch deadline; `None` disables it.
    pub fn task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout_secs = timeout.map_or(0.0, |t| t.as_secs_f64());
        self
    }

    /// Set the optimizer loop period.
    pub fn optimization_interval(mut self, interval: Duration) -> Self {
        self.optimization_interval_secs = interval.as_secs_f64();
        self
    }

    /// Set the health loop period.
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval_secs = interval.as_secs_f64();
        self
    }

    /// Set the finished-session retention window.
    pub fn session_retention(mut self, retention: Duration) -> Self {
        self.session_retention_secs = retention.as_secs_f64();
        self
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        let timeout = to_duration(self.task_timeout_secs);
        (!timeout.is_zero()).then_some(timeout)
    }

    pub fn optimization_period(&self) -> Duration {
        to_duration(self.optimization_interval_secs)
    }

    pub fn health_check_period(&self) -> Duration {
        to_duration(self.health_check_interval_secs)
    }

    pub fn retention(&self) -> Duration {
        to_duration(self.session_retention_secs)
    }

    pub fn default_agent_duration(&self) -> Duration {
        to_duration(self.default_agent_duration_secs)
    }
}

/// Seconds to a `Duration`. Negative and NaN map to zero, overflow saturates.
fn to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
