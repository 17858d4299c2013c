// ABOUTME: AgentSelector - scores pooled agents against a sub-task's skills.
// ABOUTME: Picks the single best active agent above the selection threshold.

use std::collections::HashMap;

use crate::model::{Agent, SubTaskType};

const TYPE_MATCH_WEIGHT: f64 = 0.4;
const CAPABILITY_WEIGHT: f64 = 0.2;
const CAPABILITY_CAP: f64 = 0.4;
const PERFORMANCE_WEIGHT: f64 = 0.2;

/// Minimum score an agent must exceed to be assigned.
pub const SELECTION_THRESHOLD: f64 = 0.5;

/// The agent chosen for a sub-task and the score it won with.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub agent_id: String,
    pub score: f64,
}

/// Scores agents for sub-tasks.
#[derive(Debug, Clone)]
pub struct AgentSelector {
    default_performance: f64,
}

impl Default for AgentSelector {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl AgentSelector {
    /// Create a selector; `default_performance` is used for agents with no score yet.
    pub fn new(default_performance: f64) -> Self {
        Self {
            default_performance,
        }
    }

    /// Ordered skill tags a sub-task type needs.
    pub fn required_skills(task_type: &SubTaskType) -> &'static [&'static str] {
        match task_type.as_str() {
            "code_generation" => &["code_generation", "python", "javascript"],
            "testing" => &["testing", "pytest", "jest"],
            "documentation" => &["documentation", "markdown"],
            "analysis" => &["analysis", "code_review"],
            _ => &["generic"],
        }
    }

    /// Match score in [0, 1] for one agent.
    pub fn score(&self, agent: &Agent, required_skills: &[&str], performance: f64) -> f64 {
        let mut score = 0.0;

        if required_skills.contains(&agent.agent_type.as_str()) {
            score += TYPE_MATCH_WEIGHT;
        }

        let matched = required_skills
            .iter()
            .filter(|skill| agent.capabilities.contains(**skill))
            .count();
        score += (matched as f64 * CAPABILITY_WEIGHT).min(CAPABILITY_CAP);

        score += performance.clamp(0.0, 1.0) * PERFORMANCE_WEIGHT;

        score.min(1.0)
    }

    /// Pick the best active agent for a sub-task type.
    ///
    /// Candidates are compared in id-ascending order and a later candidate
    /// must score strictly higher to win, so ties go to the lowest id.
    pub fn select<'a, I>(
        &self,
        task_type: &SubTaskType,
        agents: I,
        performance: &HashMap<String, f64>,
    ) -> Option<Selection>
    where
        I: IntoIterator<Item = &'a Agent>,
    {
        let skills = Self::required_skills(task_type);

        let mut candidates: Vec<&Agent> = agents.into_iter().filter(|a| a.is_active()).collect();
        candidates.sort_by(|a, b| a.id.cmp(&b.id));

        let mut best: Option<Selection> = None;
        for agent in candidates {
            let perf = performance
                .get(&agent.id)
                .copied()
                .unwrap_or(self.default_performance);
            let score = self.score(agent, skills, perf);

            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(Selection {
                    agent_id: agent.id.clone(),
                    score,
                });
            }
        }

        best.filter(|b| b.score > SELECTION_THRESHOLD)
    }
}
