// ABOUTME: TaskDecomposer - complexity analysis, strategy choice, sub-task templates.
// ABOUTME: Pure: the same task always yields the same strategy and template.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Priority, SubTask, SubTaskType, TaskRequest};

const MAX_COMPLEXITY: f64 = 10.0;

/// Scheduling strategy for a set of sub-tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationType {
    /// One after another, stopping at the first unsuccessful result.
    Sequential,
    /// All at once; failures do not affect siblings.
    Parallel,
    /// In order, each stage receiving the previous stage's output.
    Pipeline,
    /// Supervisor/sub-agent tree. Currently runs exactly like `Sequential`
    /// and is never chosen by complexity; it must be requested explicitly.
    Hierarchical,
}

impl CollaborationType {
    /// Strategy for a complexity score.
    pub fn for_complexity(score: f64) -> Self {
        if score < 3.0 {
            CollaborationType::Sequential
        } else if score < 6.0 {
            CollaborationType::Parallel
        } else {
            CollaborationType::Pipeline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationType::Sequential => "sequential",
            CollaborationType::Parallel => "parallel",
            CollaborationType::Pipeline => "pipeline",
            CollaborationType::Hierarchical => "hierarchical",
        }
    }
}

impl fmt::Display for CollaborationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complexity analysis of a root task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    /// Score on a 0-10 scale.
    pub complexity_score: f64,
    pub estimated_agents_needed: u32,
    pub parallelization_opportunities: bool,
    pub specialized_agents_required: Vec<String>,
}

/// Output of decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBreakdown {
    pub analysis: TaskAnalysis,
    pub collaboration_type: CollaborationType,
    pub sub_tasks: Vec<SubTask>,
    pub estimated_complexity: f64,
}

type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Splits root tasks into fixed-shape sub-tasks.
#[derive(Clone)]
pub struct TaskDecomposer {
    next_id: IdGenerator,
}

impl Default for TaskDecomposer {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskDecomposer {
    /// Create a decomposer that assigns random UUID sub-task ids.
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(|| Uuid::new_v4().to_string()),
        }
    }

    /// Create a decomposer with a custom sub-task id generator.
    pub fn with_id_generator<F>(generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            next_id: Arc::new(generator),
        }
    }

    /// Score a task's complexity.
    ///
    /// `(chars(description) + len(requirements) + estimated_hours) / 10`,
    /// clipped to `[0, 10]`.
    pub fn analyze(&self, task: &TaskRequest) -> TaskAnalysis {
        let raw = task.description.chars().count() as f64
            + task.requirements.len() as f64
            + task.estimated_hours.unwrap_or(1.0);
        let complexity_score = (raw / 10.0).clamp(0.0, MAX_COMPLEXITY);

        TaskAnalysis {
            complexity_score,
            estimated_agents_needed: ((complexity_score / 2.0) as u32).max(1),
            parallelization_opportunities: complexity_score > 5.0,
            specialized_agents_required: vec!["code_generation".to_string()],
        }
    }

    /// Analyze a task, choose its strategy, and emit the strategy's template.
    pub fn decompose(&self, task: &TaskRequest) -> TaskBreakdown {
        let analysis = self.analyze(task);
        let collaboration_type = CollaborationType::for_complexity(analysis.complexity_score);
        self.breakdown(task, analysis, collaboration_type)
    }

    /// Like [`decompose`](Self::decompose) but with a caller-chosen strategy.
    pub fn decompose_as(
        &self,
        task: &TaskRequest,
        collaboration_type: CollaborationType,
    ) -> TaskBreakdown {
        let analysis = self.analyze(task);
        self.breakdown(task, analysis, collaboration_type)
    }

    fn breakdown(
        &self,
        task: &TaskRequest,
        analysis: TaskAnalysis,
        collaboration_type: CollaborationType,
    ) -> TaskBreakdown {
        let sub_tasks = template(collaboration_type)
            .iter()
            .map(|(task_type, description, priority)| SubTask {
                id: (self.next_id)(),
                parent_id: task.id.clone(),
                task_type: task_type.clone(),
                description: (*description).to_string(),
                priority: *priority,
            })
            .collect();

        TaskBreakdown {
            estimated_complexity: analysis.complexity_score,
            analysis,
            collaboration_type,
            sub_tasks,
        }
    }
}

type Template = &'static [(SubTaskType, &'static str, Priority)];

const SEQUENTIAL_TEMPLATE: Template = &[
    (
        SubTaskType::Analysis,
        "Analyze task requirements",
        Priority::High,
    ),
    (
        SubTaskType::Implementation,
        "Implement the solution",
        Priority::Medium,
    ),
    (
        SubTaskType::Validation,
        "Validate the implementation",
        Priority::Medium,
    ),
];

const PARALLEL_TEMPLATE: Template = &[
    (
        SubTaskType::CodeGeneration,
        "Generate code components",
        Priority::High,
    ),
    (
        SubTaskType::Testing,
        "Create comprehensive tests",
        Priority::High,
    ),
    (
        SubTaskType::Documentation,
        "Generate documentation",
        Priority::Low,
    ),
];

/// Sub-task shape per strategy. Pipeline and hierarchical have no template
/// and decompose to nothing.
fn template(collaboration_type: CollaborationType) -> Template {
    match collaboration_type {
        CollaborationType::Sequential => SEQUENTIAL_TEMPLATE,
        CollaborationType::Parallel => PARALLEL_TEMPLATE,
        CollaborationType::Pipeline | CollaborationType::Hierarchical => &[],
    }
}
