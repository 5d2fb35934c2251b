//! Task and plan types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of a task within a single run
///
/// Transitions: `Pending → Running → {Success, Failed}`, and
/// `Success → RolledBack` via the rollback path. `Failed` and
/// `RolledBack` are terminal; no transition returns a task to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has not started yet
    Pending,
    /// Task is currently executing
    Running,
    /// Task completed successfully
    Success,
    /// Task failed or was denied by policy
    Failed,
    /// Task's side effects were undone after a later failure
    RolledBack,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// One unit of work within a plan
///
/// A task names an action, carries free-form parameters for the action's
/// handler, and lists the ids of the tasks it depends on. Only the
/// executor and the orchestrator mutate a task during a run; the scheduler
/// and policy engine treat it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier within the plan
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Action identifier resolved by the executor's handler table
    pub action: String,

    /// Free-form parameters passed to the action handler
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,

    /// Ids of tasks that must reach `Success` before this one is ready
    #[serde(default)]
    pub depends: Vec<String>,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Handler output, set on success
    pub result: Option<serde_json::Value>,

    /// Failure message, set on failure or denied policy
    pub error: Option<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            action: action.into(),
            params: HashMap::new(),
            depends: Vec::new(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn with_params(mut self, params: HashMap<String, serde_json::Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_depends(mut self, depends: Vec<String>) -> Self {
        self.depends = depends;
        self
    }

    /// Whether the task reached a terminal state for this run
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Failed | TaskStatus::RolledBack)
    }
}

/// A goal plus an ordered set of tasks forming a dependency graph
///
/// Task order is the tie-break for scheduling and history. Every id in a
/// task's `depends` must reference another task in the same plan; the
/// scheduler assumes this holds and does not validate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// The goal this plan was generated for
    pub goal: String,

    /// Tasks in plan order
    pub tasks: Vec<Task>,

    /// Informational label, not consulted by the run loop
    pub status: String,
}

impl Plan {
    pub fn new(goal: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            goal: goal.into(),
            tasks,
            status: "planned".to_string(),
        }
    }

    /// Look up a task by id
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}
