//! Action-handler dispatch and execution/rollback bookkeeping

use crate::error::Result;
use async_trait::async_trait;
use cirrus_cloud::ControlPlane;
use cirrus_core::{ExecutionContext, Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Handler executing one action kind
///
/// A handler receives the task's parameters, the run context, and the
/// control plane when one is wired. Failure is an `Err` value, never a
/// panic — the executor converts it to task state and it goes no further.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn run(
        &self,
        params: &HashMap<String, serde_json::Value>,
        ctx: &ExecutionContext,
        control_plane: Option<&dyn ControlPlane>,
    ) -> anyhow::Result<serde_json::Value>;
}

/// Handler undoing the side effects of a previously executed action
#[async_trait]
pub trait RollbackHandler: Send + Sync {
    async fn run(
        &self,
        params: &HashMap<String, serde_json::Value>,
        ctx: &ExecutionContext,
        control_plane: Option<&dyn ControlPlane>,
    ) -> anyhow::Result<()>;
}

/// Task execution role
///
/// The baseline [`SimpleExecutor`] never returns `Err` from these methods:
/// every handler outcome becomes state on the task. The `Result` exists so
/// custom executors may propagate, which the orchestrator turns into a
/// task failure plus a rollback sweep.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &mut self,
        task: &mut Task,
        ctx: &ExecutionContext,
        control_plane: Option<&dyn ControlPlane>,
    ) -> Result<()>;

    async fn rollback(
        &mut self,
        task: &mut Task,
        ctx: &ExecutionContext,
        control_plane: Option<&dyn ControlPlane>,
    ) -> Result<()>;
}

/// One execution history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub task_id: String,
    pub action: String,
    pub status: TaskStatus,
}

/// One rollback history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRecord {
    pub task_id: String,
    pub action: String,
}

/// Running execution counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorStats {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub total_rollbacks: u64,
}

/// Per-task summary returned by [`SimpleExecutor::execute_batch`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub action: String,
    pub status: TaskStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// Executor with a registered handler table per action
///
/// Rollback is opportunistic: actions without a rollback handler are left
/// untouched by [`Executor::rollback`], no matter how often it is called.
#[derive(Default)]
pub struct SimpleExecutor {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
    rollback_handlers: HashMap<String, Arc<dyn RollbackHandler>>,
    execution_history: Vec<ExecutionRecord>,
    rollback_history: Vec<RollbackRecord>,
    stats: ExecutorStats,
}

impl SimpleExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or overwrite) the handlers for an action
    pub fn register(
        &mut self,
        action: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
        rollback: Option<Arc<dyn RollbackHandler>>,
    ) {
        let action = action.into();
        self.handlers.insert(action.clone(), handler);
        if let Some(rollback) = rollback {
            self.rollback_handlers.insert(action, rollback);
        }
    }

    /// Remove both handler entries for an action; silent when absent
    pub fn unregister(&mut self, action: &str) {
        self.handlers.remove(action);
        self.rollback_handlers.remove(action);
    }

    pub fn has_handler(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    pub fn has_rollback_handler(&self, action: &str) -> bool {
        self.rollback_handlers.contains_key(action)
    }

    /// Run `execute` over each task strictly in sequence
    ///
    /// Continues regardless of individual failures and returns one
    /// outcome summary per task.
    pub async fn execute_batch(
        &mut self,
        tasks: &mut [Task],
        ctx: &ExecutionContext,
        control_plane: Option<&dyn ControlPlane>,
    ) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks.iter_mut() {
            // SimpleExecutor::execute is infallible by contract
            let _ = Executor::execute(self, task, ctx, control_plane).await;
            outcomes.push(TaskOutcome {
                task_id: task.id.clone(),
                action: task.action.clone(),
                status: task.status,
                result: task.result.clone(),
                error: task.error.clone(),
            });
        }
        outcomes
    }

    /// Execution history (defensive copy)
    pub fn execution_history(&self) -> Vec<ExecutionRecord> {
        self.execution_history.clone()
    }

    pub fn clear_execution_history(&mut self) {
        self.execution_history.clear();
    }

    /// Rollback history (defensive copy)
    pub fn rollback_history(&self) -> Vec<RollbackRecord> {
        self.rollback_history.clone()
    }

    pub fn stats(&self) -> ExecutorStats {
        self.stats
    }

    fn record_execution(&mut self, task: &Task) {
        self.execution_history.push(ExecutionRecord {
            task_id: task.id.clone(),
            action: task.action.clone(),
            status: task.status,
        });
    }
}

#[async_trait]
impl Executor for SimpleExecutor {
    /// Execute a task through its registered handler
    ///
    /// Without a handler the task fails immediately and the control plane
    /// is never touched. A handler failure is captured into `task.error`;
    /// it never propagates past this method.
    async fn execute(
        &mut self,
        task: &mut Task,
        ctx: &ExecutionContext,
        control_plane: Option<&dyn ControlPlane>,
    ) -> Result<()> {
        let Some(handler) = self.handlers.get(&task.action).cloned() else {
            task.status = TaskStatus::Failed;
            task.error = Some(format!("No handler for {}", task.action));
            self.stats.total_executions += 1;
            self.stats.failed_executions += 1;
            self.record_execution(task);
            tracing::warn!(task = %task.id, action = %task.action, "No handler registered");
            return Ok(());
        };

        task.status = TaskStatus::Running;
        match handler.run(&task.params, ctx, control_plane).await {
            Ok(result) => {
                task.result = Some(result);
                task.status = TaskStatus::Success;
                self.stats.total_executions += 1;
                self.stats.successful_executions += 1;
                tracing::debug!(task = %task.id, action = %task.action, "Task succeeded");
            }
            Err(e) => {
                task.status = TaskStatus::Failed;
                task.error = Some(e.to_string());
                self.stats.total_executions += 1;
                self.stats.failed_executions += 1;
                tracing::warn!(task = %task.id, action = %task.action, error = %e, "Task failed");
            }
        }
        self.record_execution(task);
        Ok(())
    }

    /// Undo a task's side effects via its rollback handler, if any
    ///
    /// A rollback handler failure is recorded on the task (`"Rollback
    /// failed: …"`) with the status left unchanged.
    async fn rollback(
        &mut self,
        task: &mut Task,
        ctx: &ExecutionContext,
        control_plane: Option<&dyn ControlPlane>,
    ) -> Result<()> {
        let Some(handler) = self.rollback_handlers.get(&task.action).cloned() else {
            return Ok(());
        };

        match handler.run(&task.params, ctx, control_plane).await {
            Ok(()) => {
                task.status = TaskStatus::RolledBack;
                self.stats.total_rollbacks += 1;
                self.rollback_history.push(RollbackRecord {
                    task_id: task.id.clone(),
                    action: task.action.clone(),
                });
                tracing::debug!(task = %task.id, action = %task.action, "Task rolled back");
            }
            Err(e) => {
                task.error = Some(format!("Rollback failed: {e}"));
                tracing::warn!(task = %task.id, action = %task.action, error = %e, "Rollback failed");
            }
        }
        Ok(())
    }
}
