//! Dependency-ready batch scheduling

use cirrus_core::{Plan, TaskStatus};
use std::collections::HashMap;

/// Task scheduling strategy
///
/// A scheduler decides which tasks of a plan are released next. Batches
/// are expressed as indices into `plan.tasks` so the caller keeps mutable
/// access to the plan while acting on the batch.
pub trait Scheduler: Send + Sync {
    /// Next batch of ready tasks, as indices into `plan.tasks` in plan order
    ///
    /// An empty batch is the run loop's sole termination signal: it does
    /// not distinguish a fully resolved plan from one permanently blocked
    /// by a failed or denied dependency. A cyclic dependency set never
    /// becomes ready and stalls the same way.
    fn next_batch(&self, plan: &Plan) -> Vec<usize>;
}

/// Scheduler releasing tasks whose dependencies have all succeeded
///
/// A task is ready iff it is `Pending` and every dependency is `Success`.
/// At most `max_parallel` tasks are released per batch, in plan order.
/// No cycle detection is performed.
pub struct DagScheduler {
    max_parallel: usize,
}

impl DagScheduler {
    pub const DEFAULT_MAX_PARALLEL: usize = 4;

    pub fn new(max_parallel: usize) -> Self {
        Self { max_parallel }
    }
}

impl Default for DagScheduler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_PARALLEL)
    }
}

impl Scheduler for DagScheduler {
    fn next_batch(&self, plan: &Plan) -> Vec<usize> {
        let status_by_id: HashMap<&str, TaskStatus> = plan
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.status))
            .collect();

        plan.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| {
                task.status == TaskStatus::Pending
                    && task
                        .depends
                        .iter()
                        .all(|dep| status_by_id.get(dep.as_str()) == Some(&TaskStatus::Success))
            })
            .map(|(idx, _)| idx)
            .take(self.max_parallel)
            .collect()
    }
}
