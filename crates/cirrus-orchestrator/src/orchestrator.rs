//! Orchestrator: sequencing, policy gating, and rollback

use crate::audit::{AuditEvent, Auditor};
use crate::error::Result;
use crate::executor::Executor;
use crate::planner::Planner;
use crate::policy::PolicyEngine;
use crate::scheduler::Scheduler;
use cirrus_cloud::ControlPlane;
use cirrus_core::{ExecutionContext, Plan, TaskStatus};
use std::sync::Arc;

const POLICY_SUBJECT: &str = "ai-agent";

/// Central coordinator for cloud automation runs
///
/// Drives Planner → Scheduler → PolicyEngine → Executor(+ControlPlane) →
/// Auditor, and unwinds previously succeeded tasks in reverse order when
/// an execution failure propagates. Every collaborator is injected
/// through [`Orchestrator::new`]; the loop holds no logic of its own
/// beyond sequencing and failure semantics.
pub struct Orchestrator {
    planner: Box<dyn Planner>,
    policy: Box<dyn PolicyEngine>,
    scheduler: Box<dyn Scheduler>,
    executor: Box<dyn Executor>,
    control_plane: Arc<dyn ControlPlane>,
    auditor: Box<dyn Auditor>,
}

impl Orchestrator {
    pub fn new(
        planner: Box<dyn Planner>,
        policy: Box<dyn PolicyEngine>,
        scheduler: Box<dyn Scheduler>,
        executor: Box<dyn Executor>,
        control_plane: Arc<dyn ControlPlane>,
        auditor: Box<dyn Auditor>,
    ) -> Self {
        Self {
            planner,
            policy,
            scheduler,
            executor,
            control_plane,
            auditor,
        }
    }

    /// Execute a plan for a goal
    ///
    /// Returns `Err` only when planning fails. Task-level failures never
    /// surface here; callers inspect each task's status and error on the
    /// returned plan. The loop stops on the first empty batch — the
    /// scheduler does not distinguish a resolved plan from a permanently
    /// blocked one.
    pub async fn run(&mut self, goal: &str, ctx: &ExecutionContext) -> Result<Plan> {
        let mut plan = self.planner.plan(goal, ctx).await?;
        tracing::info!(goal = %goal, tasks = plan.tasks.len(), trace_id = %ctx.trace_id, "Plan created");
        self.auditor.record(AuditEvent::PlanCreated {
            plan: plan.goal.clone(),
            task_count: plan.tasks.len(),
        });

        // Rollback ordering history for this run, append-only
        let mut executed: Vec<usize> = Vec::new();

        loop {
            let batch = self.scheduler.next_batch(&plan);
            if batch.is_empty() {
                break;
            }
            for idx in batch {
                self.run_task(&mut plan, idx, &mut executed, ctx).await;
            }
        }

        self.auditor.record(AuditEvent::PlanCompleted {
            plan: plan.goal.clone(),
        });
        tracing::info!(goal = %goal, "Plan completed");
        Ok(plan)
    }

    /// Run one task through the policy-gated pipeline
    async fn run_task(
        &mut self,
        plan: &mut Plan,
        idx: usize,
        executed: &mut Vec<usize>,
        ctx: &ExecutionContext,
    ) {
        let (task_id, action, params) = {
            let task = &plan.tasks[idx];
            (task.id.clone(), task.action.clone(), task.params.clone())
        };

        let decision = self
            .policy
            .evaluate(POLICY_SUBJECT, &action, &params, ctx)
            .await;
        self.auditor.record(AuditEvent::PolicyDecision {
            task: task_id.clone(),
            action: action.clone(),
            decision: decision.decision,
            reason: decision.reason.clone(),
        });

        if !decision.is_allowed() {
            let reason = decision.reason.as_deref().unwrap_or("unknown");
            let task = &mut plan.tasks[idx];
            task.status = TaskStatus::Failed;
            task.error = Some(format!("Policy denied: {reason}"));
            tracing::warn!(task = %task_id, action = %action, reason = %reason, "Policy denied");
            return;
        }

        plan.tasks[idx].status = TaskStatus::Running;
        let control_plane = self.control_plane.clone();
        match self
            .executor
            .execute(&mut plan.tasks[idx], ctx, Some(control_plane.as_ref()))
            .await
        {
            Ok(()) => {
                // The baseline executor records failures as task state;
                // only a task it left in Success joins the rollback history
                let task = &plan.tasks[idx];
                if task.status == TaskStatus::Success {
                    executed.push(idx);
                    self.auditor.record(AuditEvent::TaskCompleted {
                        task: task_id,
                        action,
                        result: task.result.clone(),
                    });
                }
            }
            Err(e) => {
                let task = &mut plan.tasks[idx];
                task.status = TaskStatus::Failed;
                task.error = Some(e.to_string());
                tracing::warn!(task = %task_id, action = %action, error = %e, "Task failed");
                self.auditor.record(AuditEvent::TaskFailed {
                    task: task_id.clone(),
                    action,
                    error: e.to_string(),
                });
                self.rollback_executed(plan, &task_id, executed, ctx).await;
            }
        }
    }

    /// Best-effort, reverse-order rollback of previously succeeded tasks
    ///
    /// Always sequential: reverse order respects reverse-dependency
    /// safety. One task's rollback failure is recorded and the sweep
    /// continues over the rest.
    async fn rollback_executed(
        &mut self,
        plan: &mut Plan,
        failed_task: &str,
        executed: &[usize],
        ctx: &ExecutionContext,
    ) {
        self.auditor.record(AuditEvent::RollbackStarted {
            failed_task: failed_task.to_string(),
            rollback_count: executed.len(),
        });
        tracing::info!(failed_task = %failed_task, count = executed.len(), "Rolling back");

        let control_plane = self.control_plane.clone();
        for &idx in executed.iter().rev() {
            let result = self
                .executor
                .rollback(&mut plan.tasks[idx], ctx, Some(control_plane.as_ref()))
                .await;
            let task = &plan.tasks[idx];
            match result {
                Ok(()) => {
                    // Only tasks the executor actually unwound change status;
                    // actions without a rollback handler stay as they were
                    if task.status == TaskStatus::RolledBack {
                        self.auditor.record(AuditEvent::TaskRolledBack {
                            task: task.id.clone(),
                            action: task.action.clone(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(task = %task.id, error = %e, "Rollback failed");
                    self.auditor.record(AuditEvent::RollbackFailed {
                        task: task.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditor;
    use crate::error::EngineError;
    use crate::executor::{ActionHandler, SimpleExecutor};
    use crate::planner::Planner;
    use crate::policy::PolicyDecision;
    use crate::scheduler::DagScheduler;
    use async_trait::async_trait;
    use cirrus_cloud::{DefaultControlPlane, ProviderRegistry};
    use cirrus_core::Task;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedPlanner(Vec<Task>);

    #[async_trait]
    impl Planner for FixedPlanner {
        async fn plan(&self, goal: &str, _ctx: &ExecutionContext) -> Result<Plan> {
            Ok(Plan::new(goal, self.0.clone()))
        }

        async fn replan(
            &self,
            plan: &Plan,
            _failed_task: &Task,
            _ctx: &ExecutionContext,
        ) -> Result<Plan> {
            Ok(plan.clone())
        }
    }

    struct DenyAction(&'static str);

    #[async_trait]
    impl PolicyEngine for DenyAction {
        async fn evaluate(
            &self,
            _subject: &str,
            action: &str,
            _resource: &HashMap<String, serde_json::Value>,
            _ctx: &ExecutionContext,
        ) -> PolicyDecision {
            if action == self.0 {
                PolicyDecision::deny("not allowed").with_risk_score(90)
            } else {
                PolicyDecision::allow("safe operation")
            }
        }
    }

    struct AllowAll;

    #[async_trait]
    impl PolicyEngine for AllowAll {
        async fn evaluate(
            &self,
            _subject: &str,
            _action: &str,
            _resource: &HashMap<String, serde_json::Value>,
            _ctx: &ExecutionContext,
        ) -> PolicyDecision {
            PolicyDecision::allow("allowed")
        }
    }

    struct OkHandler;

    #[async_trait]
    impl ActionHandler for OkHandler {
        async fn run(
            &self,
            _params: &HashMap<String, serde_json::Value>,
            _ctx: &ExecutionContext,
            _cp: Option<&dyn ControlPlane>,
        ) -> anyhow::Result<serde_json::Value> {
            Ok(json!("ok"))
        }
    }

    struct BoomHandler;

    #[async_trait]
    impl ActionHandler for BoomHandler {
        async fn run(
            &self,
            _params: &HashMap<String, serde_json::Value>,
            _ctx: &ExecutionContext,
            _cp: Option<&dyn ControlPlane>,
        ) -> anyhow::Result<serde_json::Value> {
            anyhow::bail!("boom")
        }
    }

    /// Handler that records whether the control plane was handed over
    struct SpyHandler(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl ActionHandler for SpyHandler {
        async fn run(
            &self,
            _params: &HashMap<String, serde_json::Value>,
            _ctx: &ExecutionContext,
            _cp: Option<&dyn ControlPlane>,
        ) -> anyhow::Result<serde_json::Value> {
            self.0.lock().unwrap().push("called".to_string());
            Ok(json!(null))
        }
    }

    fn empty_control_plane() -> Arc<dyn ControlPlane> {
        Arc::new(DefaultControlPlane::new(ProviderRegistry::new()))
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("test-tenant", "cn-cd", "test", "trace-1")
    }

    fn orchestrator(
        tasks: Vec<Task>,
        policy: Box<dyn PolicyEngine>,
        executor: Box<dyn Executor>,
    ) -> Orchestrator {
        Orchestrator::new(
            Box::new(FixedPlanner(tasks)),
            policy,
            Box::new(DagScheduler::default()),
            executor,
            empty_control_plane(),
            Box::new(MemoryAuditor::new()),
        )
    }

    #[tokio::test]
    async fn test_policy_denial_short_circuits_executor() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut executor = SimpleExecutor::new();
        executor.register("deploy", Arc::new(OkHandler), None);
        executor.register("wipe", Arc::new(SpyHandler(calls.clone())), None);

        let tasks = vec![
            Task::new("t1", "Deploy", "deploy"),
            Task::new("t2", "Wipe", "wipe").with_depends(vec!["t1".into()]),
        ];
        let mut orch = orchestrator(tasks, Box::new(DenyAction("wipe")), Box::new(executor));
        let plan = orch.run("deploy then wipe", &ctx()).await.unwrap();

        assert_eq!(plan.task("t1").unwrap().status, TaskStatus::Success);
        let denied = plan.task("t2").unwrap();
        assert_eq!(denied.status, TaskStatus::Failed);
        assert_eq!(denied.error.as_deref(), Some("Policy denied: not allowed"));
        // The handler for the denied action was never invoked
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_swallowed_handler_failure_does_not_roll_back() {
        let mut executor = SimpleExecutor::new();
        executor.register("deploy", Arc::new(OkHandler), None);
        executor.register("boom", Arc::new(BoomHandler), None);

        let tasks = vec![
            Task::new("t1", "Deploy", "deploy"),
            Task::new("t2", "Boom", "boom").with_depends(vec!["t1".into()]),
        ];
        let mut orch = orchestrator(tasks, Box::new(AllowAll), Box::new(executor));
        let plan = orch.run("deploy then boom", &ctx()).await.unwrap();

        // The baseline executor captured the failure as task state, so the
        // orchestrator saw Ok and no rollback was triggered
        assert_eq!(plan.task("t1").unwrap().status, TaskStatus::Success);
        let failed = plan.task("t2").unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_propagating_executor_triggers_reverse_rollback() {
        /// Executor that succeeds normally but propagates for one action,
        /// and marks rollbacks directly
        struct PropagatingExecutor {
            fail_action: &'static str,
        }

        #[async_trait]
        impl Executor for PropagatingExecutor {
            async fn execute(
                &mut self,
                task: &mut Task,
                _ctx: &ExecutionContext,
                _cp: Option<&dyn ControlPlane>,
            ) -> Result<()> {
                if task.action == self.fail_action {
                    return Err(EngineError::Execution("handler exploded".to_string()));
                }
                task.status = TaskStatus::Success;
                task.result = Some(json!("done"));
                Ok(())
            }

            async fn rollback(
                &mut self,
                task: &mut Task,
                _ctx: &ExecutionContext,
                _cp: Option<&dyn ControlPlane>,
            ) -> Result<()> {
                task.status = TaskStatus::RolledBack;
                Ok(())
            }
        }

        let tasks = vec![
            Task::new("t1", "Deploy", "deploy"),
            Task::new("t2", "Boom", "boom").with_depends(vec!["t1".into()]),
        ];
        let mut orch = orchestrator(
            tasks,
            Box::new(AllowAll),
            Box::new(PropagatingExecutor { fail_action: "boom" }),
        );
        let plan = orch.run("deploy then boom", &ctx()).await.unwrap();

        assert_eq!(plan.task("t1").unwrap().status, TaskStatus::RolledBack);
        let failed = plan.task("t2").unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("Execution failed: handler exploded"));
    }
}
