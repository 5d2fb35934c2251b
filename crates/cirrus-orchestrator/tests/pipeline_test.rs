//! End-to-end pipeline tests: planner → scheduler → policy → executor →
//! control plane → auditor, including rollback semantics.

use async_trait::async_trait;
use cirrus_cloud::{ControlPlane, DefaultControlPlane, ProviderRegistry};
use cirrus_cloud_ctyun::CtyunProvider;
use cirrus_core::{ExecutionContext, Plan, Task, TaskStatus};
use cirrus_orchestrator::{
    ActionHandler, AuditEvent, Auditor, DagScheduler, EngineError, Executor, MemoryAuditor,
    Orchestrator, Planner, PolicyDecision, PolicyEngine, RulePlanner, SimpleExecutor,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn ctx() -> ExecutionContext {
    ExecutionContext::new("acme", "cn-cd", "staging", "trace-e2e")
}

fn ctyun_control_plane() -> Arc<DefaultControlPlane> {
    let mut registry = ProviderRegistry::new();
    registry
        .register("ctyun", Arc::new(CtyunProvider::default()))
        .unwrap();
    Arc::new(DefaultControlPlane::new(registry))
}

/// Auditor whose event log stays observable after the orchestrator takes
/// ownership of the boxed sink
#[derive(Clone, Default)]
struct SharedAuditor(Arc<Mutex<Vec<AuditEvent>>>);

impl SharedAuditor {
    fn events(&self) -> Vec<AuditEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl Auditor for SharedAuditor {
    fn record(&mut self, event: AuditEvent) {
        self.0.lock().unwrap().push(event);
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
        PolicyDecision::allow("allowed").with_risk_score(10)
    }
}

struct FixedPlanner(Vec<Task>);

#[async_trait]
impl Planner for FixedPlanner {
    async fn plan(&self, goal: &str, _ctx: &ExecutionContext) -> cirrus_orchestrator::Result<Plan> {
        Ok(Plan::new(goal, self.0.clone()))
    }

    async fn replan(
        &self,
        plan: &Plan,
        _failed_task: &Task,
        _ctx: &ExecutionContext,
    ) -> cirrus_orchestrator::Result<Plan> {
        Ok(plan.clone())
    }
}

/// Handler that provisions a resource of a fixed kind through the control plane
struct ApplyHandler {
    kind: &'static str,
}

#[async_trait]
impl ActionHandler for ApplyHandler {
    async fn run(
        &self,
        params: &HashMap<String, serde_json::Value>,
        _ctx: &ExecutionContext,
        control_plane: Option<&dyn ControlPlane>,
    ) -> anyhow::Result<serde_json::Value> {
        let Some(cp) = control_plane else {
            anyhow::bail!("control plane not wired");
        };
        let applied = cp.apply(self.kind, params.clone()).await?;
        Ok(serde_json::to_value(applied)?)
    }
}

/// Handler that records the order tasks were executed in
struct OrderHandler {
    order: Arc<Mutex<Vec<String>>>,
    id: &'static str,
}

#[async_trait]
impl ActionHandler for OrderHandler {
    async fn run(
        &self,
        _params: &HashMap<String, serde_json::Value>,
        _ctx: &ExecutionContext,
        _cp: Option<&dyn ControlPlane>,
    ) -> anyhow::Result<serde_json::Value> {
        self.order.lock().unwrap().push(self.id.to_string());
        Ok(json!(null))
    }
}

fn deployment_executor() -> SimpleExecutor {
    let mut executor = SimpleExecutor::new();
    executor.register("create_vpc", Arc::new(ApplyHandler { kind: "VPC" }), None);
    executor.register(
        "create_security_group",
        Arc::new(ApplyHandler { kind: "SecurityGroup" }),
        None,
    );
    executor.register(
        "create_instance",
        Arc::new(ApplyHandler { kind: "Instance" }),
        None,
    );
    executor.register(
        "create_database",
        Arc::new(ApplyHandler { kind: "Database" }),
        None,
    );
    executor
}

#[tokio::test]
async fn test_full_deployment_pipeline() {
    let control_plane = ctyun_control_plane();
    let auditor = SharedAuditor::default();

    let mut orchestrator = Orchestrator::new(
        Box::new(RulePlanner::new("ctyun")),
        Box::new(AllowAll),
        Box::new(DagScheduler::default()),
        Box::new(deployment_executor()),
        control_plane.clone(),
        Box::new(auditor.clone()),
    );

    let plan = orchestrator
        .run("deploy production web service", &ctx())
        .await
        .unwrap();

    assert!(
        plan.tasks.iter().all(|t| t.status == TaskStatus::Success),
        "all tasks should succeed: {:?}",
        plan.tasks
            .iter()
            .map(|t| (&t.id, t.status, &t.error))
            .collect::<Vec<_>>()
    );

    // The control plane tracked one resource per task
    let resources = control_plane.list_resources(None).await.unwrap();
    assert_eq!(resources.len(), 4);
    assert_eq!(
        control_plane.list_resources(Some("VPC")).await.unwrap().len(),
        1
    );

    // Audit trail: plan_created first, plan_completed last, one policy
    // decision and one completion per task
    let events = auditor.events();
    assert!(matches!(events.first(), Some(AuditEvent::PlanCreated { task_count: 4, .. })));
    assert!(matches!(events.last(), Some(AuditEvent::PlanCompleted { .. })));
    let completions = events
        .iter()
        .filter(|e| matches!(e, AuditEvent::TaskCompleted { .. }))
        .count();
    assert_eq!(completions, 4);
}

#[tokio::test]
async fn test_batches_respect_dependency_order() {
    // Scenario A: t1 ← {t2, t3}; t1 runs alone, then t2 before t3
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut executor = SimpleExecutor::new();
    for id in ["a1", "a2", "a3"] {
        executor.register(
            id,
            Arc::new(OrderHandler {
                order: order.clone(),
                id: match id {
                    "a1" => "t1",
                    "a2" => "t2",
                    _ => "t3",
                },
            }),
            None,
        );
    }

    let tasks = vec![
        Task::new("t1", "Root", "a1"),
        Task::new("t2", "Left", "a2").with_depends(vec!["t1".into()]),
        Task::new("t3", "Right", "a3").with_depends(vec!["t1".into()]),
    ];
    let mut orchestrator = Orchestrator::new(
        Box::new(FixedPlanner(tasks)),
        Box::new(AllowAll),
        Box::new(DagScheduler::default()),
        Box::new(executor),
        ctyun_control_plane(),
        Box::new(MemoryAuditor::new()),
    );

    let plan = orchestrator.run("fan out", &ctx()).await.unwrap();
    assert!(plan.tasks.iter().all(|t| t.status == TaskStatus::Success));
    assert_eq!(*order.lock().unwrap(), vec!["t1", "t2", "t3"]);
}

#[tokio::test]
async fn test_policy_denial_blocks_task_and_downstream() {
    // Scenario B: t2 is denied; its handler never runs and t1 stays the
    // only executed task
    struct DenySecond;

    #[async_trait]
    impl PolicyEngine for DenySecond {
        async fn evaluate(
            &self,
            _subject: &str,
            action: &str,
            _resource: &HashMap<String, serde_json::Value>,
            _ctx: &ExecutionContext,
        ) -> PolicyDecision {
            if action == "a2" {
                PolicyDecision::deny("not allowed")
            } else {
                PolicyDecision::allow("safe")
            }
        }
    }

    let order = Arc::new(Mutex::new(Vec::new()));
    let mut executor = SimpleExecutor::new();
    executor.register(
        "a1",
        Arc::new(OrderHandler { order: order.clone(), id: "t1" }),
        None,
    );
    executor.register(
        "a2",
        Arc::new(OrderHandler { order: order.clone(), id: "t2" }),
        None,
    );

    let tasks = vec![
        Task::new("t1", "First", "a1"),
        Task::new("t2", "Second", "a2").with_depends(vec!["t1".into()]),
    ];
    let auditor = SharedAuditor::default();
    let mut orchestrator = Orchestrator::new(
        Box::new(FixedPlanner(tasks)),
        Box::new(DenySecond),
        Box::new(DagScheduler::default()),
        Box::new(executor),
        ctyun_control_plane(),
        Box::new(auditor.clone()),
    );

    let plan = orchestrator.run("gated", &ctx()).await.unwrap();

    assert_eq!(plan.task("t1").unwrap().status, TaskStatus::Success);
    let denied = plan.task("t2").unwrap();
    assert_eq!(denied.status, TaskStatus::Failed);
    assert_eq!(denied.error.as_deref(), Some("Policy denied: not allowed"));
    assert_eq!(*order.lock().unwrap(), vec!["t1"]);

    // Both evaluations were audited, including the denial
    let decisions: Vec<_> = auditor
        .events()
        .into_iter()
        .filter(|e| matches!(e, AuditEvent::PolicyDecision { .. }))
        .collect();
    assert_eq!(decisions.len(), 2);
}

#[tokio::test]
async fn test_executor_failure_rolls_back_in_reverse() {
    // Scenario C: a propagating executor fails t2, so t1 is unwound
    struct PropagatingExecutor {
        inner: SimpleExecutor,
        fail_action: &'static str,
    }

    #[async_trait]
    impl Executor for PropagatingExecutor {
        async fn execute(
            &mut self,
            task: &mut Task,
            ctx: &ExecutionContext,
            cp: Option<&dyn ControlPlane>,
        ) -> cirrus_orchestrator::Result<()> {
            if task.action == self.fail_action {
                return Err(EngineError::Execution("handler exploded".to_string()));
            }
            self.inner.execute(task, ctx, cp).await
        }

        async fn rollback(
            &mut self,
            task: &mut Task,
            ctx: &ExecutionContext,
            cp: Option<&dyn ControlPlane>,
        ) -> cirrus_orchestrator::Result<()> {
            self.inner.rollback(task, ctx, cp).await
        }
    }

    struct NoopRollback;

    #[async_trait]
    impl cirrus_orchestrator::RollbackHandler for NoopRollback {
        async fn run(
            &self,
            _params: &HashMap<String, serde_json::Value>,
            _ctx: &ExecutionContext,
            _cp: Option<&dyn ControlPlane>,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    let order = Arc::new(Mutex::new(Vec::new()));
    let mut inner = SimpleExecutor::new();
    inner.register(
        "a1",
        Arc::new(OrderHandler { order: order.clone(), id: "t1" }),
        Some(Arc::new(NoopRollback)),
    );

    let tasks = vec![
        Task::new("t1", "First", "a1"),
        Task::new("t2", "Second", "a2").with_depends(vec!["t1".into()]),
    ];
    let auditor = SharedAuditor::default();
    let mut orchestrator = Orchestrator::new(
        Box::new(FixedPlanner(tasks)),
        Box::new(AllowAll),
        Box::new(DagScheduler::default()),
        Box::new(PropagatingExecutor { inner, fail_action: "a2" }),
        ctyun_control_plane(),
        Box::new(auditor.clone()),
    );

    let plan = orchestrator.run("fail and unwind", &ctx()).await.unwrap();

    assert_eq!(plan.task("t1").unwrap().status, TaskStatus::RolledBack);
    assert_eq!(plan.task("t2").unwrap().status, TaskStatus::Failed);

    let events = auditor.events();
    assert!(events.iter().any(|e| matches!(
        e,
        AuditEvent::RollbackStarted { rollback_count: 1, .. }
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, AuditEvent::TaskRolledBack { task, .. } if task == "t1")));
}

#[tokio::test]
async fn test_registry_error_names_registered_providers() {
    // Scenario D: only "ctyun" is registered; asking for "aws" names it
    let mut registry = ProviderRegistry::new();
    registry
        .register("ctyun", Arc::new(CtyunProvider::default()))
        .unwrap();

    let err = registry.get("aws").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Provider aws not found. Available: [\"ctyun\"]"
    );
}

#[tokio::test]
async fn test_apply_then_get_through_real_provider() {
    let control_plane = ctyun_control_plane();
    let spec = HashMap::from([
        ("provider".to_string(), json!("ctyun")),
        ("metadata".to_string(), json!({ "name": "main-vpc" })),
        ("spec".to_string(), json!({ "cidr": "10.1.0.0/16" })),
    ]);

    let applied = control_plane.apply("VPC", spec).await.unwrap();
    let view = control_plane.get(&applied.resource_id).await.unwrap();

    assert_eq!(view.kind, "VPC");
    assert_eq!(view.state, applied.state);
    assert_eq!(view.state["cidr"], json!("10.1.0.0/16"));
    assert_eq!(view.spec["metadata"], json!({ "name": "main-vpc" }));
}
