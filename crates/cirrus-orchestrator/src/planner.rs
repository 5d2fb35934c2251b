//! Goal → plan translation contract

use crate::error::Result;
use async_trait::async_trait;
use cirrus_core::{ExecutionContext, Plan, Task};
use serde_json::json;

/// Planning strategy
///
/// Turns a high-level goal into a plan of interdependent tasks. The
/// production implementation sits outside this crate (an LLM-backed
/// service); the core only depends on this contract.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Create a plan to achieve a goal
    async fn plan(&self, goal: &str, ctx: &ExecutionContext) -> Result<Plan>;

    /// Create a revised plan after a task failure
    ///
    /// Exposed for external callers; the run loop itself never replans.
    async fn replan(
        &self,
        plan: &Plan,
        failed_task: &Task,
        ctx: &ExecutionContext,
    ) -> Result<Plan>;
}

/// Deterministic planner producing the canonical web-service deployment
///
/// Emits the same four-task plan for any goal: a VPC, a security group
/// inside it, and an instance plus a database on top. Useful for demos
/// and for exercising the pipeline without an external planner.
pub struct RulePlanner {
    provider: String,
}

impl RulePlanner {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    fn deployment_tasks(&self, ctx: &ExecutionContext) -> Vec<Task> {
        let metadata = |name: &str| {
            json!({
                "name": name,
                "region": ctx.region,
                "env": ctx.env,
            })
        };

        vec![
            Task::new("vpc", "Create VPC", "create_vpc")
                .with_param("provider", json!(self.provider))
                .with_param("metadata", metadata("main-vpc"))
                .with_param("spec", json!({ "cidr": "10.0.0.0/16" })),
            Task::new("sg", "Create security group", "create_security_group")
                .with_param("provider", json!(self.provider))
                .with_param("metadata", metadata("web-sg"))
                .with_param(
                    "spec",
                    json!({
                        "description": "Web tier ingress",
                        "rules": [{ "port": 443, "cidr": "0.0.0.0/0" }],
                    }),
                )
                .with_depends(vec!["vpc".to_string()]),
            Task::new("web", "Create web instance", "create_instance")
                .with_param("provider", json!(self.provider))
                .with_param("metadata", metadata("web-01"))
                .with_param("spec", json!({ "instance_type": "t3.medium", "count": 2 }))
                .with_depends(vec!["vpc".to_string(), "sg".to_string()]),
            Task::new("db", "Create database", "create_database")
                .with_param("provider", json!(self.provider))
                .with_param("metadata", metadata("app-db"))
                .with_param("spec", json!({ "engine": "mysql", "storage": 100 }))
                .with_depends(vec!["vpc".to_string()]),
        ]
    }
}

#[async_trait]
impl Planner for RulePlanner {
    async fn plan(&self, goal: &str, ctx: &ExecutionContext) -> Result<Plan> {
        tracing::debug!(goal = %goal, "Building deployment plan");
        Ok(Plan::new(goal, self.deployment_tasks(ctx)))
    }

    /// A rule planner has exactly one answer per goal, so replanning
    /// regenerates that plan from scratch
    async fn replan(
        &self,
        plan: &Plan,
        failed_task: &Task,
        ctx: &ExecutionContext,
    ) -> Result<Plan> {
        tracing::debug!(goal = %plan.goal, failed = %failed_task.id, "Replanning");
        self.plan(&plan.goal, ctx).await
    }
}
