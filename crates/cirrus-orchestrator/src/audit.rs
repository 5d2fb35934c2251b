//! Audit event emission

use crate::policy::Verdict;
use serde::{Deserialize, Serialize};

/// Structured record of a decision or state change during a run
///
/// Serializes to a map tagged by `event`, e.g.
/// `{"event": "policy_decision", "task": "vpc", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    PlanCreated {
        plan: String,
        task_count: usize,
    },
    PlanCompleted {
        plan: String,
    },
    PolicyDecision {
        task: String,
        action: String,
        decision: Verdict,
        reason: Option<String>,
    },
    TaskCompleted {
        task: String,
        action: String,
        result: Option<serde_json::Value>,
    },
    TaskFailed {
        task: String,
        action: String,
        error: String,
    },
    RollbackStarted {
        failed_task: String,
        rollback_count: usize,
    },
    TaskRolledBack {
        task: String,
        action: String,
    },
    RollbackFailed {
        task: String,
        error: String,
    },
}

/// Audit sink
///
/// Persistence is an external concern; the core only emits events.
pub trait Auditor: Send + Sync {
    fn record(&mut self, event: AuditEvent);
}

/// Auditor keeping events in memory
///
/// Backs tests and demos; a production sink would forward events to
/// durable storage instead.
#[derive(Default)]
pub struct MemoryAuditor {
    events: Vec<AuditEvent>,
}

impl MemoryAuditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events (defensive copy)
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.clone()
    }
}

impl Auditor for MemoryAuditor {
    fn record(&mut self, event: AuditEvent) {
        tracing::info!(?event, "audit");
        self.events.push(event);
    }
}
