//! Cirrus coordination core
//!
//! Drives declarative cloud operations end to end: a goal becomes a plan
//! of interdependent tasks, tasks are released in dependency-ready
//! batches, each task is gated by a policy decision, executed through the
//! action-handler table against the control plane, and audited; on
//! failure, previously succeeded tasks are unwound in reverse order.
//!
//! # Pipeline
//!
//! ```text
//! goal ──▶ Planner ──▶ Plan
//!                        │
//!          ┌─────────────▼──────────────┐
//!          │ loop: Scheduler.next_batch │
//!          │   ├─ PolicyEngine.evaluate │
//!          │   ├─ Executor.execute ─────┼──▶ ControlPlane ──▶ Provider
//!          │   └─ Auditor.record        │
//!          └─────────────┬──────────────┘
//!                        │ on failure
//!                 reverse-order rollback
//! ```
//!
//! Every role is a trait injected through the [`Orchestrator`]
//! constructor; swap any collaborator without touching the loop.

pub mod audit;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod policy;
pub mod scheduler;

// Re-exports
pub use audit::{AuditEvent, Auditor, MemoryAuditor};
pub use error::{EngineError, Result};
pub use executor::{
    ActionHandler, ExecutionRecord, Executor, ExecutorStats, RollbackHandler, RollbackRecord,
    SimpleExecutor, TaskOutcome,
};
pub use orchestrator::Orchestrator;
pub use planner::{Planner, RulePlanner};
pub use policy::{PolicyDecision, PolicyEngine, Verdict};
pub use scheduler::{DagScheduler, Scheduler};
