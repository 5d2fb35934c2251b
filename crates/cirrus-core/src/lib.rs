//! Cirrus core data model
//!
//! This crate holds the value objects shared by every Cirrus component:
//! tasks, plans, the task status vocabulary, and the per-run execution
//! context. It carries no behavior beyond construction helpers — the
//! scheduler, executor, and orchestrator own all state transitions.

pub mod context;
pub mod task;

// Re-exports
pub use context::ExecutionContext;
pub use task::{Plan, Task, TaskStatus};
