//! Coordination core error types

use thiserror::Error;

/// Errors surfaced by the coordination core
///
/// Task-level outcomes are state on the `Task`, never errors crossing the
/// executor boundary; `run` returns `Err` only when planning fails.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Planning failed: {0}")]
    Planning(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Rollback failed: {0}")]
    Rollback(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
