//! Control plane error types

use thiserror::Error;

/// Control plane and provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Specification must include 'provider' field")]
    MissingProviderField,

    #[error("Provider {name} not found. Available: {available:?}")]
    ProviderNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Provider {0} is already registered")]
    ProviderAlreadyRegistered(String),

    #[error("Resource {0} not found")]
    ResourceNotFound(String),

    #[error("Unsupported resource kind: {0}")]
    UnsupportedKind(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
