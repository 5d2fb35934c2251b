//! Ctyun provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CtyunError {
    #[error("Provider mismatch: expected ctyun, got {0}")]
    ProviderMismatch(String),

    #[error("Unsupported resource kind: {0}")]
    UnsupportedKind(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CtyunError> for cirrus_cloud::CloudError {
    fn from(err: CtyunError) -> Self {
        match err {
            CtyunError::UnsupportedKind(kind) => cirrus_cloud::CloudError::UnsupportedKind(kind),
            other => cirrus_cloud::CloudError::Provider(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CtyunError>;
