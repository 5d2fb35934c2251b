//! Cloud provider trait definition

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Provider-reported resource state, as a free-form JSON map
pub type StateMap = HashMap<String, serde_json::Value>;

/// Cloud provider abstraction trait
///
/// All cloud providers (Ctyun, AWS, GCP, etc.) implement this trait to
/// provide a unified interface for resource provisioning. A provider is
/// polymorphic over a closed set of supported kinds; an unsupported kind
/// fails with [`crate::CloudError::UnsupportedKind`].
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Returns the provider name (e.g., "ctyun", "aws")
    fn name(&self) -> &str;

    /// Apply (create or update) a resource of the given kind
    ///
    /// Returns the provider's view of the resource state after the
    /// operation, including generated identifiers.
    async fn apply(&self, kind: &str, spec: &StateMap) -> Result<StateMap>;

    /// Refresh the state of an existing resource
    ///
    /// `state` is the last known state, carrying the identifiers the
    /// provider needs to locate the resource.
    async fn get(&self, kind: &str, state: &StateMap) -> Result<StateMap>;
}
