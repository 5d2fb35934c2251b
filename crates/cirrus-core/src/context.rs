//! Per-run execution context

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable identity and environment data for a single run
///
/// Passed by reference, unmodified, to every handler, policy check, and
/// provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Tenant the run acts on behalf of
    pub tenant: String,

    /// Target cloud region
    pub region: String,

    /// Deployment environment (e.g., "dev", "staging", "prod")
    pub env: String,

    /// Correlation id threaded through audit events and logs
    pub trace_id: String,

    /// Free-form string metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ExecutionContext {
    pub fn new(
        tenant: impl Into<String>,
        region: impl Into<String>,
        env: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            region: region.into(),
            env: env.into(),
            trace_id: trace_id.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}
