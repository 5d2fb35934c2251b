//! Resource records and the control plane's private store

use crate::provider::StateMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status of a managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Record exists but provisioning has not started
    Pending,
    /// Provider call is in flight
    Provisioning,
    /// Provider reported success
    Ready,
    /// Provider call failed; the record stays queryable
    Failed,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Pending => write!(f, "pending"),
            ResourceStatus::Provisioning => write!(f, "provisioning"),
            ResourceStatus::Ready => write!(f, "ready"),
            ResourceStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A tracked cloud resource with a desired spec and an observed state
///
/// The id is generated at creation and never changes. The control plane's
/// store entry is the sole authority on a resource's existence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Opaque identifier, immutable after creation
    pub id: String,

    /// Resource type tag (e.g., "VPC", "Instance")
    pub kind: String,

    /// Name of the owning provider
    pub provider: String,

    /// Desired-state map, as submitted
    pub spec: StateMap,

    /// Provider-reported actual-state map
    pub state: StateMap,

    /// Current lifecycle status
    pub status: ResourceStatus,

    /// When the record was created locally
    pub created_at: DateTime<Utc>,
}

impl Resource {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        provider: impl Into<String>,
        spec: StateMap,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            provider: provider.into(),
            spec,
            state: StateMap::new(),
            status: ResourceStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status == ResourceStatus::Ready
    }

    pub fn is_failed(&self) -> bool {
        self.status == ResourceStatus::Failed
    }

    pub fn is_provisioning(&self) -> bool {
        self.status == ResourceStatus::Provisioning
    }
}

/// In-memory resource store
///
/// Owned solely by one control plane instance; never shared or global.
/// A persistent deployment would back this with a database, keeping the
/// same interface.
#[derive(Default)]
pub struct ResourceStore {
    resources: HashMap<String, Resource>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a resource record
    pub fn save(&mut self, resource: Resource) {
        self.resources.insert(resource.id.clone(), resource);
    }

    pub fn get(&self, resource_id: &str) -> Option<&Resource> {
        self.resources.get(resource_id)
    }

    /// Update an existing record; no-op if the id is unknown
    pub fn update(&mut self, resource: Resource) {
        if self.resources.contains_key(&resource.id) {
            self.resources.insert(resource.id.clone(), resource);
        }
    }

    /// Remove a record, returning whether it existed
    pub fn delete(&mut self, resource_id: &str) -> bool {
        self.resources.remove(resource_id).is_some()
    }

    pub fn list(&self) -> Vec<&Resource> {
        self.resources.values().collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
