//! Control plane: resource lifecycle bookkeeping across providers

use crate::error::{CloudError, Result};
use crate::provider::StateMap;
use crate::registry::ProviderRegistry;
use crate::resource::{Resource, ResourceStatus, ResourceStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Result of a successful `apply`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedResource {
    pub resource_id: String,
    pub kind: String,
    pub status: ResourceStatus,
    pub state: StateMap,
}

/// Full view of a resource returned by `get`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceView {
    pub resource_id: String,
    pub kind: String,
    pub status: ResourceStatus,
    pub spec: StateMap,
    pub state: StateMap,
    pub created_at: DateTime<Utc>,
}

/// Summary row returned by `list_resources`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub resource_id: String,
    pub kind: String,
    pub provider: String,
    pub status: ResourceStatus,
    pub created_at: DateTime<Utc>,
}

/// Resource lifecycle operations exposed to action handlers
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Provision a resource from a specification
    async fn apply(&self, kind: &str, spec: StateMap) -> Result<AppliedResource>;

    /// Current view of a resource, refreshed from its provider
    async fn get(&self, resource_id: &str) -> Result<ResourceView>;

    /// Remove the local record; returns `false` when the id is unknown
    async fn delete(&self, resource_id: &str) -> Result<bool>;

    /// Summaries of tracked resources, optionally filtered by kind
    async fn list_resources(&self, kind: Option<&str>) -> Result<Vec<ResourceSummary>>;
}

/// Default control plane backed by a provider registry and an in-memory store
///
/// The store sits behind a lock so one instance can be shared behind an
/// `Arc`; all mutation goes through `&self` methods.
pub struct DefaultControlPlane {
    registry: ProviderRegistry,
    store: RwLock<ResourceStore>,
}

impl DefaultControlPlane {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            store: RwLock::new(ResourceStore::new()),
        }
    }

    /// The provider registry backing this control plane
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn provider_name(spec: &StateMap) -> Result<String> {
        spec.get("provider")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(CloudError::MissingProviderField)
    }
}

#[async_trait]
impl ControlPlane for DefaultControlPlane {
    /// Provision a resource
    ///
    /// Persists a `Provisioning` record before the provider call so a
    /// crashed or failed apply still leaves a queryable trace. On provider
    /// failure the record is marked `Failed` with the error captured in
    /// its state, and the original error is returned to the caller.
    async fn apply(&self, kind: &str, spec: StateMap) -> Result<AppliedResource> {
        let provider_name = Self::provider_name(&spec)?;
        let provider = self.registry.get(&provider_name)?;

        let resource_id = Uuid::new_v4().to_string();
        let mut resource = Resource::new(&resource_id, kind, &provider_name, spec.clone())
            .with_status(ResourceStatus::Provisioning);
        self.store.write().await.save(resource.clone());

        tracing::debug!(
            resource_id = %resource_id,
            kind = %kind,
            provider = %provider_name,
            "Provisioning resource"
        );

        match provider.apply(kind, &spec).await {
            Ok(state) => {
                resource.state = state;
                resource.status = ResourceStatus::Ready;
                self.store.write().await.update(resource.clone());

                tracing::info!(resource_id = %resource_id, kind = %kind, "Resource ready");
                Ok(AppliedResource {
                    resource_id: resource.id,
                    kind: resource.kind,
                    status: resource.status,
                    state: resource.state,
                })
            }
            Err(e) => {
                resource.status = ResourceStatus::Failed;
                resource.state = StateMap::from([(
                    "error".to_string(),
                    serde_json::Value::String(e.to_string()),
                )]);
                self.store.write().await.update(resource);

                tracing::warn!(resource_id = %resource_id, kind = %kind, error = %e, "Provisioning failed");
                Err(e)
            }
        }
    }

    /// Current view of a resource
    ///
    /// Reconciles the stored record with a fresh provider query. A failed
    /// provider query degrades rather than fails: the last stored state is
    /// returned with an `error` field appended.
    async fn get(&self, resource_id: &str) -> Result<ResourceView> {
        let resource = {
            let store = self.store.read().await;
            store
                .get(resource_id)
                .cloned()
                .ok_or_else(|| CloudError::ResourceNotFound(resource_id.to_string()))?
        };

        let provider = self.registry.get(&resource.provider)?;

        let state = match provider.get(&resource.kind, &resource.state).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                tracing::warn!(
                    resource_id = %resource_id,
                    error = %e,
                    "Provider query failed, falling back to stored state"
                );
                let mut stale = resource.state.clone();
                stale.insert(
                    "error".to_string(),
                    serde_json::Value::String(e.to_string()),
                );
                stale
            }
        };

        Ok(ResourceView {
            resource_id: resource.id,
            kind: resource.kind,
            status: resource.status,
            spec: resource.spec,
            state,
            created_at: resource.created_at,
        })
    }

    /// Remove the local record only
    ///
    /// Provider-side teardown is deliberately not invoked; the control
    /// plane tracks bookkeeping, it does not destroy cloud resources.
    async fn delete(&self, resource_id: &str) -> Result<bool> {
        let deleted = self.store.write().await.delete(resource_id);
        if deleted {
            tracing::debug!(resource_id = %resource_id, "Removed resource record");
        }
        Ok(deleted)
    }

    async fn list_resources(&self, kind: Option<&str>) -> Result<Vec<ResourceSummary>> {
        let store = self.store.read().await;
        let mut summaries: Vec<ResourceSummary> = store
            .list()
            .into_iter()
            .filter(|r| kind.is_none_or(|k| r.kind == k))
            .map(|r| ResourceSummary {
                resource_id: r.id.clone(),
                kind: r.kind.clone(),
                provider: r.provider.clone(),
                status: r.status,
                created_at: r.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(summaries)
    }
}
