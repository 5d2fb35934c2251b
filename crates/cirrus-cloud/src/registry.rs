//! Provider registry

use crate::error::{CloudError, Result};
use crate::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;

/// Name → provider lookup table
///
/// A name can be registered only once; call [`ProviderRegistry::unregister`]
/// first to replace an implementation.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under a name
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) -> Result<()> {
        let name = name.into();
        if self.providers.contains_key(&name) {
            return Err(CloudError::ProviderAlreadyRegistered(name));
        }
        tracing::debug!("Registered provider: {}", name);
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Get a registered provider
    ///
    /// The error for an unknown name lists the currently registered names.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| CloudError::ProviderNotFound {
                name: name.to_string(),
                available: self.list_providers(),
            })
    }

    /// Remove a provider registration
    pub fn unregister(&mut self, name: &str) -> Result<()> {
        if self.providers.remove(name).is_none() {
            return Err(CloudError::ProviderNotFound {
                name: name.to_string(),
                available: self.list_providers(),
            });
        }
        tracing::debug!("Unregistered provider: {}", name);
        Ok(())
    }

    /// All registered provider names, sorted for stable output
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}
