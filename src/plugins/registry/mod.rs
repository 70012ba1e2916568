//! Registry plugins persisting the synchronized dataset
//!
//! This module contains the registry backends services are written to:
//! - Consul (agent HTTP API)

pub mod traits;

// Registry plugin implementations
pub mod consul;

use std::sync::Arc;

use crate::error::PluginError;

pub use traits::{Registry, RegistryProvider};

#[cfg(test)]
pub use traits::MockRegistry;

/// Registration table of every available registry provider
pub fn providers() -> Vec<Arc<dyn RegistryProvider>> {
    vec![Arc::new(consul::ConsulRegistryProvider)]
}

/// Look up a registry provider by name
pub fn find_provider(name: &str) -> Result<Arc<dyn RegistryProvider>, PluginError> {
    providers()
        .into_iter()
        .find(|p| p.name() == name)
        .ok_or_else(|| PluginError::NotFound(name.to_string()))
}
