//! Registry plugin trait definitions
//!
//! This module defines the client a registry backend exposes to the
//! manager and the provider surface used to build it from CLI flags.

use async_trait::async_trait;
use clap::{Arg, ArgMatches};
use std::sync::Arc;

use crate::error::{PluginError, RegistryError};
use crate::models::Service;

/// Client persisting services into a registry backend
///
/// Implementations only report on services they created themselves from
/// [`Registry::services`]; entries registered by other tools are never
/// candidates for removal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Registry: Send + Sync {
    /// Get the registry name
    fn name(&self) -> &str;

    /// Create or update a service
    async fn register(&self, service: &Service) -> Result<(), RegistryError>;

    /// Remove a service by id
    async fn deregister(&self, id: &str) -> Result<(), RegistryError>;

    /// Ids of the services currently managed by pinchy
    async fn services(&self) -> Result<Vec<String>, RegistryError>;
}

/// Factory and flag surface of a registry backend
pub trait RegistryProvider: Send + Sync {
    /// Stable identifier, used as the CLI command name
    fn name(&self) -> &'static str;

    /// Flags specific to this registry
    fn flags(&self) -> Vec<Arg>;

    /// Build a registry client from resolved arguments
    fn factory(&self, matches: &ArgMatches) -> Result<Arc<dyn Registry>, PluginError>;
}
