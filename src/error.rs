//! Application error types for pinchy
//!
//! This module defines the error types shared by the sync core, the
//! source/registry plugins and the CLI. All error types use `thiserror`.

use thiserror::Error;

/// Errors raised while fetching the dataset from a source
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    /// The backing data could not be read
    #[error("Failed to read source data: {0}")]
    Read(String),

    /// The backing data could not be decoded
    #[error("Failed to parse source data: {0}")]
    Parse(String),

    /// Generic network error
    #[error("Network error: {0}")]
    Network(String),
}

/// Errors raised by a registry client
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    /// Network timeout
    #[error("Network timeout")]
    NetworkTimeout,

    /// Connection refused
    #[error("Connection refused")]
    ConnectionRefused,

    /// Unauthorized
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found
    #[error("Resource not found")]
    NotFound,

    /// Server error
    #[error("Server error: HTTP {0}")]
    ServerError(u16),

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Generic network error
    #[error("Network error: {0}")]
    Network(String),
}

/// Service definition validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Service name is empty
    #[error("service name is empty")]
    EmptyName,

    /// Service address is empty
    #[error("service address is empty")]
    EmptyAddress,

    /// Service port is zero
    #[error("service port must be greater than zero")]
    InvalidPort,

    /// Same id appears twice in one dataset
    #[error("duplicate service id: {0}")]
    DuplicateId(String),
}

/// Errors returned by a single manager run
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ManagerError {
    /// The run was cancelled before it completed
    #[error("manager run cancelled")]
    Cancelled,

    /// Fetching the dataset failed
    #[error("failed to fetch services from source: {0}")]
    Fetch(#[source] SourceError),

    /// Listing the registry's managed services failed
    #[error("failed to list services in registry: {0}")]
    List(#[source] RegistryError),

    /// A fetched service failed validation
    #[error("invalid service \"{id}\": {source}")]
    InvalidService {
        /// Service id
        id: String,
        /// Cause
        source: ValidationError,
    },

    /// Writing a service to the registry failed
    #[error("failed to register service \"{id}\": {source}")]
    Register {
        /// Service id
        id: String,
        /// Cause
        source: RegistryError,
    },

    /// Removing a stale service from the registry failed
    #[error("failed to deregister service \"{id}\": {source}")]
    Deregister {
        /// Service id
        id: String,
        /// Cause
        source: RegistryError,
    },
}

impl ManagerError {
    /// Returns true for failures scoped to a single service
    pub fn is_item_failure(&self) -> bool {
        matches!(
            self,
            ManagerError::InvalidService { .. }
                | ManagerError::Register { .. }
                | ManagerError::Deregister { .. }
        )
    }
}

/// Plugin-related errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PluginError {
    /// Plugin not found
    #[error("Plugin not found: {0}")]
    NotFound(String),

    /// Plugin initialization failed
    #[error("Plugin initialization failed: {0}")]
    InitializationFailed(String),

    /// Plugin configuration invalid
    #[error("Invalid plugin configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Application-level error type
///
/// Aggregates the domain-specific error types for callers that
/// do not care which layer failed.
#[derive(Debug, Error)]
pub enum AppError {
    /// Manager run error
    #[error("Manager error: {0}")]
    Manager(#[from] ManagerError),

    /// Plugin error
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging setup error
    #[error("Logging error: {0}")]
    Logging(String),
}
