//! Service definition model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;

/// A single service definition moved from a source into a registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Explicit service id (defaults to the name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Service name
    pub name: String,

    /// Host or IP the service listens on
    pub address: String,

    /// Port the service listens on
    pub port: u16,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Key/value metadata
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl Service {
    /// Create a new service definition
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            id: None,
            name: name.into(),
            address: address.into(),
            port,
            tags: Vec::new(),
            meta: BTreeMap::new(),
        }
    }

    /// Set an explicit id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Effective id: the explicit id when set and non-empty, the name otherwise
    pub fn id(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.name,
        }
    }

    /// Check the definition is complete enough to be registered
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.address.trim().is_empty() {
            return Err(ValidationError::EmptyAddress);
        }
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Outcome counters of one manager run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Services written to the registry
    pub registered: u64,

    /// Stale services removed from the registry
    pub deregistered: u64,

    /// Services skipped because of an item failure
    pub failed: u64,
}

impl SyncResult {
    /// Whether every item of the run succeeded
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
