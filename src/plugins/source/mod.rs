//! Source plugins providing the dataset to synchronize
//!
//! - [`traits`]: The `Source` client and `SourceProvider` traits
//! - [`file`]: Service definitions read from a YAML/JSON file

pub mod file;
pub mod traits;

use std::sync::Arc;

use crate::error::PluginError;

pub use traits::{Source, SourceProvider};

#[cfg(test)]
pub use traits::MockSource;

/// Registration table of every available source provider
pub fn providers() -> Vec<Arc<dyn SourceProvider>> {
    vec![Arc::new(file::FileSourceProvider)]
}

/// Look up a source provider by name
pub fn find_provider(name: &str) -> Result<Arc<dyn SourceProvider>, PluginError> {
    providers()
        .into_iter()
        .find(|p| p.name() == name)
        .ok_or_else(|| PluginError::NotFound(name.to_string()))
}
