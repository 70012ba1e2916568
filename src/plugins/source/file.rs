//! File source plugin
//!
//! Reads service definitions from a YAML (or JSON) file on every fetch.
//!
//! # File Format
//!
//! ```yaml
//! services:
//!   - name: web
//!     address: 10.0.0.10
//!     port: 8080
//!     tags: ["http", "public"]
//!     meta:
//!       team: edge
//!
//!   - id: db-primary
//!     name: db
//!     address: db.internal
//!     port: 5432
//! ```

use async_trait::async_trait;
use clap::{Arg, ArgMatches};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::string_value;
use crate::error::{PluginError, SourceError};
use crate::models::Service;

use super::traits::{Source, SourceProvider};

/// Flag holding the path of the services file
pub const FILE_PATH: &str = "file.path";

/// File source configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSourceConfig {
    /// Path to the services file
    pub path: PathBuf,
}

impl FileSourceConfig {
    /// Resolve configuration from parsed arguments
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, PluginError> {
        let path = string_value(matches, FILE_PATH)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| PluginError::InvalidConfig(format!("{FILE_PATH} is required")))?;
        Ok(Self {
            path: PathBuf::from(path),
        })
    }
}

/// On-disk document layout
///
/// `services` is mandatory: an explicit `services: []` is the only document
/// that yields an empty dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServicesFile {
    /// Service definitions
    pub services: Vec<Service>,
}

/// Source reading service definitions from a local file
#[derive(Debug, Clone)]
pub struct FileSource {
    config: FileSourceConfig,
}

impl FileSource {
    /// Create a new file source
    pub fn new(config: FileSourceConfig) -> Self {
        Self { config }
    }

    /// Parse a services document
    pub fn parse(content: &str) -> Result<Vec<Service>, SourceError> {
        if content.trim().is_empty() {
            return Err(SourceError::Parse("services file is empty".to_string()));
        }
        let file: ServicesFile =
            serde_yaml::from_str(content).map_err(|e| SourceError::Parse(e.to_string()))?;
        Ok(file.services)
    }
}

#[async_trait]
impl Source for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> Result<Vec<Service>, SourceError> {
        let content = tokio::fs::read_to_string(&self.config.path)
            .await
            .map_err(|e| SourceError::Read(format!("{}: {}", self.config.path.display(), e)))?;

        let services = Self::parse(&content)?;
        debug!(
            path = %self.config.path.display(),
            services = services.len(),
            "Loaded services file"
        );
        Ok(services)
    }
}

/// Provider for [`FileSource`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSourceProvider;

impl SourceProvider for FileSourceProvider {
    fn name(&self) -> &'static str {
        "file"
    }

    fn flags(&self) -> Vec<Arg> {
        vec![Arg::new(FILE_PATH)
            .long(FILE_PATH)
            .env("PINCHY_FILE_PATH")
            .global(true)
            .help("Path to the YAML or JSON file with service definitions")]
    }

    fn factory(&self, matches: &ArgMatches) -> Result<Arc<dyn Source>, PluginError> {
        let config = FileSourceConfig::from_matches(matches)?;
        Ok(Arc::new(FileSource::new(config)))
    }
}
