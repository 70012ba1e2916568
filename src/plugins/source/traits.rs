//! Source plugin trait definitions
//!
//! A source provider contributes a name, the command-line flags it
//! understands and a factory building the client that fetches the dataset.

use async_trait::async_trait;
use clap::{Arg, ArgMatches};
use std::sync::Arc;

use crate::error::{PluginError, SourceError};
use crate::models::Service;

/// Client fetching the current dataset from a backend
///
/// # Example
///
/// ```ignore
/// use pinchy::plugins::source::Source;
///
/// async fn count(source: &dyn Source) -> usize {
///     source.fetch().await.map(|services| services.len()).unwrap_or(0)
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Source: Send + Sync {
    /// Get the source name
    fn name(&self) -> &str;

    /// Fetch the full current list of services
    ///
    /// The returned list replaces whatever an earlier call returned; sources
    /// do not report deltas.
    async fn fetch(&self) -> Result<Vec<Service>, SourceError>;
}

/// Factory and flag surface of a source backend
pub trait SourceProvider: Send + Sync {
    /// Stable identifier, used as the CLI command name
    fn name(&self) -> &'static str;

    /// Flags specific to this source
    fn flags(&self) -> Vec<Arg>;

    /// Build a source client from resolved arguments
    fn factory(&self, matches: &ArgMatches) -> Result<Arc<dyn Source>, PluginError>;
}
