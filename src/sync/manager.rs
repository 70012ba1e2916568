//! Single synchronization pass
//!
//! The manager fetches the full dataset from a source, writes every service
//! to a registry and removes managed services that are no longer present in
//! the source. Each run is self-contained; nothing is carried between runs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ManagerConfig;
use crate::error::{ManagerError, ValidationError};
use crate::models::{Service, SyncResult};
use crate::plugins::registry::Registry;
use crate::plugins::source::Source;

/// Anything able to perform one synchronization pass
///
/// The scheduler only depends on this trait, which keeps it testable with
/// instrumented doubles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManagerInterface: Send + Sync {
    /// Run one pass
    ///
    /// The token is checked before the pass, between items, and raced
    /// against every source/registry call.
    async fn run(&self, cancel: &CancellationToken) -> Result<SyncResult, ManagerError>;
}

/// Fetch-then-persist orchestration over one source/registry pair
pub struct Manager {
    source: Arc<dyn Source>,
    registry: Arc<dyn Registry>,
    config: ManagerConfig,
}

impl Manager {
    /// Create a new manager
    ///
    /// Both clients are required; a `Manager` value is always ready to run.
    pub fn new(source: Arc<dyn Source>, registry: Arc<dyn Registry>, config: ManagerConfig) -> Self {
        Self {
            source,
            registry,
            config,
        }
    }

    async fn register_all(
        &self,
        services: &[Service],
        cancel: &CancellationToken,
        result: &mut SyncResult,
    ) -> Result<(), ManagerError> {
        let mut written: HashSet<&str> = HashSet::with_capacity(services.len());

        for service in services {
            if cancel.is_cancelled() {
                return Err(ManagerError::Cancelled);
            }

            let id = service.id();
            let outcome = match admit(service, &written) {
                Err(source) => Err(ManagerError::InvalidService {
                    id: id.to_string(),
                    source,
                }),
                Ok(()) => {
                    written.insert(id);
                    until_cancelled(cancel, self.registry.register(service))
                        .await?
                        .map_err(|source| ManagerError::Register {
                            id: id.to_string(),
                            source,
                        })
                }
            };

            match outcome {
                Ok(()) => result.registered += 1,
                Err(err) => self.item_failed(err, result)?,
            }
        }

        Ok(())
    }

    async fn deregister_stale(
        &self,
        desired: &HashSet<&str>,
        cancel: &CancellationToken,
        result: &mut SyncResult,
    ) -> Result<(), ManagerError> {
        let current = until_cancelled(cancel, self.registry.services())
            .await?
            .map_err(ManagerError::List)?;

        for id in current.iter().filter(|id| !desired.contains(id.as_str())) {
            if cancel.is_cancelled() {
                return Err(ManagerError::Cancelled);
            }

            let outcome = until_cancelled(cancel, self.registry.deregister(id))
                .await?
                .map_err(|source| ManagerError::Deregister {
                    id: id.clone(),
                    source,
                });

            match outcome {
                Ok(()) => result.deregistered += 1,
                Err(err) => self.item_failed(err, result)?,
            }
        }

        Ok(())
    }

    fn item_failed(&self, err: ManagerError, result: &mut SyncResult) -> Result<(), ManagerError> {
        if !self.config.continue_on_error || !err.is_item_failure() {
            return Err(err);
        }
        warn!(error = %err, "Skipping service after error");
        result.failed += 1;
        Ok(())
    }
}

#[async_trait]
impl ManagerInterface for Manager {
    async fn run(&self, cancel: &CancellationToken) -> Result<SyncResult, ManagerError> {
        if cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }

        // A failed fetch leaves nothing to act on, so it is never skipped.
        let services = until_cancelled(cancel, self.source.fetch())
            .await?
            .map_err(ManagerError::Fetch)?;

        let mut result = SyncResult::default();
        self.register_all(&services, cancel, &mut result).await?;

        let desired: HashSet<&str> = services.iter().map(Service::id).collect();
        self.deregister_stale(&desired, cancel, &mut result).await?;

        debug!(
            source = self.source.name(),
            registry = self.registry.name(),
            registered = result.registered,
            deregistered = result.deregistered,
            failed = result.failed,
            "Manager run completed"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("source", &self.source.name())
            .field("registry", &self.registry.name())
            .field("config", &self.config)
            .finish()
    }
}

fn admit(service: &Service, written: &HashSet<&str>) -> Result<(), ValidationError> {
    service.validate()?;
    if written.contains(service.id()) {
        return Err(ValidationError::DuplicateId(service.id().to_string()));
    }
    Ok(())
}

async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, ManagerError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ManagerError::Cancelled),
        output = fut => Ok(output),
    }
}
