//! Recurring manager runs
//!
//! The scheduler drives a [`ManagerInterface`] from a fixed-period timer
//! until its cancellation token fires. A failing run is logged and the loop
//! keeps going; runs never overlap.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Dispatch};

use super::manager::ManagerInterface;
use crate::error::ManagerError;

/// Build the recurring timer used by [`Scheduler`]
///
/// The first tick fires one full period after creation. Ticks missed while a
/// run is in flight are skipped, not queued.
pub fn ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Repeats a manager run on every timer tick
pub struct Scheduler {
    ticker: Interval,
    manager: Arc<dyn ManagerInterface>,
    logger: Dispatch,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// The parts are stored as given; nothing is validated or started.
    pub fn new(ticker: Interval, manager: Arc<dyn ManagerInterface>, logger: Dispatch) -> Self {
        Self {
            ticker,
            manager,
            logger,
        }
    }

    /// Period between runs
    pub fn period(&self) -> Duration {
        self.ticker.period()
    }

    /// Run until `cancel` fires
    ///
    /// Cancellation is observed between runs; a run in flight receives the
    /// same token and decides itself how quickly to stop. A run cut short by
    /// that token is not an error. The timer is released when this returns.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.ticker.tick() => {
                    match self.manager.run(&cancel).await {
                        Ok(_) => {}
                        Err(ManagerError::Cancelled) if cancel.is_cancelled() => {
                            tracing::dispatcher::with_default(&self.logger, || {
                                info!("manager run interrupted by shutdown");
                            });
                        }
                        Err(err) => {
                            tracing::dispatcher::with_default(&self.logger, || {
                                error!(error = %err, "failed to process manager run: {}", err);
                            });
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("period", &self.ticker.period())
            .finish_non_exhaustive()
    }
}
