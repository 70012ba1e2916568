//! Command-line surface
//!
//! The command tree is generated from the provider tables:
//!
//! ```text
//! pinchy <source> <registry> once
//! pinchy <source> <registry> watch [--scheduler.interval 1m]
//! ```
//!
//! Every source/registry pair gets its own branch, so each leaf only accepts
//! the flags of the providers it combines.

use anyhow::Context;
use clap::{ArgMatches, Command};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, Dispatch};

use crate::config::{LoggingConfig, ManagerConfig, SchedulerConfig};
use crate::error::{AppError, PluginError};
use crate::plugins::registry::{self, RegistryProvider};
use crate::plugins::source::{self, SourceProvider};
use crate::sync::{ticker, Manager, ManagerInterface, Scheduler};

/// Binary name
pub const NAME: &str = "pinchy";
/// Single-pass subcommand
pub const ONCE: &str = "once";
/// Daemon subcommand
pub const WATCH: &str = "watch";

/// What the resolved leaf command asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run the manager once and report the outcome
    Once,
    /// Run the manager on an interval until cancelled
    Watch(SchedulerConfig),
}

/// Fully resolved command line
pub struct Invocation {
    /// Selected source provider
    pub source: Arc<dyn SourceProvider>,
    /// Selected registry provider
    pub registry: Arc<dyn RegistryProvider>,
    /// Requested mode
    pub mode: Mode,
    /// Logging options
    pub logging: LoggingConfig,
    /// Manager options
    pub manager: ManagerConfig,
    matches: ArgMatches,
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("source", &self.source.name())
            .field("registry", &self.registry.name())
            .field("mode", &self.mode)
            .field("logging", &self.logging)
            .field("manager", &self.manager)
            .finish()
    }
}

/// Build the full command tree
pub fn build_command(version: &'static str) -> Command {
    let mut root = Command::new(NAME)
        .version(version)
        .about("Sync service definitions from a source into a service registry")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args(LoggingConfig::args());

    for source_provider in source::providers() {
        let mut source_cmd = Command::new(source_provider.name())
            .about(format!(
                "Fetch data from source \"{}\"",
                source_provider.name()
            ))
            .subcommand_required(true)
            .args(source_provider.flags());

        for registry_provider in registry::providers() {
            let registry_cmd = Command::new(registry_provider.name())
                .about(format!(
                    "Save data in registry \"{}\"",
                    registry_provider.name()
                ))
                .subcommand_required(true)
                .args(ManagerConfig::args())
                .args(registry_provider.flags())
                .subcommand(
                    Command::new(ONCE).about("Run main process only once: sync and return result"),
                )
                .subcommand(
                    Command::new(WATCH)
                        .about("Run main process as daemon: sync repeatedly with constant interval")
                        .args(SchedulerConfig::args()),
                );
            source_cmd = source_cmd.subcommand(registry_cmd);
        }

        root = root.subcommand(source_cmd);
    }

    root
}

/// Resolve parsed arguments into providers and options
pub fn resolve(matches: &ArgMatches) -> Result<Invocation, AppError> {
    let (source_name, source_matches) = matches
        .subcommand()
        .ok_or_else(|| PluginError::NotFound("source".to_string()))?;
    let (registry_name, registry_matches) = source_matches
        .subcommand()
        .ok_or_else(|| PluginError::NotFound("registry".to_string()))?;
    let (mode_name, leaf) = registry_matches
        .subcommand()
        .ok_or_else(|| PluginError::InvalidConfig(format!("expected {ONCE} or {WATCH}")))?;

    let mode = match mode_name {
        ONCE => Mode::Once,
        WATCH => Mode::Watch(SchedulerConfig::from_matches(leaf)?),
        other => {
            return Err(PluginError::InvalidConfig(format!("unknown mode: {other}")).into());
        }
    };

    Ok(Invocation {
        source: source::find_provider(source_name)?,
        registry: registry::find_provider(registry_name)?,
        mode,
        logging: LoggingConfig::from_matches(leaf)?,
        manager: ManagerConfig::from_matches(leaf),
        matches: leaf.clone(),
    })
}

/// Build the manager for a resolved invocation
pub fn new_manager(invocation: &Invocation) -> Result<Manager, AppError> {
    let source = invocation.source.factory(&invocation.matches)?;
    let registry = invocation.registry.factory(&invocation.matches)?;
    Ok(Manager::new(source, registry, invocation.manager))
}

/// Build the scheduler for a resolved invocation
pub fn new_scheduler(
    invocation: &Invocation,
    config: SchedulerConfig,
    logger: Dispatch,
) -> Result<Scheduler, AppError> {
    let manager = new_manager(invocation)?;
    Ok(Scheduler::new(
        ticker(config.interval),
        Arc::new(manager),
        logger,
    ))
}

/// Execute the resolved command until it finishes or `cancel` fires
pub async fn execute(invocation: Invocation, cancel: CancellationToken) -> anyhow::Result<()> {
    match invocation.mode {
        Mode::Once => {
            let manager = new_manager(&invocation).context("failed to bootstrap manager")?;
            let result = manager
                .run(&cancel)
                .await
                .context("failed to run manager")?;
            info!(
                registered = result.registered,
                deregistered = result.deregistered,
                failed = result.failed,
                "Sync completed"
            );
            Ok(())
        }
        Mode::Watch(config) => {
            let logger = tracing::dispatcher::get_default(|d| d.clone());
            let scheduler = new_scheduler(&invocation, config, logger)
                .context("failed to bootstrap scheduler")?;
            info!(
                interval = %humantime::format_duration(config.interval),
                "Starting scheduler"
            );
            scheduler.run(cancel).await;
            info!("Scheduler stopped");
            Ok(())
        }
    }
}
