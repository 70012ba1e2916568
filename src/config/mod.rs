//! Configuration management for pinchy
//!
//! Options are declared as clap arguments (with `PINCHY_*` environment
//! fallbacks) and resolved once into immutable structs that are handed to
//! the constructors of the manager, scheduler and logging layer.

use clap::{Arg, ArgAction, ArgMatches};
use std::time::Duration;
use tracing::Level;

pub use crate::error::ConfigError;

/// Flag holding the log level
pub const LOGGER_LEVEL: &str = "logger.level";
/// Flag holding the log output format
pub const LOGGER_FORMAT: &str = "logger.format";
/// Flag toggling continue-on-error in the manager
pub const MANAGER_CONTINUE_ON_ERROR: &str = "manager.continue-on-error";
/// Flag holding the interval between scheduled runs
pub const SCHEDULER_INTERVAL: &str = "scheduler.interval";

/// Manager options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Skip failing services instead of aborting the run
    pub continue_on_error: bool,
}

impl ManagerConfig {
    /// Arguments recognised by the manager
    pub fn args() -> Vec<Arg> {
        vec![Arg::new(MANAGER_CONTINUE_ON_ERROR)
            .long(MANAGER_CONTINUE_ON_ERROR)
            .env("PINCHY_MANAGER_CONTINUE_ON_ERROR")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Omit errors during process manager")]
    }

    /// Resolve manager options from parsed arguments
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            continue_on_error: matches
                .try_get_one::<bool>(MANAGER_CONTINUE_ON_ERROR)
                .ok()
                .flatten()
                .copied()
                .unwrap_or(false),
        }
    }
}

/// Scheduler options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Interval between manager runs
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(60)
}

impl SchedulerConfig {
    /// Arguments recognised by the scheduler
    pub fn args() -> Vec<Arg> {
        vec![Arg::new(SCHEDULER_INTERVAL)
            .long(SCHEDULER_INTERVAL)
            .env("PINCHY_SCHEDULER_INTERVAL")
            .default_value("1m")
            .help("Interval between manager runs (1s, 1m, 5m, 1h and others)")]
    }

    /// Resolve scheduler options from parsed arguments
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        let interval = match string_value(matches, SCHEDULER_INTERVAL) {
            Some(raw) => parse_duration(SCHEDULER_INTERVAL, &raw)?,
            None => default_interval(),
        };
        if interval.is_zero() {
            return Err(ConfigError::InvalidValue(format!(
                "{SCHEDULER_INTERVAL} must be greater than zero"
            )));
        }
        Ok(Self { interval })
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable multi-line output
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown log format: {other}"
            ))),
        }
    }
}

/// Logging options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Maximum level emitted
    pub level: Level,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Json,
        }
    }
}

impl LoggingConfig {
    /// Global logging arguments
    pub fn args() -> Vec<Arg> {
        vec![
            Arg::new(LOGGER_LEVEL)
                .long(LOGGER_LEVEL)
                .env("PINCHY_LOGGER_LEVEL")
                .default_value("info")
                .global(true)
                .help("Log level"),
            Arg::new(LOGGER_FORMAT)
                .long(LOGGER_FORMAT)
                .env("PINCHY_LOGGER_FORMAT")
                .default_value("json")
                .global(true)
                .help("Log format (json, pretty)"),
        ]
    }

    /// Resolve logging options from parsed arguments
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(level) = string_value(matches, LOGGER_LEVEL) {
            config.level = parse_level(&level)?;
        }
        if let Some(format) = string_value(matches, LOGGER_FORMAT) {
            config.format = format.parse()?;
        }
        Ok(config)
    }
}

/// Parse a log level name
pub fn parse_level(level: &str) -> Result<Level, ConfigError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(ConfigError::InvalidValue(format!("unknown log level: {other}"))),
    }
}

/// Parse a human-readable duration such as `30s` or `5m`
pub fn parse_duration(flag: &str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim())
        .map_err(|e| ConfigError::InvalidValue(format!("{flag}: {e}")))
}

/// Read a string argument, treating unknown ids as absent
pub fn string_value(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.try_get_one::<String>(id).ok().flatten().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn command() -> Command {
        Command::new("test")
            .args(LoggingConfig::args())
            .args(ManagerConfig::args())
            .args(SchedulerConfig::args())
    }

    // Test 1: Default values are applied for missing flags
    #[test]
    fn test_default_values_applied() {
        let matches = command().try_get_matches_from(["test"]).unwrap();

        assert_eq!(ManagerConfig::from_matches(&matches), ManagerConfig::default());
        assert_eq!(
            SchedulerConfig::from_matches(&matches).unwrap().interval,
            Duration::from_secs(60)
        );
        assert_eq!(
            LoggingConfig::from_matches(&matches).unwrap(),
            LoggingConfig::default()
        );
    }

    // Test 2: Explicit flags override defaults
    #[test]
    fn test_explicit_flags() {
        let matches = command()
            .try_get_matches_from([
                "test",
                "--manager.continue-on-error",
                "--scheduler.interval",
                "5m",
                "--logger.level",
                "debug",
                "--logger.format",
                "pretty",
            ])
            .unwrap();

        assert!(ManagerConfig::from_matches(&matches).continue_on_error);
        assert_eq!(
            SchedulerConfig::from_matches(&matches).unwrap().interval,
            Duration::from_secs(300)
        );
        let logging = LoggingConfig::from_matches(&matches).unwrap();
        assert_eq!(logging.level, Level::DEBUG);
        assert_eq!(logging.format, LogFormat::Pretty);
    }

    // Test 3: Invalid interval is rejected
    #[test]
    fn test_invalid_interval() {
        let matches = command()
            .try_get_matches_from(["test", "--scheduler.interval", "soon"])
            .unwrap();

        match SchedulerConfig::from_matches(&matches) {
            Err(ConfigError::InvalidValue(msg)) => assert!(msg.contains(SCHEDULER_INTERVAL)),
            other => panic!("Expected ConfigError::InvalidValue, got {:?}", other),
        }
    }

    // Test 4: Zero interval is rejected
    #[test]
    fn test_zero_interval() {
        let matches = command()
            .try_get_matches_from(["test", "--scheduler.interval", "0s"])
            .unwrap();

        assert!(SchedulerConfig::from_matches(&matches).is_err());
    }

    // Test 5: Level parsing
    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE").unwrap(), Level::TRACE);
        assert_eq!(parse_level("warning").unwrap(), Level::WARN);
        assert_eq!(parse_level("error").unwrap(), Level::ERROR);
        assert!(parse_level("loud").is_err());
    }

    // Test 6: Format parsing
    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    // Test 7: Options absent from the command resolve to defaults
    #[test]
    fn test_unknown_ids_resolve_to_defaults() {
        let matches = Command::new("bare").try_get_matches_from(["bare"]).unwrap();

        assert!(!ManagerConfig::from_matches(&matches).continue_on_error);
        assert_eq!(
            SchedulerConfig::from_matches(&matches).unwrap(),
            SchedulerConfig::default()
        );
    }
}
