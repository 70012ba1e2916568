//! Synchronization core
//!
//! # Components
//!
//! - [`manager`]: One fetch-then-persist pass over a source/registry pair
//! - [`scheduler`]: Repeats a manager pass on a fixed interval until cancelled
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pinchy::sync::{scheduler, Manager, Scheduler};
//! use tokio_util::sync::CancellationToken;
//!
//! let manager = Arc::new(Manager::new(source, registry, ManagerConfig::default()));
//! let logger = tracing::dispatcher::get_default(|d| d.clone());
//! let scheduler = Scheduler::new(scheduler::ticker(interval), manager, logger);
//!
//! scheduler.run(CancellationToken::new()).await;
//! ```

pub mod manager;
pub mod scheduler;

// Re-export main types for convenience
pub use manager::{Manager, ManagerInterface};
pub use scheduler::{ticker, Scheduler};
