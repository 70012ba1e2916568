//! Domain models for pinchy
//!
//! This module contains the data moved between sources and registries.

pub mod service;

// Re-export commonly used types
pub use service::{Service, SyncResult};
