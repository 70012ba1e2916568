//! pinchy - Keeps a service registry in sync with a source of service definitions
//!
//! This crate fetches the desired set of services from a source (a file, for
//! now), registers them in a registry (Consul) and removes the services it
//! manages that disappeared from the source. It can run one pass or repeat
//! passes on an interval until shut down.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod plugins;
pub mod sync;
