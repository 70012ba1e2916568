//! Source and registry plugins
//!
//! Both sides are open sets: a provider is added by listing it in the
//! `providers()` table of its module.

pub mod registry;
pub mod source;
