//! jt - job application tracker
//!
//! Records live in memory as a [`core::Collection`] and are persisted as a
//! whole through one of several [`storage::Backend`]s. At startup the
//! [`sync::SyncEngine`] decides which backend is authoritative, migrating
//! from fallbacks and reconciling with an optional remote.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod store;
pub mod sync;
pub mod test_utils;

pub use error::{JtError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
