//! Startup sync between backends, save fan-out, and the autosave loop.

pub mod autosync;
pub mod engine;
pub mod state;

pub use autosync::{AutosaveOptions, AutosaveSummary, StopReason};
pub use engine::{BackendOutcome, Resolution, Role, SaveReport, StartupReport, SyncEngine};
pub use state::{StartupSnapshot, SyncState};
