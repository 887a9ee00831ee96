//! Storage layer for jt
//!
//! Every backend persists the whole record collection at once through the
//! [`Backend`] trait. One config switch picks the concrete implementation.

pub mod chunk;
pub mod drive;
pub mod firestore;
pub mod gist;
mod http;
pub mod local;
pub mod migrations;
pub mod sqlite;

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::core::Record;
use crate::error::{JtError, Result};

pub use drive::DriveBackend;
pub use firestore::{FirestoreBackend, FirestoreClient};
pub use gist::GistBackend;
pub use local::LocalCache;
pub use sqlite::Database;

/// A place the whole collection can be loaded from and saved to.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Every stored record, attachments reassembled.
    fn load_all(&mut self) -> Result<Vec<Record>>;

    /// Replace the stored set with `records`.
    fn save_all(&mut self, records: &[Record]) -> Result<()>;

    /// Remove every stored record.
    fn clear(&mut self) -> Result<()>;

    /// Space and record count as the store reports them. `None` when the
    /// backend keeps no such numbers.
    fn usage(&mut self) -> Result<Option<StorageUsage>> {
        Ok(None)
    }
}

/// What a backend reports about its own footprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_used: Option<u64>,
    /// Account or device limit, when the store has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl StorageUsage {
    /// Share of the limit in use, as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_used(&self) -> Option<f64> {
        match (self.bytes_used, self.bytes_limit) {
            (Some(used), Some(limit)) if limit > 0 => Some(used as f64 * 100.0 / limit as f64),
            _ => None,
        }
    }
}

/// Which storage mechanism backs a [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Key-value cache file under the data root
    Local,
    /// Embedded SQLite database
    Database,
    /// Cloud document store
    Firestore,
    /// Single JSON file in a GitHub Gist
    Gist,
    /// Single JSON file in Google Drive
    Drive,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Database => "database",
            Self::Firestore => "firestore",
            Self::Gist => "gist",
            Self::Drive => "drive",
        }
    }

    /// Lives off this machine.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Firestore | Self::Gist | Self::Drive)
    }

    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::Local,
            Self::Database,
            Self::Firestore,
            Self::Gist,
            Self::Drive,
        ]
    }
}

impl FromStr for BackendKind {
    type Err = JtError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "localstorage" => Ok(Self::Local),
            "database" | "db" | "sqlite" | "indexeddb" => Ok(Self::Database),
            "firestore" | "firebase" => Ok(Self::Firestore),
            "gist" | "github" => Ok(Self::Gist),
            "drive" | "google-drive" => Ok(Self::Drive),
            other => Err(JtError::Config(format!(
                "unknown backend '{other}' (expected local|database|firestore|gist|drive)"
            ))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construct the backend selected by `kind`.
pub fn open_backend(kind: BackendKind, config: &Config, root: &Path) -> Result<Box<dyn Backend>> {
    let backend: Box<dyn Backend> = match kind {
        BackendKind::Local => Box::new(LocalCache::open(root, &config.local.key)?),
        BackendKind::Database => {
            let path = root.join(&config.database.file);
            Box::new(Database::open(path)?)
        }
        BackendKind::Firestore => Box::new(FirestoreBackend::from_config(config)?),
        BackendKind::Gist => Box::new(GistBackend::from_config(config)?),
        BackendKind::Drive => Box::new(DriveBackend::from_config(config)?),
    };
    Ok(backend)
}

/// Like [`open_backend`], but a backend that cannot be constructed is
/// replaced by an [`UnavailableBackend`] so callers can keep going.
pub fn open_or_unavailable(kind: BackendKind, config: &Config, root: &Path) -> Box<dyn Backend> {
    match open_backend(kind, config, root) {
        Ok(backend) => backend,
        Err(err) => {
            warn!(backend = %kind, error = %err, "storage backend unavailable");
            Box::new(UnavailableBackend::new(kind, err.to_string()))
        }
    }
}

/// Stand-in for a backend that failed to initialize. Every call fails
/// with [`JtError::StorageUnavailable`].
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    kind: BackendKind,
    reason: String,
}

impl UnavailableBackend {
    #[must_use]
    pub fn new(kind: BackendKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    fn error(&self) -> JtError {
        JtError::StorageUnavailable {
            backend: self.kind.as_str().to_string(),
            reason: self.reason.clone(),
        }
    }
}

impl Backend for UnavailableBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn load_all(&mut self) -> Result<Vec<Record>> {
        Err(self.error())
    }

    fn save_all(&mut self, _records: &[Record]) -> Result<()> {
        Err(self.error())
    }

    fn clear(&mut self) -> Result<()> {
        Err(self.error())
    }

    fn usage(&mut self) -> Result<Option<StorageUsage>> {
        Err(self.error())
    }
}
