use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::engine::{SaveReport, StartupReport};
use crate::error::{JtError, Result};
use crate::storage::BackendKind;

/// What the last startup decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupSnapshot {
    pub at: DateTime<Utc>,
    pub source: BackendKind,
    pub count: usize,
    pub resolution: String,
    #[serde(default)]
    pub migrated_from: Option<BackendKind>,
}

/// Persisted between runs under `<root>/sync/state.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default)]
    pub last_startup: Option<StartupSnapshot>,
    #[serde(default)]
    pub last_save: Option<DateTime<Utc>>,
    /// Digest of the collection as of `last_save`.
    #[serde(default)]
    pub last_digest: Option<String>,
    #[serde(default)]
    pub last_errors: Vec<String>,
}

impl SyncState {
    pub fn path(root: &Path) -> PathBuf {
        root.join("sync").join("state.json")
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|err| JtError::Config(format!("read sync state {}: {err}", path.display())))?;
        let state: Self = serde_json::from_str(&contents)?;
        Ok(state)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = Self::path(root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, rendered)?;
        Ok(())
    }

    pub fn record_startup(&mut self, report: &StartupReport) {
        self.last_startup = Some(StartupSnapshot {
            at: Utc::now(),
            source: report.source,
            count: report.count,
            resolution: report.resolution.as_str().to_string(),
            migrated_from: report.migrated_from,
        });
        self.last_errors.clone_from(&report.warnings);
    }

    pub fn record_save(&mut self, report: &SaveReport, digest: Option<String>) {
        if report.primary_error().is_none() {
            self.last_save = Some(Utc::now());
            self.last_digest = digest;
        }
        self.last_errors = report
            .outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {e}", o.backend)))
            .collect();
    }
}
