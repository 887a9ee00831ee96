//! The record store: the in-memory collection plus the backends behind it.
//!
//! Every mutation persists the whole collection. A failed write leaves the
//! in-memory change in place and is reported through the [`SaveReport`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::import::apply_import;
use crate::core::{Collection, ImportMode, ImportOutcome, Record, RecordPatch};
use crate::error::Result;
use crate::sync::{SaveReport, StartupReport, SyncEngine, SyncState};

pub struct RecordStore {
    collection: Collection,
    engine: SyncEngine,
    root: PathBuf,
    state: SyncState,
}

impl RecordStore {
    /// Open the configured backends and run the startup sync.
    pub fn open(config: &Config, root: &Path) -> (Self, StartupReport) {
        Self::with_engine(SyncEngine::from_config(config, root), root)
    }

    pub fn with_engine(mut engine: SyncEngine, root: &Path) -> (Self, StartupReport) {
        let mut report = engine.startup();
        let records = dedupe(std::mem::take(&mut report.records), &mut report.warnings);

        let mut state = SyncState::load(root).unwrap_or_else(|err| {
            warn!(error = %err, "ignoring unreadable sync state");
            SyncState::default()
        });
        state.record_startup(&report);

        let mut store = Self {
            collection: Collection::new(records),
            engine,
            root: root.to_path_buf(),
            state,
        };
        store.save_state();
        (store, report)
    }

    #[must_use]
    pub const fn collection(&self) -> &Collection {
        &self.collection
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        self.collection.records()
    }

    #[must_use]
    pub const fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    #[must_use]
    pub const fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn digest(&self) -> Result<String> {
        self.collection.digest()
    }

    /// Add a record with a fresh identifier.
    pub fn add(&mut self, record: Record) -> Result<(i64, SaveReport)> {
        self.add_at(record, Utc::now().timestamp_millis())
    }

    pub fn add_at(&mut self, record: Record, now_ms: i64) -> Result<(i64, SaveReport)> {
        let id = self.collection.add(record, now_ms)?;
        debug!(id, "added record");
        Ok((id, self.persist()))
    }

    pub fn update(&mut self, id: i64, patch: RecordPatch) -> Result<SaveReport> {
        self.collection.update(id, patch)?;
        debug!(id, "updated record");
        Ok(self.persist())
    }

    pub fn remove(&mut self, id: i64) -> Result<(Record, SaveReport)> {
        let removed = self.collection.remove(id)?;
        debug!(id, "removed record");
        Ok((removed, self.persist()))
    }

    /// Apply parsed backup records, then persist.
    pub fn import(&mut self, records: Vec<Record>, mode: ImportMode) -> (ImportOutcome, SaveReport) {
        let outcome = apply_import(&mut self.collection, records, mode);
        (outcome, self.persist())
    }

    /// Drop every record from memory and from every backend.
    pub fn clear(&mut self) -> SaveReport {
        self.collection.clear();
        let report = self.engine.clear();
        let digest = self.collection.digest().ok();
        self.state.record_save(&report, digest);
        self.save_state();
        report
    }

    /// Write the whole collection to the primary and the remote.
    pub fn persist(&mut self) -> SaveReport {
        let report = self.engine.save(self.collection.records());
        let digest = self.collection.digest().ok();
        self.state.record_save(&report, digest);
        self.save_state();
        report
    }

    fn save_state(&mut self) {
        if let Err(err) = self.state.save(&self.root) {
            warn!(error = %err, "could not write sync state");
        }
    }
}

/// Keep the first record for each identifier.
fn dedupe(records: Vec<Record>, warnings: &mut Vec<String>) -> Vec<Record> {
    let mut seen = HashSet::with_capacity(records.len());
    let before = records.len();
    let kept: Vec<Record> = records.into_iter().filter(|r| seen.insert(r.id)).collect();
    if kept.len() != before {
        let dropped = before - kept.len();
        warn!(dropped, "dropped records with duplicate identifiers");
        warnings.push(format!("dropped {dropped} records with duplicate identifiers"));
    }
    kept
}
