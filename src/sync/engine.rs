//! Startup resolution between the primary, its fallbacks and the remote.

use std::cmp::Ordering;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::Record;
use crate::error::JtError;
use crate::storage::{Backend, BackendKind, open_or_unavailable};

/// How the local and remote sets were reconciled at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// No remote configured.
    NoRemote,
    /// The remote could not be read; local data kept.
    RemoteUnavailable,
    /// Both sides empty.
    BothEmpty,
    /// Same count on both sides; local kept and nothing written.
    Tie,
    /// Remote held more records and replaced the local set.
    RemoteWon,
    /// Local held more records and was pushed to the remote.
    LocalPushed,
}

impl Resolution {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoRemote => "no-remote",
            Self::RemoteUnavailable => "remote-unavailable",
            Self::BothEmpty => "both-empty",
            Self::Tie => "tie",
            Self::RemoteWon => "remote-won",
            Self::LocalPushed => "local-pushed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    #[serde(skip)]
    pub records: Vec<Record>,
    pub count: usize,
    /// Backend the in-memory set came from.
    pub source: BackendKind,
    pub primary_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrated_from: Option<BackendKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<BackendKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_count: Option<usize>,
    pub resolution: Resolution,
    pub warnings: Vec<String>,
    pub duration_ms: u128,
}

/// Which part a backend plays in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Primary,
    Fallback,
    Remote,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendOutcome {
    pub backend: BackendKind,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackendOutcome {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of writing (or clearing) across backends.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveReport {
    pub count: usize,
    pub outcomes: Vec<BackendOutcome>,
}

impl SaveReport {
    /// The primary's failure as an error, if it failed.
    #[must_use]
    pub fn primary_error(&self) -> Option<JtError> {
        self.outcomes
            .iter()
            .find(|o| o.role == Role::Primary)
            .and_then(|o| {
                o.error.as_ref().map(|reason| JtError::StorageWrite {
                    backend: o.backend.as_str().to_string(),
                    reason: reason.clone(),
                })
            })
    }

    /// Messages for every failed backend other than the primary.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.role != Role::Primary)
            .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {e}", o.backend)))
            .collect()
    }

    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(BackendOutcome::is_ok)
    }
}

pub struct SyncEngine {
    primary: Box<dyn Backend>,
    fallbacks: Vec<Box<dyn Backend>>,
    remote: Option<Box<dyn Backend>>,
}

impl SyncEngine {
    pub fn new(
        primary: Box<dyn Backend>,
        fallbacks: Vec<Box<dyn Backend>>,
        remote: Option<Box<dyn Backend>>,
    ) -> Self {
        Self {
            primary,
            fallbacks,
            remote,
        }
    }

    /// Open every configured backend. Ones that fail to open are kept as
    /// unavailable stand-ins; fallbacks naming the primary are skipped.
    pub fn from_config(config: &Config, root: &Path) -> Self {
        let storage = &config.storage;
        let primary = open_or_unavailable(storage.primary, config, root);

        let mut seen = vec![storage.primary];
        let mut fallbacks = Vec::new();
        for kind in &storage.fallbacks {
            if seen.contains(kind) {
                debug!(backend = %kind, "skipping duplicate fallback");
                continue;
            }
            seen.push(*kind);
            fallbacks.push(open_or_unavailable(*kind, config, root));
        }

        let remote = storage
            .remote
            .map(|kind| open_or_unavailable(kind, config, root));

        Self::new(primary, fallbacks, remote)
    }

    #[must_use]
    pub fn primary_kind(&self) -> BackendKind {
        self.primary.kind()
    }

    #[must_use]
    pub fn remote_kind(&self) -> Option<BackendKind> {
        self.remote.as_ref().map(|r| r.kind())
    }

    #[must_use]
    pub fn fallback_kinds(&self) -> Vec<BackendKind> {
        self.fallbacks.iter().map(|f| f.kind()).collect()
    }

    /// Decide which source is authoritative and return its records.
    ///
    /// Never fails: problems are logged and collected as warnings.
    pub fn startup(&mut self) -> StartupReport {
        let start = Instant::now();
        let mut warnings = Vec::new();
        let mut source = self.primary.kind();
        let mut migrated_from = None;

        let (mut records, primary_available) = match self.primary.load_all() {
            Ok(records) => (records, true),
            Err(err) => {
                warn!(backend = %source, error = %err, "primary storage unavailable, starting empty");
                warnings.push(format!("{source} unavailable: {err}"));
                (Vec::new(), false)
            }
        };
        debug!(backend = %source, count = records.len(), "loaded primary");

        if records.is_empty() {
            for fallback in &mut self.fallbacks {
                let kind = fallback.kind();
                match fallback.load_all() {
                    Ok(found) if !found.is_empty() => {
                        info!(from = %kind, to = %source, count = found.len(), "migrating records");
                        if let Err(err) = self.primary.save_all(&found) {
                            warn!(backend = %source, error = %err, "migration write failed");
                            warnings.push(format!("migration into {source} failed: {err}"));
                        }
                        migrated_from = Some(kind);
                        source = kind;
                        records = found;
                        break;
                    }
                    Ok(_) => debug!(backend = %kind, "fallback empty"),
                    Err(err) => {
                        warn!(backend = %kind, error = %err, "fallback unreadable");
                        warnings.push(format!("{kind} unavailable: {err}"));
                    }
                }
            }
        }

        let mut local_count = None;
        let mut remote_count = None;
        let resolution = match self.remote.as_mut() {
            None => Resolution::NoRemote,
            Some(remote) => {
                let remote_kind = remote.kind();
                match remote.load_all() {
                    Err(err) => {
                        warn!(backend = %remote_kind, error = %err, "remote unavailable");
                        warnings.push(format!("{remote_kind} unavailable: {err}"));
                        Resolution::RemoteUnavailable
                    }
                    Ok(remote_records) => {
                        let (local, theirs) = (records.len(), remote_records.len());
                        local_count = Some(local);
                        remote_count = Some(theirs);
                        match local.cmp(&theirs) {
                            Ordering::Less => {
                                info!(local, remote = theirs, backend = %remote_kind, "remote has more records, using remote");
                                if let Err(err) = self.primary.save_all(&remote_records) {
                                    warn!(backend = %self.primary.kind(), error = %err, "could not store remote records locally");
                                    warnings.push(format!(
                                        "writing remote records to {} failed: {err}",
                                        self.primary.kind()
                                    ));
                                }
                                records = remote_records;
                                source = remote_kind;
                                Resolution::RemoteWon
                            }
                            Ordering::Greater => {
                                info!(local, remote = theirs, backend = %remote_kind, "local has more records, pushing");
                                if let Err(err) = remote.save_all(&records) {
                                    warn!(backend = %remote_kind, error = %err, "push to remote failed");
                                    warnings.push(format!("push to {remote_kind} failed: {err}"));
                                }
                                Resolution::LocalPushed
                            }
                            Ordering::Equal if local == 0 => Resolution::BothEmpty,
                            Ordering::Equal => {
                                debug!(count = local, "local and remote counts match");
                                Resolution::Tie
                            }
                        }
                    }
                }
            }
        };

        let report = StartupReport {
            count: records.len(),
            records,
            source,
            primary_available,
            migrated_from,
            remote: self.remote_kind(),
            local_count,
            remote_count,
            resolution,
            warnings,
            duration_ms: start.elapsed().as_millis(),
        };
        info!(
            source = %report.source,
            count = report.count,
            resolution = report.resolution.as_str(),
            duration_ms = report.duration_ms,
            "startup sync finished"
        );
        report
    }

    /// Write `records` to the primary and, if configured, the remote.
    pub fn save(&mut self, records: &[Record]) -> SaveReport {
        let mut report = SaveReport {
            count: records.len(),
            outcomes: Vec::new(),
        };
        report
            .outcomes
            .push(write_one(self.primary.as_mut(), Role::Primary, records));
        if let Some(remote) = self.remote.as_mut() {
            report
                .outcomes
                .push(write_one(remote.as_mut(), Role::Remote, records));
        }
        report
    }

    /// Empty every backend the engine knows about.
    pub fn clear(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        report
            .outcomes
            .push(clear_one(self.primary.as_mut(), Role::Primary));
        for fallback in &mut self.fallbacks {
            report
                .outcomes
                .push(clear_one(fallback.as_mut(), Role::Fallback));
        }
        if let Some(remote) = self.remote.as_mut() {
            report.outcomes.push(clear_one(remote.as_mut(), Role::Remote));
        }
        report
    }
}

fn write_one(backend: &mut dyn Backend, role: Role, records: &[Record]) -> BackendOutcome {
    let kind = backend.kind();
    let error = match backend.save_all(records) {
        Ok(()) => {
            debug!(backend = %kind, count = records.len(), "saved");
            None
        }
        Err(err) => {
            warn!(backend = %kind, error = %err, "save failed");
            Some(err.to_string())
        }
    };
    BackendOutcome {
        backend: kind,
        role,
        error,
    }
}

fn clear_one(backend: &mut dyn Backend, role: Role) -> BackendOutcome {
    let kind = backend.kind();
    let error = match backend.clear() {
        Ok(()) => {
            info!(backend = %kind, "cleared");
            None
        }
        Err(err) => {
            warn!(backend = %kind, error = %err, "clear failed");
            Some(err.to_string())
        }
    };
    BackendOutcome {
        backend: kind,
        role,
        error,
    }
}
