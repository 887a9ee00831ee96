//! Periodic re-save of the in-memory collection.

use std::time::Duration;

use crossbeam_channel::{Receiver, bounded, select, tick};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AutosyncConfig;
use crate::error::{JtError, Result};
use crate::store::RecordStore;

#[derive(Debug, Clone)]
pub struct AutosaveOptions {
    pub interval: Duration,
    /// Skip a tick when nothing changed since the last good save.
    pub skip_unchanged: bool,
    /// Stop after this many ticks; run until shutdown when `None`.
    pub max_ticks: Option<u64>,
}

impl AutosaveOptions {
    #[must_use]
    pub const fn from_config(config: &AutosyncConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_seconds),
            skip_unchanged: config.skip_unchanged,
            max_ticks: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    Shutdown,
    MaxTicks,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutosaveSummary {
    pub ticks: u64,
    pub saves: u64,
    pub skipped: u64,
    pub failures: u64,
    pub stopped_by: StopReason,
}

/// Save on every tick until `shutdown` fires (or disconnects) or the
/// tick limit is reached.
pub fn run(store: &mut RecordStore, options: &AutosaveOptions, shutdown: &Receiver<()>) -> AutosaveSummary {
    let ticker = tick(options.interval);
    let mut last_digest = store.state().last_digest.clone();
    let mut summary = AutosaveSummary {
        ticks: 0,
        saves: 0,
        skipped: 0,
        failures: 0,
        stopped_by: StopReason::Shutdown,
    };
    info!(
        interval_ms = u64::try_from(options.interval.as_millis()).unwrap_or(u64::MAX),
        skip_unchanged = options.skip_unchanged,
        "autosave started"
    );

    loop {
        select! {
            recv(shutdown) -> _ => {
                debug!("autosave shutdown requested");
                summary.stopped_by = StopReason::Shutdown;
                break;
            }
            recv(ticker) -> _ => {
                summary.ticks += 1;
                let digest = store.digest().ok();
                if options.skip_unchanged && digest.is_some() && digest == last_digest {
                    debug!(tick = summary.ticks, "collection unchanged, skipping save");
                    summary.skipped += 1;
                } else {
                    let report = store.persist();
                    if let Some(err) = report.primary_error() {
                        warn!(tick = summary.ticks, error = %err, "autosave failed");
                        summary.failures += 1;
                    } else {
                        debug!(tick = summary.ticks, count = report.count, "autosaved");
                        summary.saves += 1;
                        last_digest = digest;
                    }
                }
                if options.max_ticks.is_some_and(|max| summary.ticks >= max) {
                    summary.stopped_by = StopReason::MaxTicks;
                    break;
                }
            }
        }
    }

    info!(
        ticks = summary.ticks,
        saves = summary.saves,
        skipped = summary.skipped,
        failures = summary.failures,
        "autosave stopped"
    );
    summary
}

/// A channel that receives one message when the process gets Ctrl-C.
pub fn shutdown_on_ctrl_c() -> Result<Receiver<()>> {
    let (tx, rx) = bounded(1);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(JtError::Io)?;
    std::thread::Builder::new()
        .name("jt-ctrl-c".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    warn!(error = %err, "could not listen for Ctrl-C");
                    return;
                }
                let _ = tx.send(());
            });
        })?;
    Ok(rx)
}
