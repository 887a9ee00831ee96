//! jt sync - Reconcile backends and push the collection everywhere

use clap::Args;
use serde::Serialize;
use tracing::warn;

use super::open_store;
use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::error::Result;
use crate::storage::{Backend, BackendKind, StorageUsage, open_backend};
use crate::sync::{SaveReport, StartupReport, SyncState};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Show configured backends and the last sync without touching them
    #[arg(long, conflicts_with = "usage")]
    pub status: bool,

    /// Ask each configured backend how much space it uses
    #[arg(long)]
    pub usage: bool,
}

#[derive(Serialize)]
struct StatusOutput {
    primary: BackendKind,
    fallbacks: Vec<BackendKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<BackendKind>,
    state: SyncState,
}

#[derive(Serialize)]
struct UsageRow {
    backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<StorageUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct SyncOutput {
    startup: StartupReport,
    save: SaveReport,
}

pub fn run(ctx: &AppContext, args: &SyncArgs) -> Result<()> {
    if args.status {
        return status(ctx);
    }
    if args.usage {
        return usage(ctx);
    }

    let (mut store, startup) = open_store(ctx);
    let save = store.persist();
    let data = SyncOutput { startup, save };
    let report = data.save.clone();

    output::finish_save(ctx.robot_mode, data, &report, |d| {
        let mut layout = HumanLayout::new();
        layout.title("Sync");
        layout
            .kv("Source", d.startup.source.as_str())
            .kv("Records", &d.startup.count.to_string())
            .kv("Resolution", d.startup.resolution.as_str());
        if let Some(from) = d.startup.migrated_from {
            layout.kv("Migrated from", from.as_str());
        }
        if let (Some(local), Some(remote)) = (d.startup.local_count, d.startup.remote_count) {
            layout.kv("Local/remote", &format!("{local}/{remote}"));
        }
        layout.blank().section("Saved to");
        for outcome in &d.save.outcomes {
            let mark = if outcome.is_ok() { "ok" } else { "failed" };
            layout.bullet(&format!("{} ({:?}): {mark}", outcome.backend, outcome.role));
        }
        layout.build()
    })
}

fn status(ctx: &AppContext) -> Result<()> {
    let storage = &ctx.config.storage;
    let data = StatusOutput {
        primary: storage.primary,
        fallbacks: storage.fallbacks.clone(),
        remote: storage.remote,
        state: SyncState::load(&ctx.root)?,
    };
    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok(data));
    }

    let mut layout = HumanLayout::new();
    layout.title("Sync status");
    let fallbacks: Vec<&str> = data.fallbacks.iter().map(BackendKind::as_str).collect();
    layout
        .kv("Primary", data.primary.as_str())
        .kv("Fallbacks", &fallbacks.join(", "))
        .kv("Remote", data.remote.map_or("none", |r| r.as_str()));
    match &data.state.last_startup {
        Some(last) => {
            layout
                .kv("Last startup", &last.at.to_rfc3339())
                .kv("Loaded from", last.source.as_str())
                .kv("Resolution", &last.resolution)
                .kv("Records", &last.count.to_string());
        }
        None => {
            layout.kv("Last startup", "never");
        }
    }
    layout.kv(
        "Last save",
        &data
            .state
            .last_save
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339()),
    );
    if !data.state.last_errors.is_empty() {
        layout.blank().section("Last errors");
        for err in &data.state.last_errors {
            layout.bullet(err);
        }
    }
    output::emit_human(layout);
    Ok(())
}

/// Primary, fallbacks, then remote, each listed once.
fn configured_kinds(ctx: &AppContext) -> Vec<BackendKind> {
    let storage = &ctx.config.storage;
    let mut kinds = vec![storage.primary];
    for kind in storage.fallbacks.iter().copied().chain(storage.remote) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

fn usage(ctx: &AppContext) -> Result<()> {
    let rows: Vec<UsageRow> = configured_kinds(ctx)
        .into_iter()
        .map(|kind| {
            let result = open_backend(kind, &ctx.config, &ctx.root)
                .and_then(|mut backend| backend.usage());
            match result {
                Ok(usage) => UsageRow {
                    backend: kind,
                    usage,
                    error: None,
                },
                Err(err) => {
                    warn!(backend = %kind, error = %err, "usage lookup failed");
                    UsageRow {
                        backend: kind,
                        usage: None,
                        error: Some(err.to_string()),
                    }
                }
            }
        })
        .collect();
    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok(rows));
    }

    let mut layout = HumanLayout::new();
    layout.title("Storage usage");
    for row in &rows {
        layout.kv(row.backend.as_str(), &describe_usage(row));
    }
    output::emit_human(layout);
    Ok(())
}

fn describe_usage(row: &UsageRow) -> String {
    if let Some(err) = &row.error {
        return format!("unavailable ({err})");
    }
    let Some(usage) = &row.usage else {
        return "not reported".to_string();
    };
    let mut parts = Vec::new();
    if let Some(records) = usage.records {
        parts.push(format!("{records} records"));
    }
    if let Some(used) = usage.bytes_used {
        let mut space = format_bytes(used);
        if let Some(limit) = usage.bytes_limit {
            space.push_str(&format!(" of {}", format_bytes(limit)));
        }
        if let Some(percent) = usage.percent_used() {
            space.push_str(&format!(" ({percent:.2}%)"));
        }
        parts.push(space);
    }
    if let Some(at) = &usage.last_updated {
        parts.push(format!("updated {at}"));
    }
    if parts.is_empty() {
        "not reported".to_string()
    } else {
        parts.join(", ")
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if bytes < 1024 * 1024 {
        format!("{bytes} B")
    } else {
        format!("{:.2} MB", bytes as f64 / MIB)
    }
}
