//! jt show - Show one application in full

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::open_store;
use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::core::Record;
use crate::error::{JtError, Result};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Record identifier
    pub id: i64,

    /// Include attachment payloads in robot output
    #[arg(long)]
    pub with_data: bool,

    /// Decode every attachment into this directory
    #[arg(long, value_name = "DIR")]
    pub save_attachments: Option<PathBuf>,
}

#[derive(Serialize)]
struct ShowOutput {
    record: Record,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    saved: Vec<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &ShowArgs) -> Result<()> {
    let (store, startup) = open_store(ctx);
    let mut record = store
        .collection()
        .get(args.id)
        .cloned()
        .ok_or(JtError::RecordNotFound(args.id))?;

    let saved = match &args.save_attachments {
        Some(dir) => save_attachments(&record, dir)?,
        None => Vec::new(),
    };

    if ctx.robot_mode {
        if !args.with_data {
            for file in &mut record.files {
                file.data.clear();
            }
        }
        let data = ShowOutput { record, saved };
        return output::emit_robot(&output::robot_ok_with_warnings(data, startup.warnings));
    }

    let mut layout = HumanLayout::new();
    layout.title(record.company_display());
    layout
        .kv("ID", &record.id.to_string())
        .kv("Status", &output::status_styled(&record.status).to_string())
        .kv("Applied", &record.date_applied.format("%Y-%m-%d").to_string());
    for (key, value) in [
        ("Position", &record.position),
        ("Location", &record.location),
        ("Salary", &record.salary),
        ("Job type", &record.job_type),
    ] {
        if let Some(value) = value {
            layout.kv(key, value);
        }
    }
    if !record.notes.trim().is_empty() {
        layout.blank().section("Notes").push_line(record.notes.trim());
    }
    if !record.files.is_empty() {
        layout.blank().section("Attachments");
        for file in &record.files {
            layout.bullet(&format!(
                "{} ({}, {} bytes, {})",
                file.name,
                file.mime_type,
                file.size,
                file.uploaded_at.format("%Y-%m-%d %H:%M")
            ));
        }
    }
    for path in &saved {
        layout.push_line(format!("saved {}", path.display()));
    }
    output::emit_human(layout);
    Ok(())
}

/// Write each decoded attachment into `dir`, prefixing the attachment
/// id so two files with the same name do not collide.
fn save_attachments(record: &Record, dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    record
        .files
        .iter()
        .map(|file| -> Result<PathBuf> {
            let name = std::path::Path::new(&file.name)
                .file_name()
                .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned());
            let path = dir.join(format!("{}-{name}", file.id));
            std::fs::write(&path, file.decode()?)?;
            Ok(path)
        })
        .collect()
}
