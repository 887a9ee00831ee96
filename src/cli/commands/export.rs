//! jt export - Export all applications as a backup file

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::{open_store, today};
use crate::app::AppContext;
use crate::cli::output;
use crate::core::import::{backup_file_name, export_backup};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination file (default: ./job-applications-backup-<date>.json)
    #[arg(long, short = 'o', conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Write the backup JSON to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Serialize)]
struct ExportOutput {
    path: PathBuf,
    count: usize,
}

pub fn run(ctx: &AppContext, args: &ExportArgs) -> Result<()> {
    let (store, startup) = open_store(ctx);
    let body = export_backup(store.records())?;

    if args.stdout {
        println!("{body}");
        return Ok(());
    }

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(backup_file_name(today())));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, body)?;

    let data = ExportOutput {
        path,
        count: store.records().len(),
    };
    if ctx.robot_mode {
        output::emit_robot(&output::robot_ok_with_warnings(data, startup.warnings))
    } else {
        println!("Exported {} applications to {}", data.count, data.path.display());
        Ok(())
    }
}
