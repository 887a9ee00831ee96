//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use std::path::PathBuf;

use chrono::{Local, NaiveDate, Utc};
use clap::Args;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::cli::output;
use crate::core::{Attachment, RecordPatch, Status};
use crate::error::Result;
use crate::store::RecordStore;
use crate::sync::StartupReport;

pub mod add;
pub mod autosync;
pub mod clear;
pub mod config;
pub mod delete;
pub mod edit;
pub mod export;
pub mod import;
pub mod list;
pub mod show;
pub mod stats;
pub mod sync;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Add(args) => add::run(ctx, args),
        Commands::Edit(args) => edit::run(ctx, args),
        Commands::Delete(args) => delete::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
        Commands::Show(args) => show::run(ctx, args),
        Commands::Stats(args) => stats::run(ctx, args),
        Commands::Import(args) => import::run(ctx, args),
        Commands::Export(args) => export::run(ctx, args),
        Commands::Sync(args) => sync::run(ctx, args),
        Commands::Clear(args) => clear::run(ctx, args),
        Commands::Autosync(args) => autosync::run(ctx, args),
        Commands::Config(args) => config::run(ctx, args),
    }
}

/// Open the store; in human mode startup warnings go to stderr right away.
pub(crate) fn open_store(ctx: &AppContext) -> (RecordStore, StartupReport) {
    let (store, report) = ctx.open_store();
    if !ctx.robot_mode {
        output::warn_human(&report.warnings);
    }
    (store, report)
}

/// Today in the local timezone.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Optional record fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub struct RecordFields {
    /// Job title
    #[arg(long)]
    pub position: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub salary: Option<String>,

    /// e.g. full-time, contract
    #[arg(long)]
    pub job_type: Option<String>,

    /// Application date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// applied, in-progress, selected, rejected, rejected-in-rounds, or any other text
    #[arg(long)]
    pub status: Option<String>,

    /// Free-text notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Attach a file (repeatable)
    #[arg(long = "attach", value_name = "PATH")]
    pub attach: Vec<PathBuf>,
}

impl RecordFields {
    /// Build a patch, reading any attachments from disk.
    pub fn to_patch(&self) -> Result<RecordPatch> {
        let uploaded_at = Utc::now();
        let add_files = self
            .attach
            .iter()
            .map(|path| Attachment::from_path(path, uploaded_at))
            .collect::<Result<Vec<_>>>()?;
        Ok(RecordPatch {
            company_name: None,
            position: self.position.clone(),
            location: self.location.clone(),
            salary: self.salary.clone(),
            job_type: self.job_type.clone(),
            date_applied: self.date,
            status: self.status.as_deref().map(Status::from),
            notes: self.notes.clone(),
            add_files,
        })
    }
}
