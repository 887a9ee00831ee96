//! jt import - Import a backup file

use std::io::Read;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing::info;

use super::open_store;
use crate::app::AppContext;
use crate::cli::output;
use crate::core::ImportMode;
use crate::core::import::parse_backup;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Keep existing records, append unseen identifiers
    Merge,
    /// The backup becomes the whole collection
    Replace,
}

impl From<ModeArg> for ImportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Merge => Self::Merge,
            ModeArg::Replace => Self::Replace,
        }
    }
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Backup file (JSON array of records), or "-" for stdin
    pub path: PathBuf,

    #[arg(long, value_enum, default_value_t = ModeArg::Merge)]
    pub mode: ModeArg,
}

pub fn run(ctx: &AppContext, args: &ImportArgs) -> Result<()> {
    let raw = if args.path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.path)?
    };
    // Validate the whole file before touching any backend.
    let records = parse_backup(&raw)?;

    let (mut store, _) = open_store(ctx);
    let (outcome, report) = store.import(records, args.mode.into());
    info!(
        mode = %outcome.mode,
        added = outcome.added,
        skipped = outcome.skipped,
        total = outcome.total,
        "import applied"
    );

    output::finish_save(ctx.robot_mode, outcome, &report, |o| {
        format!(
            "Imported {} of {} records ({} mode, {} skipped); {} total",
            o.added, o.imported, o.mode, o.skipped, o.total
        )
    })
}
