//! jt autosync - Save periodically until interrupted

use std::time::Duration;

use clap::Args;

use super::open_store;
use crate::app::AppContext;
use crate::cli::output;
use crate::error::{JtError, Result};
use crate::sync::AutosaveOptions;
use crate::sync::autosync::{run as run_autosave, shutdown_on_ctrl_c};

#[derive(Args, Debug)]
pub struct AutosyncArgs {
    /// Seconds between saves (default from [autosync] interval_seconds)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Stop after this many saves
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Skip saves when nothing changed
    #[arg(long)]
    pub skip_unchanged: bool,
}

pub fn run(ctx: &AppContext, args: &AutosyncArgs) -> Result<()> {
    let mut options = AutosaveOptions::from_config(&ctx.config.autosync);
    if let Some(seconds) = args.interval {
        if seconds == 0 {
            return Err(JtError::ValidationFailed(
                "--interval must be at least 1 second".to_string(),
            ));
        }
        options.interval = Duration::from_secs(seconds);
    }
    options.max_ticks = args.max_ticks;
    options.skip_unchanged |= args.skip_unchanged;

    let (mut store, startup) = open_store(ctx);
    let shutdown = shutdown_on_ctrl_c()?;
    if !ctx.robot_mode {
        eprintln!(
            "Saving {} applications every {}s; Ctrl-C to stop",
            store.records().len(),
            options.interval.as_secs()
        );
    }
    let summary = run_autosave(&mut store, &options, &shutdown);

    if ctx.robot_mode {
        output::emit_robot(&output::robot_ok_with_warnings(summary, startup.warnings))
    } else {
        println!(
            "Autosave stopped after {} ticks: {} saved, {} skipped, {} failed",
            summary.ticks, summary.saves, summary.skipped, summary.failures
        );
        Ok(())
    }
}
