//! jt delete - Delete an application

use clap::Args;

use super::open_store;
use crate::app::AppContext;
use crate::cli::output;
use crate::error::{JtError, Result};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Record identifier
    pub id: i64,

    /// Confirm the deletion
    #[arg(long)]
    pub approve: bool,
}

pub fn run(ctx: &AppContext, args: &DeleteArgs) -> Result<()> {
    if !args.approve {
        return Err(JtError::ApprovalRequired(format!(
            "deleting record {} cannot be undone; re-run with --approve",
            args.id
        )));
    }

    let (mut store, _) = open_store(ctx);
    let (removed, report) = store.remove(args.id)?;
    output::finish_save(ctx.robot_mode, removed, &report, |record| {
        format!("Deleted {} ({})", record.id, record.company_display())
    })
}
