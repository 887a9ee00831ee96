//! jt clear - Delete every application from every backend

use clap::Args;

use super::open_store;
use crate::app::AppContext;
use crate::cli::output;
use crate::error::{JtError, Result};

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm wiping all data
    #[arg(long)]
    pub approve: bool,
}

pub fn run(ctx: &AppContext, args: &ClearArgs) -> Result<()> {
    if !args.approve {
        return Err(JtError::ApprovalRequired(
            "clearing deletes every application on every backend; re-run with --approve"
                .to_string(),
        ));
    }

    let (mut store, _) = open_store(ctx);
    let removed = store.records().len();
    let report = store.clear();
    output::finish_save(ctx.robot_mode, report.clone(), &report, |r| {
        let cleared: Vec<String> = r
            .outcomes
            .iter()
            .filter(|o| o.is_ok())
            .map(|o| o.backend.to_string())
            .collect();
        format!("Removed {removed} applications; cleared {}", cleared.join(", "))
    })
}
