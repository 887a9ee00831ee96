//! jt edit - Change fields of an application

use clap::Args;

use super::{RecordFields, open_store};
use crate::app::AppContext;
use crate::cli::output;
use crate::error::{JtError, Result};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Record identifier
    pub id: i64,

    /// New company name
    #[arg(long)]
    pub company: Option<String>,

    #[command(flatten)]
    pub fields: RecordFields,
}

pub fn run(ctx: &AppContext, args: &EditArgs) -> Result<()> {
    let mut patch = args.fields.to_patch()?;
    patch.company_name = args.company.as_ref().map(|c| c.trim().to_string());
    if patch.is_empty() {
        return Err(JtError::ValidationFailed(
            "nothing to change; pass at least one field".to_string(),
        ));
    }

    let (mut store, _) = open_store(ctx);
    let report = store.update(args.id, patch)?;
    let edited = store
        .collection()
        .get(args.id)
        .cloned()
        .ok_or(JtError::RecordNotFound(args.id))?;

    output::finish_save(ctx.robot_mode, edited, &report, |record| {
        format!(
            "Updated {} ({})",
            record.id,
            console::style(record.company_display()).bold()
        )
    })
}
