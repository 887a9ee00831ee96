//! jt add - Record a new application

use clap::Args;

use super::{RecordFields, open_store, today};
use crate::app::AppContext;
use crate::cli::output;
use crate::core::Record;
use crate::error::{JtError, Result};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Company applied to
    pub company: String,

    #[command(flatten)]
    pub fields: RecordFields,
}

pub fn run(ctx: &AppContext, args: &AddArgs) -> Result<()> {
    let company = args.company.trim();
    if company.is_empty() {
        return Err(JtError::ValidationFailed(
            "company name must not be empty".to_string(),
        ));
    }

    let mut record = Record::new(0, company, args.fields.date.unwrap_or_else(today));
    record.apply(args.fields.to_patch()?);

    let (mut store, _) = open_store(ctx);
    let (id, report) = store.add(record)?;
    let added = store
        .collection()
        .get(id)
        .cloned()
        .ok_or(JtError::RecordNotFound(id))?;

    output::finish_save(ctx.robot_mode, added, &report, |record| {
        format!(
            "Added {} ({}) as {}",
            console::style(record.company_display()).bold(),
            output::status_styled(&record.status),
            record.id
        )
    })
}
