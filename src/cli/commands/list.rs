//! jt list - List applications, optionally filtered

use std::collections::HashSet;

use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use tracing::{debug, warn};

use super::open_store;
use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::core::{Record, StatusFilter};
use crate::error::Result;
use crate::storage::{BackendKind, Database};
use crate::sync::StartupReport;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive company substring
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// Exact status, or "all"
    #[arg(long, default_value = "all")]
    pub status: String,

    /// Exact company name, ignoring ASCII case
    #[arg(long)]
    pub company: Option<String>,

    /// Applied on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Applied on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Show at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,
}

impl ListArgs {
    fn matches(&self, record: &Record) -> bool {
        self.company
            .as_deref()
            .is_none_or(|company| record.company_name.eq_ignore_ascii_case(company))
            && self.from.is_none_or(|from| record.date_applied >= from)
            && self.to.is_none_or(|to| record.date_applied <= to)
    }
}

#[derive(Serialize)]
struct ListOutput<'a> {
    count: usize,
    total: usize,
    records: Vec<&'a Record>,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let (store, startup) = open_store(ctx);
    let collection = store.collection();
    let status = StatusFilter::parse(&args.status);
    let indexed = indexed_ids(ctx, &startup, args, &status);
    let mut matches = collection.filter(&args.search, &status);
    matches.retain(|record| {
        args.matches(record) && indexed.as_ref().is_none_or(|ids| ids.contains(&record.id))
    });
    if let Some(limit) = args.limit {
        matches.truncate(limit);
    }

    if ctx.robot_mode {
        let data = ListOutput {
            count: matches.len(),
            total: collection.len(),
            records: matches,
        };
        return output::emit_robot(&output::robot_ok_with_warnings(data, startup.warnings));
    }

    let mut layout = HumanLayout::new();
    if collection.is_empty() {
        layout.push_line("No applications yet. Add one with `jt add <company>`.");
    } else if matches.is_empty() {
        layout.push_line("No applications match the filter.");
    } else {
        layout.push_line(
            console::style(format!(
                "{:>14}  {:<10}  {:<24}  {:<20}  {}",
                "ID", "DATE", "COMPANY", "POSITION", "STATUS"
            ))
            .dim()
            .to_string(),
        );
        for record in &matches {
            layout.push_line(output::record_row(record));
        }
        layout
            .blank()
            .push_line(format!("{} of {} applications", matches.len(), collection.len()));
    }
    output::emit_human(layout);
    Ok(())
}

/// Narrow the candidates with the database indexes when the collection was
/// loaded straight from the database, so the rows match what is in memory.
/// `None` means no narrowing.
fn indexed_ids(
    ctx: &AppContext,
    startup: &StartupReport,
    args: &ListArgs,
    status: &StatusFilter,
) -> Option<HashSet<i64>> {
    let filtered = !matches!(status, StatusFilter::All)
        || args.company.is_some()
        || args.from.is_some()
        || args.to.is_some();
    if !filtered || startup.source != BackendKind::Database {
        return None;
    }
    let lookup = || -> Result<Option<Vec<Record>>> {
        let db = Database::open(ctx.root.join(&ctx.config.database.file))?;
        if let StatusFilter::Only(wanted) = status {
            return db.find_by_status(wanted).map(Some);
        }
        if let Some(company) = &args.company {
            return db.find_by_company(company).map(Some);
        }
        if args.from.is_some() || args.to.is_some() {
            // Dates are stored as ISO text, so the open ends stay four-digit years.
            let from = args
                .from
                .or_else(|| NaiveDate::from_ymd_opt(1, 1, 1))
                .unwrap_or(NaiveDate::MIN);
            let to = args
                .to
                .or_else(|| NaiveDate::from_ymd_opt(9999, 12, 31))
                .unwrap_or(NaiveDate::MAX);
            return db.find_in_date_range(from, to).map(Some);
        }
        Ok(None)
    };
    match lookup() {
        Ok(found) => found.map(|records| {
            debug!(candidates = records.len(), "narrowed list with database index");
            records.into_iter().map(|record| record.id).collect()
        }),
        Err(err) => {
            warn!(error = %err, "database lookup failed; filtering in memory");
            None
        }
    }
}
