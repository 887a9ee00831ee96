//! jt stats - Dashboard counts, rates, streak and achievements

use chrono::NaiveDate;
use clap::Args;
use console::style;

use super::{open_store, today};
use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout};
use crate::core::Stats;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Reference date for the weekly numbers (default: today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,
}

pub fn run(ctx: &AppContext, args: &StatsArgs) -> Result<()> {
    let (store, startup) = open_store(ctx);
    let stats = Stats::compute(store.records(), args.today.unwrap_or_else(today));

    if ctx.robot_mode {
        return output::emit_robot(&output::robot_ok_with_warnings(stats, startup.warnings));
    }

    let mut layout = HumanLayout::new();
    layout.title("Job search dashboard");
    layout
        .kv("Total", &stats.total.to_string())
        .kv("Selected", &format!("{} ({}%)", stats.selected, stats.success_rate))
        .kv("Rejected", &format!("{} ({}%)", stats.rejected, stats.rejection_rate))
        .kv("In progress", &stats.in_progress.to_string())
        .kv("Applied", &stats.applied.to_string());
    if stats.other > 0 {
        layout.kv("Other", &stats.other.to_string());
    }
    layout
        .kv("Response rate", &format!("{}%", stats.response_rate))
        .kv("This week", &stats.this_week.to_string())
        .kv("Streak", &format!("{} days", stats.streak));

    layout.blank().section("Last 7 days");
    for day in &stats.timeline {
        layout.push_line(format!(
            "{}  {:>3} {}",
            day.date.format("%a %m-%d"),
            day.count,
            "#".repeat(day.count.min(40))
        ));
    }

    layout.blank().section("Achievements");
    for achievement in &stats.achievements {
        let mark = if achievement.unlocked {
            style("✓").green().to_string()
        } else {
            style("·").dim().to_string()
        };
        layout.push_line(format!(
            "{mark} {} - {}",
            achievement.title, achievement.description
        ));
    }

    if !stats.recent_companies.is_empty() {
        layout.blank().section("Recent companies");
        for company in &stats.recent_companies {
            layout.bullet(company);
        }
    }

    output::emit_human(layout);
    Ok(())
}
