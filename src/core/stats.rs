//! Dashboard aggregation over the record collection.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::record::{Record, Status};

/// Recent-company list length.
const RECENT_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total: usize,
    pub selected: usize,
    /// Rejected plus rejected-in-rounds
    pub rejected: usize,
    pub in_progress: usize,
    pub applied: usize,
    /// Passthrough statuses
    pub other: usize,
    pub success_rate: u32,
    pub rejection_rate: u32,
    pub response_rate: u32,
    pub this_week: usize,
    pub streak: usize,
    /// Oldest day first, ending today
    pub timeline: Vec<DayCount>,
    pub achievements: Vec<Achievement>,
    pub recent_companies: Vec<String>,
}

impl Stats {
    #[must_use]
    pub fn compute(records: &[Record], today: NaiveDate) -> Self {
        let total = records.len();
        let count = |pred: fn(&Status) -> bool| records.iter().filter(|r| pred(&r.status)).count();

        let selected = count(|s| matches!(s, Status::Selected));
        let rejected = count(Status::is_rejection);
        let in_progress = count(|s| matches!(s, Status::InProgress));
        let applied = count(|s| matches!(s, Status::Applied));
        let other = count(|s| matches!(s, Status::Other(_)));

        let week_ago = today - Duration::days(7);
        let this_week = records.iter().filter(|r| r.date_applied >= week_ago).count();

        let timeline = (0..7)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                DayCount {
                    date,
                    count: records.iter().filter(|r| r.date_applied == date).count(),
                }
            })
            .collect();

        let streak = streak(records);

        Self {
            total,
            selected,
            rejected,
            in_progress,
            applied,
            other,
            success_rate: percent(selected, total),
            rejection_rate: percent(rejected, total),
            response_rate: percent(selected + rejected, total),
            this_week,
            streak,
            timeline,
            achievements: achievements(total, selected, streak),
            recent_companies: records
                .iter()
                .take(RECENT_LIMIT)
                .map(|r| r.company_display().to_string())
                .collect(),
        }
    }
}

/// Consecutive days with an application, counting back from the most
/// recent application date.
#[must_use]
pub fn streak(records: &[Record]) -> usize {
    let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.date_applied).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let Some(mut current) = dates.first().copied() else {
        return 0;
    };
    let mut streak = 1;
    for date in dates.into_iter().skip(1) {
        if (current - date).num_days() == 1 {
            streak += 1;
            current = date;
        } else {
            break;
        }
    }
    streak
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = ((part as f64 / total as f64) * 100.0).round() as u32;
    rounded
}

fn achievements(total: usize, selected: usize, streak: usize) -> Vec<Achievement> {
    vec![
        Achievement {
            title: "First Step",
            description: "Applied to your first job",
            unlocked: total >= 1,
        },
        Achievement {
            title: "Job Hunter",
            description: "Applied to 10 companies",
            unlocked: total >= 10,
        },
        Achievement {
            title: "Persistent",
            description: "Applied to 25 companies",
            unlocked: total >= 25,
        },
        Achievement {
            title: "First Victory",
            description: "Got your first placement",
            unlocked: selected >= 1,
        },
        Achievement {
            title: "Success Story",
            description: "3 placements achieved",
            unlocked: selected >= 3,
        },
        Achievement {
            title: "Dedicated",
            description: "Applied for 7 days straight",
            unlocked: streak >= 7,
        },
    ]
}
