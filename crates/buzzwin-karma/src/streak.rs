//! Daily completion streaks.
//!
//! Streaks are derived from the set of distinct calendar dates on which a
//! user completed at least one ritual. Nothing here is incremental: callers
//! pass the full completion history and get fresh numbers back.
//!
//! - current streak: walk backward from today (or from yesterday when today
//!   has no completion yet) counting consecutive days
//! - longest streak: longest run of consecutive days anywhere in history

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Distinct completion dates, ascending.
pub fn distinct_dates<I>(dates: I) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    dates.into_iter().collect()
}

fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(1))
}

/// Consecutive days ending today, or ending yesterday if today is still open.
pub fn current_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if dates.contains(&today) {
        Some(today)
    } else {
        previous_day(today).filter(|yesterday| dates.contains(yesterday))
    };

    let mut streak = 0;
    let mut cursor = start;
    while let Some(day) = cursor {
        if !dates.contains(&day) {
            break;
        }
        streak += 1;
        cursor = previous_day(day);
    }
    streak
}

/// Longest run of consecutive days in the history.
pub fn longest_streak(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for &date in dates {
        run = match prev {
            Some(p) if previous_day(date) == Some(p) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(date);
    }
    longest
}

/// Aggregate ritual statistics for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RitualStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completed: u32,
    pub completed_this_week: u32,
    pub completed_this_month: u32,
    pub last_completed_date: Option<NaiveDate>,
}

impl RitualStats {
    /// Recompute statistics from every completion date the user has
    /// (one entry per completion, duplicates across rituals allowed).
    ///
    /// `previous_longest` is the value stored before this recomputation; the
    /// result never drops below it.
    pub fn compute(completions: &[NaiveDate], today: NaiveDate, previous_longest: u32) -> Self {
        let dates = distinct_dates(completions.iter().copied());
        let current = current_streak(&dates, today);
        let longest = longest_streak(&dates);

        let week_start = today.checked_sub_days(Days::new(7)).unwrap_or(NaiveDate::MIN);
        let month_start = today
            .checked_sub_months(Months::new(1))
            .unwrap_or(NaiveDate::MIN);

        Self {
            current_streak: current,
            longest_streak: previous_longest.max(current).max(longest),
            total_completed: completions.len() as u32,
            completed_this_week: completions.iter().filter(|d| **d >= week_start).count() as u32,
            completed_this_month: completions.iter().filter(|d| **d >= month_start).count() as u32,
            last_completed_date: dates.last().copied(),
        }
    }
}
