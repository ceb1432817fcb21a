//! Pure aggregate calculations over daily logs.
//!
//! Everything here is deterministic: "today" is always an explicit
//! parameter so the same inputs yield the same statistics.

use itertools::Itertools;
use serde::Serialize;
use time::{Date, Duration};

use crate::domain::DailyLog;

/// Hour statistics derived from a trainee's full log history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourStats {
    pub total_rendered: f64,
    pub hours_this_week: f64,
    pub remaining: f64,
    pub progress_percentage: f64,
    pub weekly_average: f64,
    pub days_logged: usize,
}

/// A Monday-start week bucket, labeled for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBucket {
    pub start: Date,
    pub end: Date,
    pub label: String,
}

/// One 7-day bucket of a burn-down series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurndownPoint {
    pub week: usize,
    pub remaining: f64,
    pub ideal: f64,
}

/// The Monday of the week containing `date`.
pub fn monday_of(date: Date) -> Date {
    date - Duration::days(date.weekday().number_days_from_monday() as i64)
}

/// The Sunday of the week containing `date`.
pub fn sunday_of(date: Date) -> Date {
    monday_of(date) + Duration::days(6)
}

/// Whole 7-day spans between two dates (0 when both fall in the same
/// span, negative when `b` precedes `a`).
pub fn whole_weeks_between(a: Date, b: Date) -> i64 {
    (b - a).whole_days() / 7
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Derives [`HourStats`] from the full log list and the required-hours
/// target. `remaining` never goes negative and a zero target yields 0%
/// progress rather than a division by zero.
pub fn compute_hour_stats(logs: &[DailyLog], total_required: f64, today: Date) -> HourStats {
    let total: f64 = logs.iter().map(|l| l.daily_hours).sum();

    let week_start = monday_of(today);
    let week_end = sunday_of(today);
    let this_week: f64 = logs
        .iter()
        .filter(|l| l.entry_date >= week_start && l.entry_date <= week_end)
        .map(|l| l.daily_hours)
        .sum();

    let progress = if total_required > 0.0 {
        (total / total_required * 100.0).min(100.0)
    } else {
        0.0
    };

    let weekly_average = match logs.iter().map(|l| l.entry_date).min() {
        Some(first) => {
            let weeks_active = whole_weeks_between(first, today).max(0) + 1;
            total / weeks_active as f64
        }
        None => 0.0,
    };

    let days_logged = logs.iter().map(|l| l.entry_date).unique().count();

    HourStats {
        total_rendered: round2(total),
        hours_this_week: round2(this_week),
        remaining: round2((total_required - total).max(0.0)),
        progress_percentage: round1(progress),
        weekly_average: round1(weekly_average),
        days_logged,
    }
}

/// Buckets logs into Monday-start weeks, most recent first. Week
/// numbers count from the earliest week as 1. Empty input yields an
/// empty list.
pub fn group_logs_into_weeks(logs: &[DailyLog]) -> Vec<WeekBucket> {
    let mondays: Vec<Date> = logs
        .iter()
        .map(|l| monday_of(l.entry_date))
        .unique()
        .sorted()
        .collect();

    mondays
        .iter()
        .enumerate()
        .rev()
        .map(|(index, &start)| {
            let end = start + Duration::days(6);
            WeekBucket {
                start,
                end,
                label: format!("Week {}: {} - {}", index + 1, start, end),
            }
        })
        .collect()
}

/// Logs whose date falls inside the inclusive interval, ascending.
pub fn filter_logs_in_range(logs: &[DailyLog], start: Date, end: Date) -> Vec<DailyLog> {
    let mut in_range: Vec<DailyLog> = logs
        .iter()
        .filter(|l| l.entry_date >= start && l.entry_date <= end)
        .cloned()
        .collect();
    in_range.sort_by_key(|l| l.entry_date);
    in_range
}

/// Burn-down series over the internship span in 7-day buckets: actual
/// remaining hours against a linear ideal depletion line. Returns an
/// empty series when there are no logs, so callers never chart a bare
/// target line.
pub fn compute_burndown(
    logs: &[DailyLog],
    total_required: f64,
    start_date: Date,
    end_date: Option<Date>,
    today: Date,
) -> Vec<BurndownPoint> {
    if logs.is_empty() {
        return Vec::new();
    }

    let end = end_date.unwrap_or(today);
    let span_days = ((end - start_date).whole_days() + 1).max(1);
    let total_weeks = ((span_days + 6) / 7).max(1) as usize;
    let weekly_ideal = total_required / total_weeks as f64;

    (0..total_weeks)
        .map(|i| {
            let bucket_end = start_date + Duration::days((7 * (i + 1)) as i64 - 1);
            let cumulative: f64 = logs
                .iter()
                .filter(|l| l.entry_date <= bucket_end)
                .map(|l| l.daily_hours)
                .sum();

            BurndownPoint {
                week: i + 1,
                remaining: round2((total_required - cumulative).max(0.0)),
                ideal: round2((total_required - weekly_ideal * (i + 1) as f64).max(0.0)),
            }
        })
        .collect()
}
