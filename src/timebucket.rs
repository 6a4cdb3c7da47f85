//! Time bucketing and small aggregate helpers shared by the analytics modules.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

pub const SECONDS_PER_HOUR: i64 = 3_600;
pub const DAYS_PER_WEEK: u32 = 7;

/// Largest gap, bucket or window length any config accepts (ten years).
pub const MAX_SPAN_SECS: i64 = 10 * 366 * 24 * SECONDS_PER_HOUR;

/// Truncate `ts` to the start of its epoch-aligned bucket.
pub fn floor_to_bucket(ts: DateTime<Utc>, bucket_secs: i64) -> DateTime<Utc> {
    let offset = ts.timestamp().rem_euclid(bucket_secs);
    ts - Duration::seconds(offset) - Duration::nanoseconds(i64::from(ts.timestamp_subsec_nanos()))
}

/// 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(ts: DateTime<Utc>) -> u32 {
    ts.weekday().num_days_from_sunday()
}

pub fn hour_of_day(ts: DateTime<Utc>) -> u32 {
    ts.hour()
}

/// Expand a sparse day-of-week map into all seven days, Sunday first.
pub fn fill_week<T>(mut by_day: BTreeMap<u32, T>, empty: impl Fn(u32) -> T) -> Vec<T> {
    (0..DAYS_PER_WEEK)
        .map(|day| by_day.remove(&day).unwrap_or_else(|| empty(day)))
        .collect()
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Total, truncated mean and truncated interpolated median of a set of durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationSummary {
    pub count: usize,
    pub total: i64,
    pub average: i64,
    pub median: i64,
}

pub fn summarize_durations(durations: &[i64]) -> DurationSummary {
    if durations.is_empty() {
        return DurationSummary::default();
    }

    let mut sorted = durations.to_vec();
    sorted.sort_unstable();

    let count = sorted.len();
    let total: i64 = sorted.iter().sum();

    // Continuous percentile: interpolate between the two middle ranks.
    let rank = (count - 1) as f64 * 0.5;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    let median = sorted[lower] as f64 + (sorted[upper] - sorted[lower]) as f64 * fraction;

    DurationSummary {
        count,
        total,
        average: total / count as i64,
        median: median as i64,
    }
}
