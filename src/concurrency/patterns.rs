//! Weekly and daily concurrency patterns from hourly stream starts.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::models::{ConcurrencyByDay, ConcurrencyByHour, StreamInterval};
use crate::timebucket::{
    day_of_week, fill_week, floor_to_bucket, hour_of_day, mean, SECONDS_PER_HOUR,
};

/// Number of finished streams starting in each clock hour.
fn hourly_start_counts(intervals: &[StreamInterval]) -> HashMap<DateTime<Utc>, usize> {
    let mut counts = HashMap::new();
    for interval in intervals.iter().filter(|i| i.stop.is_some()) {
        *counts
            .entry(floor_to_bucket(interval.start, SECONDS_PER_HOUR))
            .or_insert(0) += 1;
    }
    counts
}

fn summarize<K: Ord + Copy>(
    counts: &HashMap<DateTime<Utc>, usize>,
    key_of: impl Fn(DateTime<Utc>) -> K,
) -> BTreeMap<K, (f64, usize)> {
    let mut grouped: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for (hour, count) in counts {
        grouped.entry(key_of(*hour)).or_default().push(*count);
    }
    grouped
        .into_iter()
        .map(|(key, values)| {
            let peak = values.iter().copied().max().unwrap_or(0);
            let avg = mean(values.into_iter().map(|v| v as f64));
            (key, (avg, peak))
        })
        .collect()
}

/// Average and peak hourly starts per weekday, all seven days, Sunday first.
pub fn by_day_of_week(intervals: &[StreamInterval]) -> Vec<ConcurrencyByDay> {
    let by_day = summarize(&hourly_start_counts(intervals), day_of_week)
        .into_iter()
        .map(|(day_of_week, (avg_concurrent, peak_concurrent))| {
            (
                day_of_week,
                ConcurrencyByDay {
                    day_of_week,
                    avg_concurrent,
                    peak_concurrent,
                },
            )
        })
        .collect();
    fill_week(by_day, |day_of_week| ConcurrencyByDay {
        day_of_week,
        avg_concurrent: 0.0,
        peak_concurrent: 0,
    })
}

/// Average and peak hourly starts per hour of day; only active hours appear.
pub fn by_hour_of_day(intervals: &[StreamInterval]) -> Vec<ConcurrencyByHour> {
    summarize(&hourly_start_counts(intervals), hour_of_day)
        .into_iter()
        .map(|(hour, (avg_concurrent, peak_concurrent))| ConcurrencyByHour {
            hour,
            avg_concurrent,
            peak_concurrent,
        })
        .collect()
}

/// Infrastructure sizing guidance tiered by peak concurrency.
pub fn capacity_recommendation(peak: usize) -> &'static str {
    match peak {
        0..=2 => "Light usage - entry-level server is sufficient",
        3..=5 => "Moderate usage - standard server with CPU transcode support",
        6..=10 => "Heavy usage - consider hardware transcoding",
        11..=20 => "Very heavy usage - dedicated GPU strongly recommended, consider multiple instances",
        _ => "Extreme usage - load balancing across multiple servers and GPUs required",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::at;
    use chrono::Duration;

    fn finished(offset: i64) -> StreamInterval {
        StreamInterval {
            start: at(offset),
            stop: Some(at(offset) + Duration::minutes(30)),
            category: None,
        }
    }

    #[test]
    fn hourly_starts_grouped_by_weekday() {
        // base_time is Saturday 19:00.
        let intervals = vec![finished(0), finished(60), finished(3_600), finished(7 * 86_400)];
        let days = by_day_of_week(&intervals);

        assert_eq!(days.len(), 7);
        assert_eq!(days[6].day_of_week, 6);
        // Hours: Sat 19:00 -> 2, Sat 20:00 -> 1, next Sat 19:00 -> 1.
        assert_eq!(days[6].peak_concurrent, 2);
        assert!((days[6].avg_concurrent - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(days[0].peak_concurrent, 0);
    }

    #[test]
    fn hourly_starts_grouped_by_hour() {
        let intervals = vec![finished(0), finished(60), finished(3_600)];
        let hours = by_hour_of_day(&intervals);
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].hour, 19);
        assert_eq!(hours[0].peak_concurrent, 2);
        assert_eq!(hours[1].hour, 20);
        assert_eq!(hours[1].peak_concurrent, 1);
    }

    #[test]
    fn running_streams_are_ignored() {
        let running = StreamInterval {
            start: at(0),
            stop: None,
            category: None,
        };
        assert!(by_hour_of_day(&[running]).is_empty());
    }

    #[test]
    fn recommendation_tiers() {
        assert!(capacity_recommendation(2).starts_with("Light"));
        assert!(capacity_recommendation(5).starts_with("Moderate"));
        assert!(capacity_recommendation(10).starts_with("Heavy"));
        assert!(capacity_recommendation(20).starts_with("Very heavy"));
        assert!(capacity_recommendation(21).starts_with("Extreme"));
    }
}
