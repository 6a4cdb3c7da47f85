use chrono::Duration;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::error::AnalyticsError;
use crate::models::StreamInterval;
use crate::test_support::{at, base_time};
use crate::timebucket::floor_to_bucket;

const HOUR: i64 = 3_600;

fn interval(start: i64, stop: Option<i64>, category: Option<&str>) -> StreamInterval {
    StreamInterval {
        start: at(start),
        stop: stop.map(at),
        category: category.map(str::to_string),
    }
}

fn estimate(intervals: &[StreamInterval]) -> crate::models::ConcurrencyEstimate {
    estimate_concurrency(intervals, &ConcurrencyConfig::default(), &CancellationToken::new())
        .unwrap()
}

#[test]
fn simultaneous_sessions_peak_together() {
    let intervals: Vec<_> = (0..3).map(|_| interval(0, Some(2 * HOUR), None)).collect();
    let result = estimate(&intervals);

    let peak = result.peak.as_ref().expect("peak bucket");
    assert_eq!(peak.active_count, 3);
    assert_eq!(peak.bucket_start, floor_to_bucket(base_time(), HOUR));
    assert_eq!(result.peak_count(), 3);
    // 19:00, 20:00 and 21:00 (stop lands exactly on the 21:00 boundary).
    assert_eq!(result.buckets.len(), 3);
    assert!(result.buckets.iter().all(|b| b.active_count == 3));
    assert!((result.average - 3.0).abs() < 1e-9);
}

#[test]
fn no_finished_sessions_is_empty_not_error() {
    let result = estimate(&[interval(0, None, None), interval(HOUR, None, None)]);
    assert!(result.buckets.is_empty());
    assert!(result.peak.is_none());
    assert_eq!(result.average, 0.0);
    assert!(result.categories.is_empty());

    assert!(estimate(&[]).buckets.is_empty());
}

#[test]
fn running_sessions_are_excluded() {
    let result = estimate(&[interval(0, Some(600), None), interval(0, None, None)]);
    assert_eq!(result.peak_count(), 1);
}

#[test]
fn idle_buckets_are_skipped_and_never_averaged() {
    // Active in hours 0 and 5 only.
    let intervals = vec![
        interval(0, Some(600), None),
        interval(60, Some(900), None),
        interval(5 * HOUR + 60, Some(5 * HOUR + 600), None),
    ];

    let sparse = estimate(&intervals);
    assert_eq!(sparse.buckets.len(), 2);
    assert!((sparse.average - 1.5).abs() < 1e-9);

    let config = ConcurrencyConfig {
        include_idle_buckets: true,
        ..ConcurrencyConfig::default()
    };
    let dense = estimate_concurrency(&intervals, &config, &CancellationToken::new()).unwrap();
    assert_eq!(dense.buckets.len(), 6);
    assert_eq!(dense.buckets[2].active_count, 0);
    assert!((dense.average - sparse.average).abs() < 1e-9);
}

#[test]
fn peak_ties_go_to_earliest_bucket() {
    let intervals = vec![
        interval(0, Some(600), None),
        interval(3 * HOUR + 60, Some(3 * HOUR + 600), None),
    ];
    let result = estimate(&intervals);
    assert_eq!(result.peak.unwrap().bucket_start, floor_to_bucket(at(0), HOUR));
}

#[test]
fn breakdown_counts_each_category_exactly() {
    let intervals = vec![
        interval(0, Some(1_800), Some("transcode")),
        interval(60, Some(1_800), Some("direct play")),
        interval(120, Some(1_800), Some("direct play")),
        interval(180, Some(1_800), None),
    ];
    let result = estimate(&intervals);
    let bucket = &result.buckets[0];

    assert_eq!(bucket.active_count, 4);
    assert_eq!(bucket.breakdown.get("direct play"), Some(&2));
    assert_eq!(bucket.breakdown.get("transcode"), Some(&1));
    assert_eq!(bucket.breakdown.get(UNKNOWN_CATEGORY), Some(&1));
}

#[test]
fn category_shares_are_proportional() {
    let intervals = vec![
        interval(0, Some(1_800), Some("transcode")),
        interval(0, Some(1_800), Some("direct play")),
        interval(0, Some(1_800), Some("direct play")),
        interval(0, Some(1_800), Some("direct play")),
    ];
    let result = estimate(&intervals);

    assert_eq!(result.categories.len(), 2);
    let direct = &result.categories[0];
    assert_eq!(direct.category, "direct play");
    assert_eq!(direct.session_count, 3);
    assert!((direct.percentage - 75.0).abs() < 1e-9);
    assert!((direct.avg_concurrent - 3.0).abs() < 1e-9);
    assert_eq!(direct.peak_concurrent, 3);

    let transcode = &result.categories[1];
    assert_eq!(transcode.peak_concurrent, 1);
    assert!((transcode.avg_concurrent - 1.0).abs() < 1e-9);
}

#[test]
fn category_peak_share_is_floored() {
    let shares = category_shares(&[("a".into(), 1), ("b".into(), 2)], 3, 2.0, 4);
    assert_eq!(shares[0].category, "b");
    assert_eq!(shares[0].peak_concurrent, 2);
    assert_eq!(shares[1].peak_concurrent, 1);
}

#[test]
fn buckets_align_to_epoch() {
    let config = ConcurrencyConfig {
        bucket_size_secs: 900,
        ..ConcurrencyConfig::default()
    };
    let start = base_time() + Duration::seconds(1_000);
    let intervals = vec![StreamInterval {
        start,
        stop: Some(start + Duration::seconds(100)),
        category: None,
    }];
    let result = estimate_concurrency(&intervals, &config, &CancellationToken::new()).unwrap();
    assert_eq!(result.buckets.len(), 1);
    assert_eq!(result.buckets[0].bucket_start, base_time() + Duration::seconds(900));
    assert_eq!(result.buckets[0].bucket_duration_secs, 900);
}

#[test]
fn stop_before_start_is_rejected() {
    let err = estimate_concurrency(
        &[interval(HOUR, Some(0), None)],
        &ConcurrencyConfig::default(),
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, AnalyticsError::Validation(_)));
}

#[test]
fn invalid_configuration_is_rejected() {
    let zero = ConcurrencyConfig {
        bucket_size_secs: 0,
        ..ConcurrencyConfig::default()
    };
    let err = estimate_concurrency(&[], &zero, &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, AnalyticsError::Validation(_)));

    let capped = ConcurrencyConfig {
        bucket_size_secs: 60,
        max_buckets: 10,
        ..ConcurrencyConfig::default()
    };
    let err = estimate_concurrency(
        &[interval(0, Some(HOUR), None)],
        &capped,
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, AnalyticsError::Validation(_)));
}

#[test]
fn oversized_bucket_is_rejected_not_panicking() {
    let intervals = [interval(0, Some(HOUR), None)];
    let huge = ConcurrencyConfig {
        bucket_size_secs: 1_000_000_000_000_000,
        ..ConcurrencyConfig::default()
    };
    let err = estimate_concurrency(&intervals, &huge, &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, AnalyticsError::Validation(_)));

    let widest = ConcurrencyConfig {
        bucket_size_secs: crate::timebucket::MAX_SPAN_SECS,
        ..ConcurrencyConfig::default()
    };
    let result = estimate_concurrency(&intervals, &widest, &CancellationToken::new()).unwrap();
    assert_eq!(result.peak_count(), 1);
    assert_eq!(result.buckets.len(), 1);
}

#[test]
fn shuffled_input_gives_identical_output() {
    let mut intervals = vec![
        interval(0, Some(2 * HOUR), Some("direct play")),
        interval(30 * 60, Some(HOUR), Some("transcode")),
        interval(HOUR, Some(3 * HOUR), Some("copy")),
        interval(4 * HOUR, Some(5 * HOUR), None),
        interval(4 * HOUR, None, Some("transcode")),
    ];
    let first = serde_json::to_string(&estimate(&intervals)).unwrap();
    intervals.reverse();
    intervals.swap(0, 2);
    let second = serde_json::to_string(&estimate(&intervals)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn cancelled_token_aborts() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = estimate_concurrency(
        &[interval(0, Some(HOUR), None)],
        &ConcurrencyConfig::default(),
        &cancel,
    )
    .unwrap_err();
    assert!(err.is_cancelled());
}
