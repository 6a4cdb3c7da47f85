use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;

use crate::concurrency::config::ConcurrencyConfig;
use crate::concurrency::sweep::{Endpoints, Sweep};
use crate::error::{check_cancelled, AnalyticsError, Result};
use crate::models::{CategoryConcurrency, ConcurrencyBucket, ConcurrencyEstimate, StreamInterval};
use crate::timebucket::floor_to_bucket;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Count simultaneously active streams per time bucket.
///
/// Intervals without a stop time are skipped: streams still in progress
/// are not counted, so peaks during the window may read low.
pub fn estimate_concurrency(
    intervals: &[StreamInterval],
    config: &ConcurrencyConfig,
    cancel: &CancellationToken,
) -> Result<ConcurrencyEstimate> {
    config.validate()?;

    let mut overall = Endpoints::default();
    let mut by_category: BTreeMap<String, Endpoints> = BTreeMap::new();
    let mut earliest: Option<DateTime<Utc>> = None;
    let mut latest: Option<DateTime<Utc>> = None;

    for interval in intervals {
        let Some(stop) = interval.stop else {
            continue;
        };
        if stop < interval.start {
            return Err(AnalyticsError::validation(format!(
                "stream stops at {stop} before it starts at {}",
                interval.start
            )));
        }

        overall.push(interval.start, stop);
        by_category
            .entry(category_of(interval).to_string())
            .or_default()
            .push(interval.start, stop);

        earliest = Some(earliest.map_or(interval.start, |e| e.min(interval.start)));
        latest = Some(latest.map_or(stop, |l| l.max(stop)));
    }

    let (Some(earliest), Some(latest)) = (earliest, latest) else {
        return Ok(ConcurrencyEstimate::empty());
    };

    let bucket_secs = config.bucket_size_secs;
    let first_bucket = floor_to_bucket(earliest, bucket_secs);
    let last_bucket = floor_to_bucket(latest, bucket_secs);
    let bucket_count = ((last_bucket - first_bucket).num_seconds() / bucket_secs) as usize + 1;
    if bucket_count > config.max_buckets {
        return Err(AnalyticsError::validation(format!(
            "{bucket_count} buckets of {bucket_secs}s exceed the limit of {}",
            config.max_buckets
        )));
    }

    let category_totals: Vec<(String, usize)> = by_category
        .iter()
        .map(|(category, endpoints)| (category.clone(), endpoints.len()))
        .collect();
    let total_sessions = overall.len();

    let mut overall_sweep = overall.into_sweep();
    let mut category_sweeps: Vec<(String, Sweep)> = by_category
        .into_iter()
        .map(|(category, endpoints)| (category, endpoints.into_sweep()))
        .collect();

    let bucket_size = config.bucket_size();
    let mut buckets = Vec::new();
    let mut peak: Option<ConcurrencyBucket> = None;
    let mut active_sum = 0usize;
    let mut active_buckets = 0usize;

    for index in 0..bucket_count {
        check_cancelled(cancel)?;

        let bucket_start = first_bucket + Duration::seconds(bucket_secs * index as i64);
        let bucket_end = bucket_start
            .checked_add_signed(bucket_size)
            .ok_or_else(|| {
                AnalyticsError::validation(format!(
                    "bucket at {bucket_start} plus {bucket_secs}s is out of range"
                ))
            })?;
        let active_count = overall_sweep.active_in(bucket_start, bucket_end);

        let mut breakdown = BTreeMap::new();
        for (category, sweep) in category_sweeps.iter_mut() {
            let count = sweep.active_in(bucket_start, bucket_end);
            if count > 0 {
                breakdown.insert(category.clone(), count);
            }
        }

        let bucket = ConcurrencyBucket {
            bucket_start,
            bucket_duration_secs: bucket_secs,
            active_count,
            breakdown,
        };

        if active_count > 0 {
            active_sum += active_count;
            active_buckets += 1;
            if peak.as_ref().map_or(true, |p| active_count > p.active_count) {
                peak = Some(bucket.clone());
            }
        }

        if active_count > 0 || config.include_idle_buckets {
            buckets.push(bucket);
        }
    }

    let average = if active_buckets == 0 {
        0.0
    } else {
        active_sum as f64 / active_buckets as f64
    };
    let peak_count = peak.as_ref().map_or(0, |p| p.active_count);
    let categories = category_shares(&category_totals, total_sessions, average, peak_count);

    log_debug!(
        "concurrency over {} streams: {} buckets, peak {}, average {:.2}",
        total_sessions,
        bucket_count,
        peak_count,
        average
    );

    Ok(ConcurrencyEstimate {
        buckets,
        peak,
        average,
        categories,
    })
}

fn category_of(interval: &StreamInterval) -> &str {
    match interval.category.as_deref() {
        Some(category) if !category.is_empty() => category,
        _ => UNKNOWN_CATEGORY,
    }
}

/// Split the overall average and peak across categories by session share.
///
/// This is a proportional estimate: it does not re-derive overlap counts per
/// category, so it can differ from the per-bucket breakdown.
pub fn category_shares(
    category_totals: &[(String, usize)],
    total_sessions: usize,
    average: f64,
    peak: usize,
) -> Vec<CategoryConcurrency> {
    if total_sessions == 0 {
        return Vec::new();
    }

    let mut shares: Vec<CategoryConcurrency> = category_totals
        .iter()
        .map(|(category, session_count)| {
            let share = *session_count as f64 / total_sessions as f64;
            CategoryConcurrency {
                category: category.clone(),
                session_count: *session_count,
                percentage: share * 100.0,
                avg_concurrent: average * share,
                peak_concurrent: (peak as f64 * share).floor() as usize,
            }
        })
        .collect();

    shares.sort_by(|a, b| {
        b.session_count
            .cmp(&a.session_count)
            .then_with(|| a.category.cmp(&b.category))
    });
    shares
}
