use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;

use crate::concurrency::{
    by_day_of_week, by_hour_of_day, capacity_recommendation, estimate_concurrency,
    ConcurrencyConfig,
};
use crate::db::models::PlaybackEvent;
use crate::error::Result;
use crate::models::{ConcurrentStreamsAnalytics, StreamInterval};

/// One interval per finished playback session.
///
/// Events sharing a session key (resumes, quality switches) collapse into
/// their earliest start and latest stop. Events without a session key stand
/// alone. Events still running are skipped before merging, so a running
/// resume never widens a finished session.
pub fn session_intervals(events: &[PlaybackEvent]) -> Vec<StreamInterval> {
    let mut sessions: BTreeMap<&str, StreamInterval> = BTreeMap::new();

    for event in events {
        let Some(stopped_at) = event.stopped_at else {
            continue;
        };
        let key = if event.session_key.is_empty() {
            event.id.as_str()
        } else {
            event.session_key.as_str()
        };

        match sessions.get_mut(key) {
            Some(interval) => {
                if event.started_at < interval.start {
                    interval.start = event.started_at;
                    interval.category = event.transcode_decision.clone();
                }
                interval.stop = interval.stop.max(Some(stopped_at));
            }
            None => {
                sessions.insert(
                    key,
                    StreamInterval {
                        start: event.started_at,
                        stop: Some(stopped_at),
                        category: event.transcode_decision.clone(),
                    },
                );
            }
        }
    }

    sessions.into_values().collect()
}

pub fn concurrent_streams(
    events: &[PlaybackEvent],
    config: &ConcurrencyConfig,
    cancel: &CancellationToken,
) -> Result<ConcurrentStreamsAnalytics> {
    let intervals = session_intervals(events);
    let estimate = estimate_concurrency(&intervals, config, cancel)?;
    let peak_concurrent = estimate.peak_count();

    Ok(ConcurrentStreamsAnalytics {
        peak_concurrent,
        peak_time: estimate.peak.as_ref().map(|bucket| bucket.bucket_start),
        avg_concurrent: estimate.average,
        total_sessions: intervals.iter().filter(|i| i.stop.is_some()).count(),
        time_series: estimate.buckets,
        by_transcode_decision: estimate.categories,
        by_day_of_week: by_day_of_week(&intervals),
        by_hour_of_day: by_hour_of_day(&intervals),
        capacity_recommendation: capacity_recommendation(peak_concurrent).to_string(),
    })
}
