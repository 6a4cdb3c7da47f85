use std::collections::BTreeMap;

use crate::db::models::PlaybackEvent;
use crate::models::{DurationByMediaType, DurationStats};
use crate::timebucket::{mean, summarize_durations};

/// Playback duration statistics over events with a positive duration.
pub fn duration_stats(events: &[PlaybackEvent]) -> DurationStats {
    let timed: Vec<(&PlaybackEvent, i64)> = events
        .iter()
        .filter_map(|e| e.play_duration_secs.filter(|secs| *secs > 0).map(|secs| (e, secs)))
        .collect();
    if timed.is_empty() {
        return DurationStats::default();
    }

    let durations: Vec<i64> = timed.iter().map(|(_, secs)| *secs).collect();
    let summary = summarize_durations(&durations);
    let fully_watched = timed
        .iter()
        .filter(|(e, _)| e.percent_complete >= 100.0)
        .count();

    let mut by_type: BTreeMap<&str, (Vec<i64>, f64)> = BTreeMap::new();
    for (event, secs) in &timed {
        let entry = by_type.entry(&event.media_type).or_default();
        entry.0.push(*secs);
        entry.1 += event.percent_complete;
    }

    let mut duration_by_type: Vec<DurationByMediaType> = by_type
        .into_iter()
        .map(|(media_type, (secs, completion_sum))| {
            let summary = summarize_durations(&secs);
            DurationByMediaType {
                media_type: media_type.to_string(),
                avg_duration_secs: summary.average,
                total_duration_secs: summary.total,
                playback_count: summary.count,
                avg_completion: completion_sum / summary.count as f64,
            }
        })
        .collect();
    duration_by_type.sort_by(|a, b| b.total_duration_secs.cmp(&a.total_duration_secs));

    DurationStats {
        avg_duration_secs: summary.average,
        median_duration_secs: summary.median,
        total_duration_secs: summary.total,
        avg_completion: mean(timed.iter().map(|(e, _)| e.percent_complete)),
        fully_watched,
        fully_watched_pct: fully_watched as f64 / timed.len() as f64 * 100.0,
        partially_watched: timed.len() - fully_watched,
        duration_by_type,
    }
}
