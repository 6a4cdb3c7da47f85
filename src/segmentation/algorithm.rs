use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::db::models::PlaybackEvent;
use crate::error::{check_cancelled, AnalyticsError, Result};
use crate::models::SessionCluster;
use crate::segmentation::config::SegmentationConfig;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// All events of one user for one show, ascending by start time.
#[derive(Debug, Clone)]
pub struct ViewingGroup<'a> {
    pub user_id: i64,
    pub show: &'a str,
    pub events: Vec<&'a PlaybackEvent>,
}

impl ViewingGroup<'_> {
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// Running aggregate for the session currently being built.
struct OpenSession<'a> {
    first: &'a PlaybackEvent,
    last_start: DateTime<Utc>,
    count: usize,
    total_duration_secs: i64,
    completion_sum: f64,
}

impl<'a> OpenSession<'a> {
    fn start(event: &'a PlaybackEvent) -> Self {
        Self {
            first: event,
            last_start: event.started_at,
            count: 1,
            total_duration_secs: event.duration_or_zero(),
            completion_sum: event.percent_complete,
        }
    }

    fn extend(&mut self, event: &PlaybackEvent) {
        self.last_start = event.started_at;
        self.count += 1;
        self.total_duration_secs += event.duration_or_zero();
        self.completion_sum += event.percent_complete;
    }

    fn finish(self, min_episodes: usize) -> Option<SessionCluster> {
        if self.count < min_episodes {
            return None;
        }
        Some(SessionCluster {
            user_id: self.first.user_id,
            username: self.first.username.clone(),
            show: self.first.show_key().to_string(),
            episode_count: self.count,
            first_event_time: self.first.started_at,
            last_event_time: self.last_start,
            total_duration_secs: self.total_duration_secs,
            avg_completion: self.completion_sum / self.count as f64,
        })
    }
}

/// Main segmentation entry point: events in any order, binge sessions out.
///
/// Events without a show (movies, tracks, orphaned episodes) are ignored.
/// Output is ordered by first episode time, newest first.
pub fn segment_binges(
    events: &[PlaybackEvent],
    config: &SegmentationConfig,
    cancel: &CancellationToken,
) -> Result<Vec<SessionCluster>> {
    config.validate()?;

    let groups = group_events(events);
    let mut clusters = Vec::new();

    for group in &groups {
        check_cancelled(cancel)?;
        clusters.extend(segment_sorted_run(&group.events, config)?);
    }

    clusters.sort_by(|a, b| {
        b.first_event_time
            .cmp(&a.first_event_time)
            .then_with(|| a.user_id.cmp(&b.user_id))
            .then_with(|| a.show.cmp(&b.show))
    });

    log_debug!(
        "segmented {} events in {} user/show groups into {} binge sessions",
        events.len(),
        groups.len(),
        clusters.len()
    );

    Ok(clusters)
}

/// Group events by (user, show) and sort each group by start time.
pub fn group_events(events: &[PlaybackEvent]) -> Vec<ViewingGroup<'_>> {
    let mut by_key: BTreeMap<(i64, &str), Vec<&PlaybackEvent>> = BTreeMap::new();

    for event in events {
        if event.show_key().is_empty() {
            continue;
        }
        by_key
            .entry((event.user_id, event.show_key()))
            .or_default()
            .push(event);
    }

    by_key
        .into_iter()
        .map(|((user_id, show), mut events)| {
            events.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
            ViewingGroup {
                user_id,
                show,
                events,
            }
        })
        .collect()
}

/// Segment one (user, show) run that is already sorted by start time.
///
/// Walks the run carrying the previous start; a gap strictly above the
/// threshold closes the current session. Returns `Precondition` if the run is
/// unsorted or mixes users/shows.
pub fn segment_sorted_run(
    events: &[&PlaybackEvent],
    config: &SegmentationConfig,
) -> Result<Vec<SessionCluster>> {
    let Some(head) = events.first() else {
        return Ok(Vec::new());
    };

    let threshold = config.gap_threshold();
    let mut sessions = Vec::new();
    let mut current = OpenSession::start(head);

    for pair in events.windows(2) {
        let (previous, event) = (pair[0], pair[1]);

        if event.user_id != head.user_id || event.show_key() != head.show_key() {
            return Err(AnalyticsError::precondition(format!(
                "event {} does not belong to run for user {} / show '{}'",
                event.id,
                head.user_id,
                head.show_key()
            )));
        }
        if event.started_at < previous.started_at {
            return Err(AnalyticsError::precondition(format!(
                "event {} starts at {} before its predecessor at {}",
                event.id, event.started_at, previous.started_at
            )));
        }

        if event.started_at - previous.started_at > threshold {
            let closed = std::mem::replace(&mut current, OpenSession::start(event));
            sessions.extend(closed.finish(config.min_episodes));
        } else {
            current.extend(event);
        }
    }

    sessions.extend(current.finish(config.min_episodes));
    Ok(sessions)
}
