use std::collections::{BTreeMap, BTreeSet};

use tokio_util::sync::CancellationToken;

use super::{most_frequent, ReportLimits};
use crate::db::models::PlaybackEvent;
use crate::error::Result;
use crate::models::{BingeAnalytics, BingeShowStats, BingeUserStats, BingesByDay, SessionCluster};
use crate::segmentation::{segment_binges, SegmentationConfig};
use crate::timebucket::{day_of_week, fill_week, mean};

pub const EPISODE_MEDIA_TYPE: &str = "episode";

/// Binge summary over the episode events in `events`.
pub fn binge_analytics(
    events: &[PlaybackEvent],
    config: &SegmentationConfig,
    limits: ReportLimits,
    cancel: &CancellationToken,
) -> Result<BingeAnalytics> {
    let episodes: Vec<PlaybackEvent> = events
        .iter()
        .filter(|e| e.media_type == EPISODE_MEDIA_TYPE)
        .cloned()
        .collect();
    let clusters = segment_binges(&episodes, config, cancel)?;

    Ok(BingeAnalytics {
        total_binge_sessions: clusters.len(),
        total_episodes_binged: clusters.iter().map(|c| c.episode_count).sum(),
        avg_episodes_per_binge: mean(clusters.iter().map(|c| c.episode_count as f64)),
        avg_binge_duration_secs: mean(clusters.iter().map(|c| c.total_duration_secs as f64)),
        top_binge_shows: top_shows(&clusters, limits.top),
        top_binge_watchers: top_watchers(&clusters, limits.top),
        binges_by_day: binges_by_day(&clusters),
        recent_binge_sessions: clusters.into_iter().take(limits.recent).collect(),
    })
}

fn top_shows(clusters: &[SessionCluster], limit: usize) -> Vec<BingeShowStats> {
    #[derive(Default)]
    struct Tally {
        binges: usize,
        episodes: usize,
        watchers: BTreeSet<i64>,
    }

    let mut by_show: BTreeMap<&str, Tally> = BTreeMap::new();
    for cluster in clusters {
        let tally = by_show.entry(&cluster.show).or_default();
        tally.binges += 1;
        tally.episodes += cluster.episode_count;
        tally.watchers.insert(cluster.user_id);
    }

    let mut shows: Vec<BingeShowStats> = by_show
        .into_iter()
        .map(|(show, tally)| BingeShowStats {
            show: show.to_string(),
            binge_count: tally.binges,
            total_episodes: tally.episodes,
            unique_watchers: tally.watchers.len(),
            avg_episodes: tally.episodes as f64 / tally.binges as f64,
        })
        .collect();
    shows.sort_by(|a, b| b.binge_count.cmp(&a.binge_count));
    shows.truncate(limit);
    shows
}

fn top_watchers(clusters: &[SessionCluster], limit: usize) -> Vec<BingeUserStats> {
    struct Tally<'a> {
        username: &'a str,
        binges: usize,
        episodes: usize,
        shows: BTreeMap<&'a str, usize>,
    }

    let mut by_user: BTreeMap<i64, Tally> = BTreeMap::new();
    for cluster in clusters {
        let tally = by_user.entry(cluster.user_id).or_insert_with(|| Tally {
            username: &cluster.username,
            binges: 0,
            episodes: 0,
            shows: BTreeMap::new(),
        });
        tally.binges += 1;
        tally.episodes += cluster.episode_count;
        *tally.shows.entry(&cluster.show).or_insert(0) += 1;
    }

    let mut watchers: Vec<BingeUserStats> = by_user
        .into_iter()
        .map(|(user_id, tally)| BingeUserStats {
            user_id,
            username: tally.username.to_string(),
            binge_count: tally.binges,
            total_episodes: tally.episodes,
            avg_episodes: tally.episodes as f64 / tally.binges as f64,
            favorite_show: most_frequent(&tally.shows),
        })
        .collect();
    watchers.sort_by(|a, b| b.binge_count.cmp(&a.binge_count));
    watchers.truncate(limit);
    watchers
}

/// Keyed by the weekday of each session's first episode.
fn binges_by_day(clusters: &[SessionCluster]) -> Vec<BingesByDay> {
    let mut by_day: BTreeMap<u32, (usize, usize)> = BTreeMap::new();
    for cluster in clusters {
        let entry = by_day.entry(day_of_week(cluster.first_event_time)).or_default();
        entry.0 += 1;
        entry.1 += cluster.episode_count;
    }

    let by_day = by_day
        .into_iter()
        .map(|(day_of_week, (binges, episodes))| {
            (
                day_of_week,
                BingesByDay {
                    day_of_week,
                    binge_count: binges,
                    avg_episodes: (episodes / binges) as i64,
                },
            )
        })
        .collect();

    fill_week(by_day, |day_of_week| BingesByDay {
        day_of_week,
        binge_count: 0,
        avg_episodes: 0,
    })
}
