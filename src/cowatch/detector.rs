use std::collections::{BTreeMap, BTreeSet};

use tokio_util::sync::CancellationToken;

use crate::cowatch::config::{CoWatchConfig, GroupingStrategy};
use crate::cowatch::union_find::UnionFind;
use crate::db::models::{ContentKey, PlaybackEvent};
use crate::error::{check_cancelled, Result};
use crate::models::{Participant, WatchParty};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Find groups of distinct users who started the same content close together.
///
/// Output is ordered by anchor time, newest first, then anchor event id.
pub fn detect_watch_parties(
    events: &[PlaybackEvent],
    config: &CoWatchConfig,
    cancel: &CancellationToken,
) -> Result<Vec<WatchParty>> {
    config.validate()?;

    let by_content = group_by_content(events);
    let mut parties = Vec::new();

    for (content, run) in &by_content {
        check_cancelled(cancel)?;
        match config.strategy {
            GroupingStrategy::Anchor => parties.extend(anchor_parties(content, run, config)),
            GroupingStrategy::ConnectedComponents => {
                parties.extend(component_parties(content, run, config))
            }
        }
    }

    parties.sort_by(|a, b| {
        b.anchor_time
            .cmp(&a.anchor_time)
            .then_with(|| a.anchor_event_id.cmp(&b.anchor_event_id))
    });

    log_debug!(
        "detected {} watch parties across {} titles ({:?})",
        parties.len(),
        by_content.len(),
        config.strategy
    );

    Ok(parties)
}

/// Events per content key, each run ascending by start time then id.
fn group_by_content(events: &[PlaybackEvent]) -> BTreeMap<&ContentKey, Vec<&PlaybackEvent>> {
    let mut by_content: BTreeMap<&ContentKey, Vec<&PlaybackEvent>> = BTreeMap::new();
    for event in events {
        by_content.entry(&event.content).or_default().push(event);
    }
    for run in by_content.values_mut() {
        run.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
    }
    by_content
}

/// Every event anchors a window of `[start - w, start + w]`; both window
/// edges only move forward as the anchor advances through the sorted run.
fn anchor_parties(
    content: &ContentKey,
    run: &[&PlaybackEvent],
    config: &CoWatchConfig,
) -> Vec<WatchParty> {
    let window = config.proximity_window();
    let mut parties = Vec::new();
    let (mut low, mut high) = (0usize, 0usize);

    for anchor in run {
        // A window edge past the representable range is unbounded on that side.
        if let Some(earliest) = anchor.started_at.checked_sub_signed(window) {
            while run[low].started_at < earliest {
                low += 1;
            }
        }
        match anchor.started_at.checked_add_signed(window) {
            Some(latest) => {
                while high < run.len() && run[high].started_at <= latest {
                    high += 1;
                }
            }
            None => high = run.len(),
        }
        parties.extend(build_party(content, anchor, &run[low..high], config));
    }

    parties
}

/// Adjacent events within the window are linked; each linked component is
/// one party anchored at its earliest event.
fn component_parties(
    content: &ContentKey,
    run: &[&PlaybackEvent],
    config: &CoWatchConfig,
) -> Vec<WatchParty> {
    let window = config.proximity_window();
    let mut sets = UnionFind::new(run.len());

    for (index, pair) in run.windows(2).enumerate() {
        if pair[1].started_at - pair[0].started_at <= window {
            sets.union(index, index + 1);
        }
    }

    sets.groups()
        .into_iter()
        .filter_map(|members| {
            let members: Vec<&PlaybackEvent> = members.into_iter().map(|i| run[i]).collect();
            build_party(content, members[0], &members, config)
        })
        .collect()
}

fn build_party(
    content: &ContentKey,
    anchor: &PlaybackEvent,
    members: &[&PlaybackEvent],
    config: &CoWatchConfig,
) -> Option<WatchParty> {
    let mut users: BTreeMap<i64, &str> = BTreeMap::new();
    for event in members {
        users.entry(event.user_id).or_insert(event.username.as_str());
    }
    if users.len() < config.min_participants {
        return None;
    }

    let locations: BTreeSet<&str> = members
        .iter()
        .map(|e| e.ip_address.as_str())
        .filter(|ip| !ip.is_empty())
        .collect();

    let completion_sum: f64 = members.iter().map(|e| e.percent_complete).sum();

    Some(WatchParty {
        content: content.clone(),
        media_type: anchor.media_type.clone(),
        anchor_event_id: anchor.id.clone(),
        anchor_time: anchor.started_at,
        participants: users
            .into_iter()
            .map(|(user_id, username)| Participant {
                user_id,
                username: username.to_string(),
            })
            .collect(),
        same_location: locations.len() == 1,
        avg_completion: completion_sum / members.len() as f64,
        total_duration_secs: members.iter().map(|e| e.duration_or_zero()).sum(),
        event_count: members.len(),
    })
}
