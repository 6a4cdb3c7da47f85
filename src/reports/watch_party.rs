use std::collections::{BTreeMap, BTreeSet};

use tokio_util::sync::CancellationToken;

use super::{most_frequent, ReportLimits};
use crate::cowatch::{detect_watch_parties, CoWatchConfig};
use crate::db::models::{ContentKey, PlaybackEvent};
use crate::error::Result;
use crate::models::{
    WatchPartiesByDay, WatchParty, WatchPartyAnalytics, WatchPartyContentStats,
    WatchPartyUserStats,
};
use crate::timebucket::{day_of_week, fill_week};

pub fn watch_party_analytics(
    events: &[PlaybackEvent],
    config: &CoWatchConfig,
    limits: ReportLimits,
    cancel: &CancellationToken,
) -> Result<WatchPartyAnalytics> {
    let parties = detect_watch_parties(events, config, cancel)?;
    let total_participants: usize = parties.iter().map(WatchParty::participant_count).sum();

    Ok(WatchPartyAnalytics {
        total_watch_parties: parties.len(),
        total_participants,
        avg_participants: if parties.is_empty() {
            0.0
        } else {
            total_participants as f64 / parties.len() as f64
        },
        same_location_parties: parties.iter().filter(|p| p.same_location).count(),
        top_content: top_content(&parties, limits.top),
        top_social_users: top_social_users(&parties, limits.top),
        parties_by_day: parties_by_day(&parties),
        recent_watch_parties: parties.into_iter().take(limits.recent).collect(),
    })
}

fn top_content(parties: &[WatchParty], limit: usize) -> Vec<WatchPartyContentStats> {
    #[derive(Default)]
    struct Tally {
        parties: usize,
        participants: usize,
        users: BTreeSet<i64>,
    }

    let mut by_content: BTreeMap<(&ContentKey, &str), Tally> = BTreeMap::new();
    for party in parties {
        let tally = by_content
            .entry((&party.content, party.media_type.as_str()))
            .or_default();
        tally.parties += 1;
        tally.participants += party.participant_count();
        tally.users.extend(party.participants.iter().map(|p| p.user_id));
    }

    let mut content: Vec<WatchPartyContentStats> = by_content
        .into_iter()
        .map(|((key, media_type), tally)| WatchPartyContentStats {
            content: key.clone(),
            media_type: media_type.to_string(),
            party_count: tally.parties,
            total_participants: tally.participants,
            avg_participants: tally.participants as f64 / tally.parties as f64,
            unique_users: tally.users.len(),
        })
        .collect();
    content.sort_by(|a, b| b.party_count.cmp(&a.party_count));
    content.truncate(limit);
    content
}

fn top_social_users(parties: &[WatchParty], limit: usize) -> Vec<WatchPartyUserStats> {
    struct Tally<'a> {
        username: &'a str,
        parties: usize,
        co_watchers: usize,
        party_size_sum: usize,
        same_location: usize,
        titles: BTreeMap<&'a str, usize>,
    }

    let mut by_user: BTreeMap<i64, Tally> = BTreeMap::new();
    for party in parties {
        let size = party.participant_count();
        for participant in &party.participants {
            let tally = by_user.entry(participant.user_id).or_insert_with(|| Tally {
                username: &participant.username,
                parties: 0,
                co_watchers: 0,
                party_size_sum: 0,
                same_location: 0,
                titles: BTreeMap::new(),
            });
            tally.parties += 1;
            tally.co_watchers += size - 1;
            tally.party_size_sum += size;
            if party.same_location {
                tally.same_location += 1;
            }
            *tally.titles.entry(party.content.display_title()).or_insert(0) += 1;
        }
    }

    let mut users: Vec<WatchPartyUserStats> = by_user
        .into_iter()
        .map(|(user_id, tally)| WatchPartyUserStats {
            user_id,
            username: tally.username.to_string(),
            party_count: tally.parties,
            total_co_watchers: tally.co_watchers,
            avg_party_size: tally.party_size_sum as f64 / tally.parties as f64,
            same_location_count: tally.same_location,
            favorite_content: most_frequent(&tally.titles),
        })
        .collect();
    users.sort_by(|a, b| b.party_count.cmp(&a.party_count));
    users.truncate(limit);
    users
}

fn parties_by_day(parties: &[WatchParty]) -> Vec<WatchPartiesByDay> {
    let mut by_day: BTreeMap<u32, (usize, usize)> = BTreeMap::new();
    for party in parties {
        let entry = by_day.entry(day_of_week(party.anchor_time)).or_default();
        entry.0 += 1;
        entry.1 += party.participant_count();
    }

    let by_day = by_day
        .into_iter()
        .map(|(day_of_week, (count, participants))| {
            (
                day_of_week,
                WatchPartiesByDay {
                    day_of_week,
                    party_count: count,
                    avg_participants: participants as f64 / count as f64,
                },
            )
        })
        .collect();

    fill_week(by_day, |day_of_week| WatchPartiesByDay {
        day_of_week,
        party_count: 0,
        avg_participants: 0.0,
    })
}
