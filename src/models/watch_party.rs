//! Watch-party (co-viewing) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::ContentKey;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchParty {
    pub content: ContentKey,
    pub media_type: String,
    pub anchor_event_id: String,
    pub anchor_time: DateTime<Utc>,
    /// Distinct users, sorted by user id.
    pub participants: Vec<Participant>,
    pub same_location: bool,
    pub avg_completion: f64,
    pub total_duration_secs: i64,
    pub event_count: usize,
}

impl WatchParty {
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn has_user(&self, user_id: i64) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchPartyContentStats {
    pub content: ContentKey,
    pub media_type: String,
    pub party_count: usize,
    pub total_participants: usize,
    pub avg_participants: f64,
    pub unique_users: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchPartyUserStats {
    pub user_id: i64,
    pub username: String,
    pub party_count: usize,
    pub total_co_watchers: usize,
    pub avg_party_size: f64,
    pub same_location_count: usize,
    pub favorite_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchPartiesByDay {
    pub day_of_week: u32,
    pub party_count: usize,
    pub avg_participants: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchPartyAnalytics {
    pub total_watch_parties: usize,
    pub total_participants: usize,
    pub avg_participants: f64,
    pub same_location_parties: usize,
    pub recent_watch_parties: Vec<WatchParty>,
    pub top_content: Vec<WatchPartyContentStats>,
    pub top_social_users: Vec<WatchPartyUserStats>,
    pub parties_by_day: Vec<WatchPartiesByDay>,
}
