use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PlaybackEvent;

/// Predicate applied by every event source before events reach the core.
///
/// Date bounds are inclusive on `started_at`; empty lists do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub media_types: Vec<String>,
}

impl EventFilter {
    pub fn with_media_types(mut self, media_types: &[&str]) -> Self {
        self.media_types = media_types.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn matches(&self, event: &PlaybackEvent) -> bool {
        if let Some(start) = self.start_date {
            if event.started_at < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if event.started_at > end {
                return false;
            }
        }
        if !self.users.is_empty() && !self.users.iter().any(|u| *u == event.username) {
            return false;
        }
        if !self.media_types.is_empty()
            && !self.media_types.iter().any(|m| *m == event.media_type)
        {
            return false;
        }
        true
    }
}
