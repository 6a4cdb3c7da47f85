//! Playback event data model.
//!
//! One row per playback reported by the media server. The analytics core
//! only ever reads these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Composite content identity: title + parent title + grandparent title.
///
/// Missing parent/grandparent titles are stored as empty strings so that
/// `None` and `""` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentKey {
    pub title: String,
    #[serde(default)]
    pub parent_title: String,
    #[serde(default)]
    pub grandparent_title: String,
}

impl ContentKey {
    pub fn new(
        title: impl Into<String>,
        parent_title: Option<&str>,
        grandparent_title: Option<&str>,
    ) -> Self {
        Self {
            title: title.into(),
            parent_title: parent_title.unwrap_or_default().to_string(),
            grandparent_title: grandparent_title.unwrap_or_default().to_string(),
        }
    }

    /// Grandparent title if present, otherwise the title itself.
    pub fn display_title(&self) -> &str {
        if self.grandparent_title.is_empty() {
            &self.title
        } else {
            &self.grandparent_title
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
    /// Assigned on import when missing.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub session_key: String,
    pub user_id: i64,
    pub username: String,
    pub media_type: String,
    pub content: ContentKey,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub play_duration_secs: Option<i64>,
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub transcode_decision: Option<String>,
}

impl PlaybackEvent {
    /// Show identity used for binge grouping; empty for movies and tracks.
    pub fn show_key(&self) -> &str {
        &self.content.grandparent_title
    }

    pub fn duration_or_zero(&self) -> i64 {
        self.play_duration_secs.unwrap_or(0)
    }
}
