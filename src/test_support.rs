// Shared fixtures for unit tests

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::db::models::{ContentKey, PlaybackEvent};

/// Saturday 2024-06-15 19:00:00 UTC.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 19, 0, 0).unwrap()
}

pub fn at(offset_secs: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(offset_secs)
}

/// Builder for playback events with sensible defaults.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: PlaybackEvent,
}

impl EventBuilder {
    pub fn new(id: &str, user_id: i64) -> Self {
        Self {
            event: PlaybackEvent {
                id: id.to_string(),
                session_key: format!("session-{id}"),
                user_id,
                username: format!("user{user_id}"),
                media_type: "movie".to_string(),
                content: ContentKey::new("Untitled", None, None),
                started_at: base_time(),
                stopped_at: None,
                play_duration_secs: None,
                percent_complete: 100.0,
                ip_address: String::new(),
                transcode_decision: None,
            },
        }
    }

    pub fn episode(mut self, show: &str, title: &str) -> Self {
        self.event.media_type = "episode".to_string();
        self.event.content = ContentKey::new(title, Some("Season 1"), Some(show));
        self
    }

    pub fn movie(mut self, title: &str) -> Self {
        self.event.media_type = "movie".to_string();
        self.event.content = ContentKey::new(title, None, None);
        self
    }

    pub fn started(mut self, offset_secs: i64) -> Self {
        self.event.started_at = at(offset_secs);
        self
    }

    pub fn lasting(mut self, secs: i64) -> Self {
        self.event.stopped_at = Some(self.event.started_at + Duration::seconds(secs));
        self.event.play_duration_secs = Some(secs);
        self
    }

    pub fn duration(mut self, secs: Option<i64>) -> Self {
        self.event.play_duration_secs = secs;
        self
    }

    pub fn completion(mut self, percent: f64) -> Self {
        self.event.percent_complete = percent;
        self
    }

    pub fn ip(mut self, ip: &str) -> Self {
        self.event.ip_address = ip.to_string();
        self
    }

    pub fn session(mut self, key: &str) -> Self {
        self.event.session_key = key.to_string();
        self
    }

    pub fn transcode(mut self, decision: &str) -> Self {
        self.event.transcode_decision = Some(decision.to_string());
        self
    }

    pub fn build(self) -> PlaybackEvent {
        self.event
    }
}

/// Episodes of one show for one user at the given start offsets.
pub fn episodes(user_id: i64, show: &str, offsets: &[i64]) -> Vec<PlaybackEvent> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, offset)| {
            EventBuilder::new(&format!("{show}-{user_id}-{i}"), user_id)
                .episode(show, &format!("Episode {}", i + 1))
                .started(*offset)
                .lasting(2_700)
                .build()
        })
        .collect()
}
