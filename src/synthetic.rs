//! Synthetic viewing history for demos and manual testing.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::db::models::{ContentKey, PlaybackEvent};
use crate::timebucket::floor_to_bucket;

const SHOWS: &[&str] = &[
    "The Expanse",
    "Severance",
    "Dark",
    "Slow Horses",
    "Andor",
    "The Bear",
];
const MOVIES: &[&str] = &["Arrival", "Heat", "Paddington 2", "Spirited Away", "Alien", "Up"];
const TRANSCODE_DECISIONS: &[&str] = &["direct play", "copy", "transcode"];

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub users: usize,
    pub days: u32,
    /// Fixed seed for reproducible output; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            users: 6,
            days: 30,
            seed: None,
        }
    }
}

/// Generates binges, stray plays and group movie nights for a set of users.
pub struct SyntheticHistory {
    options: SeedOptions,
    rng: StdRng,
}

impl SyntheticHistory {
    pub fn new(options: SeedOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { options, rng }
    }

    /// Events for the `days` days ending at `until`, ascending by start.
    pub fn generate(&mut self, until: DateTime<Utc>) -> Vec<PlaybackEvent> {
        let first_day = floor_to_bucket(until, SECONDS_PER_DAY)
            - Duration::days(i64::from(self.options.days));
        let mut events = Vec::new();

        for day in 0..self.options.days {
            let midnight = first_day + Duration::days(i64::from(day));
            for user in 0..self.options.users {
                let user_id = user as i64 + 1;
                if self.rng.gen_bool(0.35) {
                    events.extend(self.binge(user_id, midnight));
                } else if self.rng.gen_bool(0.4) {
                    events.push(self.single_play(user_id, midnight));
                }
            }
            if self.options.users >= 2 && self.rng.gen_bool(0.25) {
                events.extend(self.movie_night(midnight));
            }
        }

        events.retain(|e| e.started_at <= until);
        events.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        events
    }

    fn binge(&mut self, user_id: i64, midnight: DateTime<Utc>) -> Vec<PlaybackEvent> {
        let show = SHOWS.choose(&mut self.rng).copied().unwrap_or("Untitled");
        let season = self.rng.gen_range(1..=4);
        let first_episode = self.rng.gen_range(1..=6);
        let episode_count = self.rng.gen_range(2..=6);
        let mut start = midnight + Duration::minutes(self.rng.gen_range(18 * 60..22 * 60));

        (0..episode_count)
            .map(|offset| {
                let title = format!("Episode {}", first_episode + offset);
                let season_title = format!("Season {season}");
                let content = ContentKey::new(title, Some(season_title.as_str()), Some(show));
                let event = self.play(user_id, "episode", content, start, 2_400..=2_760);
                start += Duration::minutes(self.rng.gen_range(46..60));
                event
            })
            .collect()
    }

    fn single_play(&mut self, user_id: i64, midnight: DateTime<Utc>) -> PlaybackEvent {
        let start = midnight + Duration::minutes(self.rng.gen_range(8 * 60..23 * 60));
        if self.rng.gen_bool(0.5) {
            let title = MOVIES.choose(&mut self.rng).copied().unwrap_or("Untitled");
            self.play(user_id, "movie", ContentKey::new(title, None, None), start, 5_400..=8_400)
        } else {
            let show = SHOWS.choose(&mut self.rng).copied().unwrap_or("Untitled");
            let content = ContentKey::new("Episode 1", Some("Season 1"), Some(show));
            self.play(user_id, "episode", content, start, 600..=2_700)
        }
    }

    /// Several users starting the same movie within a few minutes.
    fn movie_night(&mut self, midnight: DateTime<Utc>) -> Vec<PlaybackEvent> {
        let title = MOVIES.choose(&mut self.rng).copied().unwrap_or("Untitled");
        let guests = self.rng.gen_range(2..=self.options.users.min(4));
        let mut user_ids: Vec<i64> = (1..=self.options.users as i64).collect();
        user_ids.shuffle(&mut self.rng);
        let same_room = self.rng.gen_bool(0.5);
        let start = midnight + Duration::minutes(self.rng.gen_range(19 * 60..21 * 60));

        user_ids
            .into_iter()
            .take(guests)
            .map(|user_id| {
                let offset = Duration::seconds(self.rng.gen_range(0..600));
                let mut event = self.play(
                    user_id,
                    "movie",
                    ContentKey::new(title, None, None),
                    start + offset,
                    5_400..=8_400,
                );
                if same_room {
                    event.ip_address = "192.168.1.2".to_string();
                }
                event
            })
            .collect()
    }

    fn play(
        &mut self,
        user_id: i64,
        media_type: &str,
        content: ContentKey,
        started_at: DateTime<Utc>,
        length_secs: std::ops::RangeInclusive<i64>,
    ) -> PlaybackEvent {
        let duration = self.rng.gen_range(length_secs);
        let finished = self.rng.gen_bool(0.7);
        PlaybackEvent {
            id: Uuid::new_v4().to_string(),
            session_key: Uuid::new_v4().simple().to_string(),
            user_id,
            username: format!("viewer{user_id}"),
            media_type: media_type.to_string(),
            content,
            started_at,
            stopped_at: Some(started_at + Duration::seconds(duration)),
            play_duration_secs: Some(duration),
            percent_complete: if finished {
                100.0
            } else {
                f64::from(self.rng.gen_range(5..95u32))
            },
            ip_address: format!("10.0.{}.{}", user_id / 250, user_id % 250 + 2),
            transcode_decision: TRANSCODE_DECISIONS
                .choose(&mut self.rng)
                .map(|d| d.to_string()),
        }
    }
}
