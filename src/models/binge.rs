//! Binge-watching models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One binge session: consecutive episodes of a show by one user with no gap
/// above the segmentation threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCluster {
    pub user_id: i64,
    pub username: String,
    pub show: String,
    pub episode_count: usize,
    pub first_event_time: DateTime<Utc>,
    pub last_event_time: DateTime<Utc>,
    pub total_duration_secs: i64,
    pub avg_completion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BingeShowStats {
    pub show: String,
    pub binge_count: usize,
    pub total_episodes: usize,
    pub unique_watchers: usize,
    pub avg_episodes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BingeUserStats {
    pub user_id: i64,
    pub username: String,
    pub binge_count: usize,
    pub total_episodes: usize,
    pub avg_episodes: f64,
    pub favorite_show: String,
}

/// Day 0 is Sunday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BingesByDay {
    pub day_of_week: u32,
    pub binge_count: usize,
    pub avg_episodes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BingeAnalytics {
    pub total_binge_sessions: usize,
    pub total_episodes_binged: usize,
    pub avg_episodes_per_binge: f64,
    pub avg_binge_duration_secs: f64,
    pub recent_binge_sessions: Vec<SessionCluster>,
    pub top_binge_shows: Vec<BingeShowStats>,
    pub top_binge_watchers: Vec<BingeUserStats>,
    pub binges_by_day: Vec<BingesByDay>,
}
