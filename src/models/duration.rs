use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationByMediaType {
    pub media_type: String,
    pub avg_duration_secs: i64,
    pub total_duration_secs: i64,
    pub playback_count: usize,
    pub avg_completion: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationStats {
    pub avg_duration_secs: i64,
    pub median_duration_secs: i64,
    pub total_duration_secs: i64,
    pub avg_completion: f64,
    pub fully_watched: usize,
    pub fully_watched_pct: f64,
    pub partially_watched: usize,
    pub duration_by_type: Vec<DurationByMediaType>,
}
