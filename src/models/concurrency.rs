//! Concurrent-stream models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed playback interval fed to the concurrency estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInterval {
    pub start: DateTime<Utc>,
    /// `None` while the stream is still running; such intervals are not counted.
    pub stop: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrencyBucket {
    pub bucket_start: DateTime<Utc>,
    pub bucket_duration_secs: i64,
    pub active_count: usize,
    pub breakdown: BTreeMap<String, usize>,
}

/// Proportional per-category estimate derived from the overall average/peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConcurrency {
    pub category: String,
    pub session_count: usize,
    pub percentage: f64,
    pub avg_concurrent: f64,
    pub peak_concurrent: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrencyEstimate {
    pub buckets: Vec<ConcurrencyBucket>,
    pub peak: Option<ConcurrencyBucket>,
    pub average: f64,
    pub categories: Vec<CategoryConcurrency>,
}

impl ConcurrencyEstimate {
    pub fn empty() -> Self {
        Self {
            buckets: Vec::new(),
            peak: None,
            average: 0.0,
            categories: Vec::new(),
        }
    }

    pub fn peak_count(&self) -> usize {
        self.peak.as_ref().map(|b| b.active_count).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrencyByDay {
    pub day_of_week: u32,
    pub avg_concurrent: f64,
    pub peak_concurrent: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrencyByHour {
    pub hour: u32,
    pub avg_concurrent: f64,
    pub peak_concurrent: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrentStreamsAnalytics {
    pub peak_concurrent: usize,
    pub peak_time: Option<DateTime<Utc>>,
    pub avg_concurrent: f64,
    pub total_sessions: usize,
    pub time_series: Vec<ConcurrencyBucket>,
    pub by_transcode_decision: Vec<CategoryConcurrency>,
    pub by_day_of_week: Vec<ConcurrencyByDay>,
    pub by_hour_of_day: Vec<ConcurrencyByHour>,
    pub capacity_recommendation: String,
}
