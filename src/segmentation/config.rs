use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::timebucket::MAX_SPAN_SECS;

/// Tunable thresholds for binge segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// A start-to-start gap strictly greater than this opens a new session.
    pub gap_threshold_secs: i64,

    /// Sessions with fewer episodes are discarded.
    pub min_episodes: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            gap_threshold_secs: 6 * 60 * 60,
            min_episodes: 3,
        }
    }
}

impl SegmentationConfig {
    pub fn gap_threshold(&self) -> Duration {
        Duration::seconds(self.gap_threshold_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gap_threshold_secs <= 0 || self.gap_threshold_secs > MAX_SPAN_SECS {
            return Err(AnalyticsError::validation(format!(
                "gap threshold must be in 1..={MAX_SPAN_SECS}s, got {}s",
                self.gap_threshold_secs
            )));
        }
        if self.min_episodes == 0 {
            return Err(AnalyticsError::validation("min_episodes must be at least 1"));
        }
        Ok(())
    }
}
