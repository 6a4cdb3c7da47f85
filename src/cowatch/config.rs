use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::timebucket::MAX_SPAN_SECS;

/// How co-watching events are grouped into parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// One candidate party per event, centred on its start time.
    /// Neighbouring anchors usually report the same gathering more than once.
    #[default]
    Anchor,
    /// Transitively linked events form one party; parties never overlap.
    ConnectedComponents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoWatchConfig {
    /// Maximum start-time distance for two events to count as watched together.
    pub proximity_window_secs: i64,

    /// Minimum distinct users for a group to count as a party.
    pub min_participants: usize,

    pub strategy: GroupingStrategy,
}

impl Default for CoWatchConfig {
    fn default() -> Self {
        Self {
            proximity_window_secs: 15 * 60,
            min_participants: 2,
            strategy: GroupingStrategy::default(),
        }
    }
}

impl CoWatchConfig {
    pub fn proximity_window(&self) -> Duration {
        Duration::seconds(self.proximity_window_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_SPAN_SECS).contains(&self.proximity_window_secs) {
            return Err(AnalyticsError::validation(format!(
                "proximity window must be in 0..={MAX_SPAN_SECS}s, got {}s",
                self.proximity_window_secs
            )));
        }
        if self.min_participants < 2 {
            return Err(AnalyticsError::validation(format!(
                "a watch party needs at least 2 participants, got {}",
                self.min_participants
            )));
        }
        Ok(())
    }
}
