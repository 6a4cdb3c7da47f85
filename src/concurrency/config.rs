use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::timebucket::MAX_SPAN_SECS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Width of each sampling bucket, aligned to the Unix epoch.
    pub bucket_size_secs: i64,

    /// Emit buckets with zero active streams in the series.
    /// They never count towards the average either way.
    pub include_idle_buckets: bool,

    /// Upper bound on the number of buckets a single estimate may span.
    pub max_buckets: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            bucket_size_secs: 60 * 60,
            include_idle_buckets: false,
            max_buckets: 100_000,
        }
    }
}

impl ConcurrencyConfig {
    pub fn bucket_size(&self) -> Duration {
        Duration::seconds(self.bucket_size_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_size_secs <= 0 || self.bucket_size_secs > MAX_SPAN_SECS {
            return Err(AnalyticsError::validation(format!(
                "bucket size must be in 1..={MAX_SPAN_SECS}s, got {}s",
                self.bucket_size_secs
            )));
        }
        if self.max_buckets == 0 {
            return Err(AnalyticsError::validation("max_buckets must be at least 1"));
        }
        Ok(())
    }
}
