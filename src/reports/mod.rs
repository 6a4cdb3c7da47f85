//! Report assembly: run the temporal algorithms over one event snapshot and
//! fold their output into serializable summaries.

mod binge;
mod cache;
mod concurrency;
mod duration;
pub mod service;
mod watch_party;


use std::collections::BTreeMap;

pub use binge::{binge_analytics, EPISODE_MEDIA_TYPE};
pub use concurrency::{concurrent_streams, session_intervals};
pub use duration::duration_stats;
pub use service::{AnalyticsService, ReportKind};
pub use watch_party::watch_party_analytics;

/// Lengths of the "recent" and "top" lists in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLimits {
    pub recent: usize,
    pub top: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self { recent: 10, top: 10 }
    }
}

/// Most frequent key; ties go to the alphabetically first.
fn most_frequent(counts: &BTreeMap<&str, usize>) -> String {
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(key, _)| key.to_string())
        .unwrap_or_default()
}
