//! Derived analytics models.
//!
//! Everything here is recomputed per request from an event snapshot and
//! carries no identity across requests.

pub mod binge;
pub mod concurrency;
pub mod duration;
pub mod watch_party;

pub use binge::{BingeAnalytics, BingeShowStats, BingeUserStats, BingesByDay, SessionCluster};
pub use concurrency::{
    CategoryConcurrency, ConcurrencyBucket, ConcurrencyByDay, ConcurrencyByHour,
    ConcurrencyEstimate, ConcurrentStreamsAnalytics, StreamInterval,
};
pub use duration::{DurationByMediaType, DurationStats};
pub use watch_party::{
    Participant, WatchParty, WatchPartiesByDay, WatchPartyAnalytics, WatchPartyContentStats,
    WatchPartyUserStats,
};
