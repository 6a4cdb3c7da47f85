use std::{fmt, sync::Arc, time::Duration, time::Instant};

use tokio_util::sync::CancellationToken;

use super::cache::ReportCache;
use super::{
    binge_analytics, concurrent_streams, duration_stats, watch_party_analytics, ReportLimits,
};
use crate::db::models::{EventFilter, PlaybackEvent};
use crate::error::{AnalyticsError, Result};
use crate::models::{BingeAnalytics, ConcurrentStreamsAnalytics, DurationStats, WatchPartyAnalytics};
use crate::settings::AnalyticsSettings;
use crate::source::EventSource;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Binge,
    ConcurrentStreams,
    WatchParties,
    Durations,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Binge => "binge",
            ReportKind::ConcurrentStreams => "concurrent_streams",
            ReportKind::WatchParties => "watch_parties",
            ReportKind::Durations => "durations",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point for every report.
///
/// Each call fetches one snapshot from the source, runs the computation on
/// the blocking pool and caches the result until the source's data version
/// changes.
pub struct AnalyticsService<S: EventSource> {
    source: Arc<S>,
    settings: AnalyticsSettings,
    cache: ReportCache,
}

impl<S: EventSource + 'static> AnalyticsService<S> {
    pub fn new(source: Arc<S>, settings: AnalyticsSettings) -> Self {
        Self {
            source,
            settings,
            cache: ReportCache::new(),
        }
    }

    pub fn settings(&self) -> &AnalyticsSettings {
        &self.settings
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cached_reports(&self) -> usize {
        self.cache.len()
    }

    fn limits(&self) -> ReportLimits {
        ReportLimits {
            recent: self.settings.recent_limit,
            top: self.settings.top_limit,
        }
    }

    pub async fn binge_analytics(
        &self,
        filter: &EventFilter,
        cancel: &CancellationToken,
    ) -> Result<BingeAnalytics> {
        let config = self.settings.segmentation.clone();
        let limits = self.limits();
        self.run(ReportKind::Binge, filter, cancel, move |events, cancel| {
            binge_analytics(&events, &config, limits, &cancel)
        })
        .await
    }

    pub async fn concurrent_streams(
        &self,
        filter: &EventFilter,
        cancel: &CancellationToken,
    ) -> Result<ConcurrentStreamsAnalytics> {
        let config = self.settings.concurrency.clone();
        self.run(
            ReportKind::ConcurrentStreams,
            filter,
            cancel,
            move |events, cancel| concurrent_streams(&events, &config, &cancel),
        )
        .await
    }

    pub async fn watch_parties(
        &self,
        filter: &EventFilter,
        cancel: &CancellationToken,
    ) -> Result<WatchPartyAnalytics> {
        let config = self.settings.cowatch.clone();
        let limits = self.limits();
        self.run(ReportKind::WatchParties, filter, cancel, move |events, cancel| {
            watch_party_analytics(&events, &config, limits, &cancel)
        })
        .await
    }

    pub async fn duration_stats(
        &self,
        filter: &EventFilter,
        cancel: &CancellationToken,
    ) -> Result<DurationStats> {
        self.run(ReportKind::Durations, filter, cancel, |events, _| {
            Ok(duration_stats(&events))
        })
        .await
    }

    async fn run<T, F>(
        &self,
        kind: ReportKind,
        filter: &EventFilter,
        cancel: &CancellationToken,
        compute: F,
    ) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Vec<PlaybackEvent>, CancellationToken) -> Result<T> + Send + 'static,
    {
        let data_version = self.source.data_version();
        if self.settings.cache_enabled {
            if let Some(report) = self.cache.get::<T>(kind, filter, data_version) {
                log_debug!("{kind} report served from cache (data version {data_version})");
                return Ok(report);
            }
        }

        let started = Instant::now();
        let events = match self.fetch(filter, cancel).await {
            Ok(events) => events,
            Err(err) => {
                if err.is_cancelled() {
                    log_debug!("{kind} report cancelled during fetch");
                } else {
                    log_warn!("{kind} report fetch failed: {err}");
                }
                return Err(err);
            }
        };
        let event_count = events.len();

        let worker_cancel = cancel.clone();
        let report = tokio::task::spawn_blocking(move || compute(events, worker_cancel))
            .await
            .map_err(|err| {
                log_error!("{kind} report worker failed: {err}");
                AnalyticsError::from(err)
            })??;

        log_info!(
            "{kind} report over {event_count} events computed in {:?}",
            started.elapsed()
        );

        if self.settings.cache_enabled {
            self.cache.insert(kind, filter, data_version, report.clone());
        }
        Ok(report)
    }

    /// One upfront fetch, bounded by the configured timeout and the caller's token.
    async fn fetch(
        &self,
        filter: &EventFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<PlaybackEvent>> {
        let fetch = async {
            match self.settings.fetch_timeout_secs {
                Some(secs) => match tokio::time::timeout(
                    Duration::from_secs(secs),
                    self.source.fetch_events(filter),
                )
                .await
                {
                    Ok(result) => result.map_err(AnalyticsError::Source),
                    Err(_) => Err(AnalyticsError::Timeout { secs }),
                },
                None => self
                    .source
                    .fetch_events(filter)
                    .await
                    .map_err(AnalyticsError::Source),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AnalyticsError::Cancelled),
            result = fetch => result,
        }
    }
}
