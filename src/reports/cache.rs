use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::db::models::EventFilter;

use super::service::ReportKind;

type CacheKey = (ReportKind, EventFilter);

struct Entries {
    data_version: u64,
    reports: HashMap<CacheKey, Arc<dyn Any + Send + Sync>>,
}

/// Memoized reports, valid for a single source data version.
pub(crate) struct ReportCache {
    entries: Mutex<Entries>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                data_version: 0,
                reports: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Cached report for `key` if it was computed at `data_version`.
    pub fn get<T>(&self, kind: ReportKind, filter: &EventFilter, data_version: u64) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut entries = self.lock();
        if data_version > entries.data_version {
            entries.reports.clear();
            entries.data_version = data_version;
        }
        if data_version != entries.data_version {
            return None;
        }
        entries
            .reports
            .get(&(kind, filter.clone()))
            .and_then(|report| report.downcast_ref::<T>())
            .cloned()
    }

    /// Store a report computed at `data_version`; stale versions are discarded.
    pub fn insert<T>(&self, kind: ReportKind, filter: &EventFilter, data_version: u64, report: T)
    where
        T: Send + Sync + 'static,
    {
        let mut entries = self.lock();
        if data_version < entries.data_version {
            return;
        }
        if data_version > entries.data_version {
            entries.reports.clear();
            entries.data_version = data_version;
        }
        entries
            .reports
            .insert((kind, filter.clone()), Arc::new(report));
    }

    pub fn clear(&self) {
        self.lock().reports.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().reports.len()
    }
}
