//! Where the analytics core gets its events from.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    RwLock,
};

use anyhow::{anyhow, Result};

use crate::db::{
    models::{EventFilter, PlaybackEvent},
    Database,
};

/// Filtered, read-only access to playback events.
#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    /// All events matching `filter`, in no guaranteed order.
    async fn fetch_events(&self, filter: &EventFilter) -> Result<Vec<PlaybackEvent>>;

    /// Increases whenever the underlying data changes.
    fn data_version(&self) -> u64;
}

#[async_trait::async_trait]
impl EventSource for Database {
    async fn fetch_events(&self, filter: &EventFilter) -> Result<Vec<PlaybackEvent>> {
        Database::fetch_events(self, filter).await
    }

    fn data_version(&self) -> u64 {
        self.current_version()
    }
}

/// In-memory event source for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySource {
    events: RwLock<Vec<PlaybackEvent>>,
    version: AtomicU64,
}

impl MemorySource {
    pub fn new(events: Vec<PlaybackEvent>) -> Self {
        Self {
            events: RwLock::new(events),
            version: AtomicU64::new(0),
        }
    }

    pub fn push(&self, event: PlaybackEvent) -> Result<()> {
        self.events
            .write()
            .map_err(|_| anyhow!("event list lock poisoned"))?
            .push(event);
        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl EventSource for MemorySource {
    async fn fetch_events(&self, filter: &EventFilter) -> Result<Vec<PlaybackEvent>> {
        let events = self
            .events
            .read()
            .map_err(|_| anyhow!("event list lock poisoned"))?;
        Ok(events.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    fn data_version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}
