use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::concurrency::ConcurrencyConfig;
use crate::cowatch::CoWatchConfig;
use crate::segmentation::SegmentationConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    pub segmentation: SegmentationConfig,
    pub concurrency: ConcurrencyConfig,
    pub cowatch: CoWatchConfig,
    /// Length of the "recent" lists in reports.
    pub recent_limit: usize,
    /// Length of the "top" lists in reports.
    pub top_limit: usize,
    /// Upper bound on the upfront event fetch; `None` waits indefinitely.
    pub fetch_timeout_secs: Option<u64>,
    pub cache_enabled: bool,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            segmentation: SegmentationConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            cowatch: CoWatchConfig::default(),
            recent_limit: 10,
            top_limit: 10,
            fetch_timeout_secs: Some(30),
            cache_enabled: true,
        }
    }
}

impl AnalyticsSettings {
    /// Read settings from a JSON file; a missing file yields defaults.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings JSON in {}", path.display()))
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AnalyticsSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = AnalyticsSettings::load(&path)?;
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn analytics(&self) -> Result<AnalyticsSettings> {
        self.data
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    pub fn update_analytics(&self, settings: AnalyticsSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &AnalyticsSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
