pub mod concurrency;
pub mod cowatch;
pub mod db;
pub mod error;
pub mod models;
pub mod reports;
pub mod segmentation;
pub mod settings;
pub mod source;
pub mod synthetic;
pub mod timebucket;
mod utils;

#[cfg(test)]
mod test_support;

pub use db::{
    models::{ContentKey, EventFilter, PlaybackEvent},
    Database,
};
pub use error::{AnalyticsError, Result};
pub use reports::AnalyticsService;
pub use settings::{AnalyticsSettings, SettingsStore};
pub use source::{EventSource, MemorySource};

/// Install the global logger; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("logger already initialized");
    }
}
