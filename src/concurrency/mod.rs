pub mod config;
pub mod estimator;
pub mod patterns;
pub mod sweep;

#[cfg(test)]
mod tests;

pub use config::ConcurrencyConfig;
pub use estimator::{category_shares, estimate_concurrency, UNKNOWN_CATEGORY};
pub use patterns::{by_day_of_week, by_hour_of_day, capacity_recommendation};
