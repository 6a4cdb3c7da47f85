pub mod config;
pub mod detector;
pub mod union_find;

#[cfg(test)]
mod tests;

pub use config::{CoWatchConfig, GroupingStrategy};
pub use detector::detect_watch_parties;
pub use union_find::UnionFind;
