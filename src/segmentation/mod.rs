pub mod algorithm;
pub mod config;


pub use algorithm::{group_events, segment_binges, segment_sorted_run, ViewingGroup};
pub use config::SegmentationConfig;
