pub mod filter;
pub mod playback_event;

pub use filter::EventFilter;
pub use playback_event::{ContentKey, PlaybackEvent};
