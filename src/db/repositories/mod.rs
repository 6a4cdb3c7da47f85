pub mod playback_events;
