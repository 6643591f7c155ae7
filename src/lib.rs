//! μlogger map viewer
//!
//! Headless front end of the map viewer: replays recorded tracks through the
//! map view-model and reports backend activity as NDJSON.

pub mod headless;

// Re-export main entry points
pub use headless::runner::{run_replay, Replay, ReplayOptions};
pub use headless::HeadlessEvent;
