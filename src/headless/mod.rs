//! Headless mode - NDJSON event output for track replays
//!
//! The replay drives the map view-model against recording backends and
//! reports what the backends were asked to do as structured JSON events on
//! stdout, one event per line.
//!
//! # Event Format
//!
//! Each event has an "event" field indicating its type, along with
//! event-specific data. Backend calls are nested under "call".
//!
//! # Example Output
//!
//! ```json
//! {"event":"replay_started","track_id":7,"track_name":"morning","positions":3,"live":1,"api":"openlayers","timestamp":1704700001000}
//! {"event":"map","call":{"command":"init","api":"openlayers"},"timestamp":1704700001001}
//! {"event":"backend_ready","api":"openlayers","timestamp":1704700001002}
//! ```

pub mod runner;

use std::io::{self, Write};

use chrono::Utc;
use serde::Serialize;
use ulog_app::map::MapCommand;
use ulog_core::prelude::*;

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Track loaded, replay about to start
    ReplayStarted {
        track_id: i64,
        track_name: String,
        /// Positions shown up front
        positions: usize,
        /// Positions replayed one by one afterwards
        live: usize,
        api: String,
        timestamp: i64,
    },

    /// A call received by a map backend
    Map { call: MapCommand, timestamp: i64 },

    /// A backend became the active one
    BackendReady { api: String, timestamp: i64 },

    /// A backend could not be loaded; `active` is still in charge
    BackendFailed {
        api: String,
        error: Option<String>,
        active: Option<String>,
        timestamp: i64,
    },

    /// A live position was appended to the track
    PositionAppended {
        index: usize,
        total_meters: f64,
        total_seconds: i64,
        timestamp: i64,
    },

    /// Popup markup of a position
    Popup {
        index: usize,
        html: String,
        timestamp: i64,
    },

    /// Replay completed
    ReplayFinished {
        api: Option<String>,
        commands: usize,
        duration: String,
        distance: String,
        timestamp: i64,
    },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        // Write to stdout with newline (NDJSON format)
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Event type, as serialized in the "event" field
    pub fn kind(&self) -> &'static str {
        match self {
            HeadlessEvent::ReplayStarted { .. } => "replay_started",
            HeadlessEvent::Map { .. } => "map",
            HeadlessEvent::BackendReady { .. } => "backend_ready",
            HeadlessEvent::BackendFailed { .. } => "backend_failed",
            HeadlessEvent::PositionAppended { .. } => "position_appended",
            HeadlessEvent::Popup { .. } => "popup",
            HeadlessEvent::ReplayFinished { .. } => "replay_finished",
            HeadlessEvent::Error { .. } => "error",
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn replay_started(
        track_id: i64,
        track_name: &str,
        positions: usize,
        live: usize,
        api: &str,
    ) -> Self {
        Self::ReplayStarted {
            track_id,
            track_name: track_name.to_string(),
            positions,
            live,
            api: api.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn map(call: MapCommand) -> Self {
        Self::Map {
            call,
            timestamp: Self::now(),
        }
    }

    pub fn backend_ready(api: &str) -> Self {
        Self::BackendReady {
            api: api.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn backend_failed(api: &str, error: Option<String>, active: Option<String>) -> Self {
        Self::BackendFailed {
            api: api.to_string(),
            error,
            active,
            timestamp: Self::now(),
        }
    }

    pub fn position_appended(index: usize, total_meters: f64, total_seconds: i64) -> Self {
        Self::PositionAppended {
            index,
            total_meters,
            total_seconds,
            timestamp: Self::now(),
        }
    }

    pub fn popup(index: usize, html: String) -> Self {
        Self::Popup {
            index,
            html,
            timestamp: Self::now(),
        }
    }

    pub fn replay_finished(
        api: Option<String>,
        commands: usize,
        duration: String,
        distance: String,
    ) -> Self {
        Self::ReplayFinished {
            api,
            commands,
            duration,
            distance,
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}
