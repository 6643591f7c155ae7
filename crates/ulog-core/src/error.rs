//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    // ─────────────────────────────────────────────────────────────
    // Localization Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Unknown localized string: {key}")]
    UnknownString { key: String },

    #[error("Unknown localized unit: {name}")]
    UnknownUnit { name: String },

    // ─────────────────────────────────────────────────────────────
    // Map Backend Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Unknown map API: {name}")]
    UnknownMapApi { name: String },

    #[error("Map API '{api}' failed to initialize: {message}")]
    MapApiInit { api: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Track Errors
    // ─────────────────────────────────────────────────────────────
    #[error("No current track")]
    NoCurrentTrack,

    #[error("Position {index} not found in track of {len} positions")]
    PositionNotFound { index: usize, len: usize },

    #[error("Invalid track data: {message}")]
    InvalidTrack { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn unknown_string(key: impl Into<String>) -> Self {
        Self::UnknownString { key: key.into() }
    }

    pub fn unknown_unit(name: impl Into<String>) -> Self {
        Self::UnknownUnit { name: name.into() }
    }

    pub fn unknown_map_api(name: impl Into<String>) -> Self {
        Self::UnknownMapApi { name: name.into() }
    }

    pub fn map_api_init(api: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MapApiInit {
            api: api.into(),
            message: message.into(),
        }
    }

    pub fn invalid_track(message: impl Into<String>) -> Self {
        Self::InvalidTrack {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Map backend failures are absorbed by the map view-model, which falls
    /// back to the last backend that worked.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::MapApiInit { .. }
                | Error::UnknownMapApi { .. }
                | Error::NoCurrentTrack
                | Error::PositionNotFound { .. }
        )
    }

    /// Check if this error signals a programming defect
    ///
    /// A missing translation entry is never degraded silently: it has to
    /// reach the integrator.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::UnknownString { .. } | Error::UnknownUnit { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
