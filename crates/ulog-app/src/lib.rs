//! ulog-app - Configuration, localization and view-models for the μlogger map viewer
//!
//! This crate holds everything between the core observation machinery and a
//! rendering backend: the observable [`Config`] and its on-disk settings, the
//! [`Lang`] string table and unit formatting, the shared [`AppState`], and the
//! [`MapViewModel`] that keeps one [`map::MapApi`] backend in sync with them.

pub mod config;
pub mod lang;
pub mod map;
pub mod state;
pub mod utils;
pub mod view_model;

// Re-export primary types
pub use config::{Config, Settings, Units};
pub use lang::Lang;
pub use map::{LoadOutcome, MapApi, MapApiFactory, MapApiRegistry, MapViewModel};
pub use state::AppState;
pub use view_model::{ViewModel, ViewModelBase};
