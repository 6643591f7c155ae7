//! # ulog-core - Core Domain Types
//!
//! Foundation crate for the μlogger map viewer. Provides error handling,
//! logging setup, the change observation layer and the GPS domain types.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing, futures, tokio).
//!
//! ## Public API
//!
//! ### Observation (`observe`)
//! - [`Notifier`] - Observer registry with coalesced next-turn delivery
//! - [`Target`], [`List`] - Observed records and lists
//! - [`Value`] - Dynamically typed property value
//! - [`Change`], [`ChangeKind`] - Delivered notification and its weight
//! - [`Scheduler`], [`LocalScheduler`], [`ManualScheduler`] - Turn scheduling
//!
//! ### Domain Types (`types`, `track`)
//! - [`Position`] - A recorded GPS fix with derived statistics
//! - [`Track`] - Observed track with an append-only positions list
//! - [`Bounds`] - Map viewport `[west, south, east, north]`
//! - [`User`], [`ListItem`] - Users and selection list entries
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use ulog_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod observe;
pub mod prelude;
pub mod track;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use observe::{
    Change, ChangeKind, List, LocalScheduler, ManualScheduler, Notifier, ObserverId, Scheduler,
    Target, Value, WILDCARD,
};
pub use track::{Track, TrackFile};
pub use types::{Bounds, ListItem, Position, User};
