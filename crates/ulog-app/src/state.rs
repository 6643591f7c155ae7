//! Application state shared by every view-model
//!
//! One [`AppState`] is created at startup and handed to view-models by
//! reference. It is a typed façade over a single observed record; consumers
//! subscribe to its properties through the [`Notifier`] and re-read values
//! instead of caching them.

use ulog_core::prelude::*;
use ulog_core::{Bounds, Notifier, Target, Track, User, Value};

pub const PROP_CURRENT_TRACK: &str = "currentTrack";
pub const PROP_CURRENT_USER: &str = "currentUser";
pub const PROP_SAVED_BOUNDS: &str = "savedBounds";
pub const PROP_SHOW_LATEST: &str = "showLatest";
pub const PROP_SHOW_ALL_USERS: &str = "showAllUsers";
pub const PROP_ACTIVE_JOBS: &str = "activeJobs";

/// Observed application state. Clones share the same record.
#[derive(Clone)]
pub struct AppState {
    notifier: Notifier,
    target: Target,
}

impl AppState {
    pub fn new(notifier: &Notifier) -> Self {
        let target = notifier.record();
        notifier.set_silently(&target, PROP_CURRENT_TRACK, Value::Null);
        notifier.set_silently(&target, PROP_CURRENT_USER, Value::Null);
        notifier.set_silently(&target, PROP_SAVED_BOUNDS, Value::Null);
        notifier.set_silently(&target, PROP_SHOW_LATEST, false);
        notifier.set_silently(&target, PROP_SHOW_ALL_USERS, false);
        notifier.set_silently(&target, PROP_ACTIVE_JOBS, 0.0);
        Self {
            notifier: notifier.clone(),
            target,
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    // ─────────────────────────────────────────────────────────────────────
    // Track and user selection
    // ─────────────────────────────────────────────────────────────────────

    pub fn current_track(&self) -> Option<Track> {
        Track::from_value(&self.target.get(PROP_CURRENT_TRACK))
    }

    /// Replace the displayed track (`None` clears it).
    pub fn set_current_track(&self, track: Option<Track>) {
        debug!("currentTrack <- {:?}", track);
        self.target.set(PROP_CURRENT_TRACK, track);
    }

    pub fn current_user(&self) -> Option<User> {
        self.target
            .get(PROP_CURRENT_USER)
            .downcast::<User>()
            .map(|user| (*user).clone())
    }

    pub fn set_current_user(&self, user: Option<User>) {
        debug!("currentUser <- {:?}", user);
        self.target
            .set(PROP_CURRENT_USER, user.map_or(Value::Null, Value::data));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Viewport
    // ─────────────────────────────────────────────────────────────────────

    /// Viewport remembered across a backend swap
    pub fn saved_bounds(&self) -> Option<Bounds> {
        self.target
            .get(PROP_SAVED_BOUNDS)
            .downcast::<Bounds>()
            .map(|bounds| *bounds)
    }

    pub fn set_saved_bounds(&self, bounds: Option<Bounds>) {
        self.target
            .set(PROP_SAVED_BOUNDS, bounds.map_or(Value::Null, Value::data));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Display flags
    // ─────────────────────────────────────────────────────────────────────

    /// Only the most recent position of each track is shown
    pub fn show_latest(&self) -> bool {
        self.target
            .get(PROP_SHOW_LATEST)
            .as_bool()
            .unwrap_or(false)
    }

    pub fn set_show_latest(&self, value: bool) {
        self.target.set(PROP_SHOW_LATEST, value);
    }

    pub fn show_all_users(&self) -> bool {
        self.target
            .get(PROP_SHOW_ALL_USERS)
            .as_bool()
            .unwrap_or(false)
    }

    pub fn set_show_all_users(&self, value: bool) {
        self.target.set(PROP_SHOW_ALL_USERS, value);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Busy indicator
    // ─────────────────────────────────────────────────────────────────────

    /// Number of background jobs in progress
    pub fn active_jobs(&self) -> u32 {
        self.target
            .get(PROP_ACTIVE_JOBS)
            .as_number()
            .unwrap_or(0.0) as u32
    }

    pub fn is_busy(&self) -> bool {
        self.active_jobs() > 0
    }

    pub fn job_start(&self) {
        self.target
            .set(PROP_ACTIVE_JOBS, f64::from(self.active_jobs() + 1));
    }

    /// Mark a job finished. Extra calls never drive the counter below zero.
    pub fn job_stop(&self) {
        let jobs = self.active_jobs();
        if jobs == 0 {
            warn!("job_stop() without a matching job_start()");
            return;
        }
        self.target.set(PROP_ACTIVE_JOBS, f64::from(jobs - 1));
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("current_track", &self.current_track())
            .field("saved_bounds", &self.saved_bounds())
            .field("show_latest", &self.show_latest())
            .field("active_jobs", &self.active_jobs())
            .finish()
    }
}
