//! Map backend capability interface
//!
//! Every rendering engine is driven through [`MapApi`]. The view-model never
//! knows which engine it talks to: backends are built by name through a
//! [`MapApiFactory`], usually a [`MapApiRegistry`].

use std::collections::BTreeMap;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use ulog_core::prelude::*;
use ulog_core::{Bounds, Track};

/// A map rendering backend.
///
/// Methods take `&self`; backends keep their mutable rendering state behind
/// interior mutability since the view-model shares them via `Rc`.
pub trait MapApi {
    /// Name the backend is registered under
    fn name(&self) -> &str;

    /// Load and initialize the engine. Completes on a later turn.
    fn init(&self) -> LocalBoxFuture<'_, Result<()>>;

    /// Release the engine. Called once, after a replacement initialized.
    fn cleanup(&self);

    /// Current viewport
    fn get_bounds(&self) -> Bounds;

    fn zoom_to_bounds(&self, bounds: Bounds);

    /// Fit the viewport to the displayed track
    fn zoom_to_extent(&self);

    /// Draw `track`. With `update` the whole track is (re)drawn, otherwise
    /// only positions not drawn yet are added.
    fn display_track(&self, track: &Track, update: bool);

    fn clear_map(&self);
}

/// Builds backends by name.
pub trait MapApiFactory {
    fn create(&self, name: &str) -> Result<Rc<dyn MapApi>>;
}

type Constructor = Box<dyn Fn() -> Rc<dyn MapApi>>;

/// Closure-based [`MapApiFactory`]
#[derive(Default)]
pub struct MapApiRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl MapApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Rc<dyn MapApi> + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Builder-style [`register`](Self::register)
    pub fn with<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Rc<dyn MapApi> + 'static,
    {
        self.register(name, constructor);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }
}

impl MapApiFactory for MapApiRegistry {
    fn create(&self, name: &str) -> Result<Rc<dyn MapApi>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| Error::unknown_map_api(name))?;
        Ok(constructor())
    }
}

impl std::fmt::Debug for MapApiRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapApiRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// How a call to `load_map_api` ended
#[derive(Debug)]
pub enum LoadOutcome {
    /// The backend initialized and is now active
    Ready,
    /// The backend failed; the previous one (if any) stays active
    Failed(Error),
    /// A newer request superseded this one before it finished
    Superseded,
    /// The requested backend was already active
    Unchanged,
}

impl LoadOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadOutcome::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadOutcome::Failed(_))
    }
}
