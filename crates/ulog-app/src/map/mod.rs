//! Map view-model
//!
//! [`MapViewModel`] keeps exactly one active [`MapApi`] backend in sync with
//! the application state:
//!
//! - the displayed track follows `currentTrack` (full redraw on replacement,
//!   incremental redraw on live appends)
//! - the backend follows the configured `mapApi`, swapped without a blank map:
//!   the old backend is cleaned up only after the new one initialized
//! - a backend that fails to load is abandoned and the configuration falls
//!   back to the last backend that worked
//!
//! ## Backend loading
//!
//! Each call to [`MapViewModel::load_map_api`] takes a new generation number.
//! When `init()` completes, the result is applied only if no newer request
//! was made in the meantime; otherwise it is discarded (and a stale backend
//! that did initialize is cleaned up). The last request always wins.

pub mod api;
pub mod markers;
pub mod popup;
pub mod recording;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures_util::future::LocalBoxFuture;
use ulog_core::prelude::*;
use ulog_core::{Change, ChangeKind, ObserverId, Track};

use crate::config::{Config, DEFAULT_MAP_API, PROP_MAP_API};
use crate::lang::Lang;
use crate::state::{AppState, PROP_CURRENT_TRACK};
use crate::view_model::{ViewModel, ViewModelBase};

pub use api::{LoadOutcome, MapApi, MapApiFactory, MapApiRegistry};
pub use markers::{get_svg_src, marker_extra, marker_path, MarkerKind, MarkerStyle};
pub use recording::{CommandLog, InitBehavior, InitScript, MapCommand, RecordingMapApi};

/// View-model driving the map backend.
///
/// `config` must be created from the same notifier as `state`.
pub struct MapViewModel {
    base: ViewModelBase,
    config: Config,
    lang: Rc<Lang>,
    factory: Rc<dyn MapApiFactory>,
    /// Active backend
    api: RefCell<Option<Rc<dyn MapApi>>>,
    /// Generation of the most recent load request
    generation: Cell<u64>,
    /// Loads whose future has not finished or been dropped
    in_flight: Rc<Cell<usize>>,
    weak_self: Weak<MapViewModel>,
}

impl MapViewModel {
    pub fn new(
        state: AppState,
        config: Config,
        lang: Rc<Lang>,
        factory: Rc<dyn MapApiFactory>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            base: ViewModelBase::new(state),
            config,
            lang,
            factory,
            api: RefCell::new(None),
            generation: Cell::new(0),
            in_flight: Rc::new(Cell::new(0)),
            weak_self: weak_self.clone(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lang(&self) -> &Lang {
        &self.lang
    }

    /// The active backend, if one finished loading
    pub fn api(&self) -> Option<Rc<dyn MapApi>> {
        self.api.borrow().clone()
    }

    /// Name of the active backend
    pub fn api_name(&self) -> Option<String> {
        self.api.borrow().as_ref().map(|api| api.name().to_string())
    }

    /// Whether a backend load is still in progress
    pub fn is_loading(&self) -> bool {
        self.in_flight.get() > 0
    }

    /// Install `api` as the active backend without loading it.
    ///
    /// Used by integrations that initialize a backend themselves; the
    /// previous backend, if any, is dropped without cleanup.
    pub fn set_api(&self, api: Option<Rc<dyn MapApi>>) {
        *self.api.borrow_mut() = api;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Backend loading
    // ─────────────────────────────────────────────────────────────────────

    /// Load backend `name` and make it active once initialized.
    ///
    /// Any load still in flight is superseded. Requesting the backend that is
    /// already active completes immediately with [`LoadOutcome::Unchanged`].
    pub fn load_map_api(&self, name: &str) -> LocalBoxFuture<'static, LoadOutcome> {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        if self.api_name().as_deref() == Some(name) {
            debug!("Map API {} already active", name);
            return Box::pin(async { LoadOutcome::Unchanged });
        }

        info!("Loading map API {} (generation {})", name, generation);
        let adapter = match self.factory.create(name) {
            Ok(adapter) => adapter,
            Err(e) => {
                let outcome = self.load_failed(name, e);
                return Box::pin(async move { outcome });
            }
        };
        let Some(vm) = self.weak_self.upgrade() else {
            return Box::pin(async { LoadOutcome::Superseded });
        };
        let name = name.to_string();
        let guard = InFlight::new(&self.in_flight);

        Box::pin(async move {
            let _guard = guard;
            let result = adapter.init().await;

            if vm.generation.get() != generation {
                debug!(
                    "Discarding map API {} load (generation {} superseded by {})",
                    name,
                    generation,
                    vm.generation.get()
                );
                if result.is_ok() {
                    adapter.cleanup();
                }
                return LoadOutcome::Superseded;
            }

            match result {
                Ok(()) => {
                    vm.activate(adapter);
                    vm.on_ready();
                    LoadOutcome::Ready
                }
                Err(e) => vm.load_failed(&name, e),
            }
        })
    }

    /// Start [`load_map_api`](Self::load_map_api) on the state's scheduler.
    pub fn request_map_api(&self, name: &str) {
        let load = self.load_map_api(name);
        let name = name.to_string();
        self.state()
            .notifier()
            .scheduler()
            .spawn(Box::pin(async move {
                let outcome = load.await;
                trace!("Map API {} request finished: {:?}", name, outcome);
            }));
    }

    /// Swap in a freshly initialized backend, retiring the previous one.
    fn activate(&self, adapter: Rc<dyn MapApi>) {
        let previous = self.api.borrow_mut().take();
        if let Some(previous) = previous {
            let bounds = previous.get_bounds();
            debug!(
                "Replacing map API {} with {}, keeping view {:?}",
                previous.name(),
                adapter.name(),
                bounds.to_array()
            );
            self.state().set_saved_bounds(Some(bounds));
            previous.cleanup();
        }
        info!("Map API {} ready", adapter.name());
        *self.api.borrow_mut() = Some(adapter);
    }

    /// Report a failed load and fall back to the last backend that worked.
    fn load_failed(&self, name: &str, err: Error) -> LoadOutcome {
        let fallback = self
            .api_name()
            .unwrap_or_else(|| DEFAULT_MAP_API.to_string());
        error!(
            "Failed to load map API {}: {}; falling back to {}",
            name, err, fallback
        );
        self.config.set_map_api(&fallback);
        LoadOutcome::Failed(err)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Redraw policy
    // ─────────────────────────────────────────────────────────────────────

    /// Bring a freshly activated backend up to date.
    ///
    /// Restores the saved viewport if there is one; otherwise draws the
    /// current track in full.
    pub fn on_ready(&self) {
        let Some(api) = self.api() else {
            return;
        };
        if let Some(bounds) = self.state().saved_bounds() {
            api.zoom_to_bounds(bounds);
        } else if let Some(track) = self.state().current_track() {
            api.display_track(&track, true);
        }
    }

    fn on_current_track_changed(&self, change: &Change) {
        let Some(api) = self.api() else {
            trace!("No map API yet, ignoring {:?} of currentTrack", change.kind);
            return;
        };
        match change.kind {
            ChangeKind::Replaced => {
                api.clear_map();
                if let Some(track) = Track::from_value(&change.value) {
                    api.display_track(&track, true);
                }
            }
            ChangeKind::Appended(count) => {
                let Some(track) = Track::from_value(&change.value) else {
                    return;
                };
                trace!("{} new position(s) on track {}", count, track.id());
                api.zoom_to_extent();
                api.display_track(&track, false);
            }
            ChangeKind::Updated => {}
        }
    }

    fn on_map_api_changed(&self, change: &Change) {
        match change.value.as_text() {
            Some(name) => self.request_map_api(name),
            None => warn!("Ignoring non-text mapApi value {:?}", change.value),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Presentation
    // ─────────────────────────────────────────────────────────────────────

    /// Popup fragment for position `index` of the current track.
    pub fn get_popup_html(&self, index: usize) -> Result<String> {
        let track = self.state().current_track().ok_or(Error::NoCurrentTrack)?;
        popup::popup_html(
            &self.lang,
            &track,
            index,
            self.state().show_latest(),
            &chrono::Local,
        )
    }

    /// Marker image, see [`markers::get_svg_src`]
    pub fn get_svg_src(fill: &str, is_large: bool, is_extra: bool) -> String {
        markers::get_svg_src(fill, is_large, is_extra)
    }

    /// Marker style of position `index` of the current track
    pub fn marker_style(&self, index: usize) -> Option<MarkerStyle> {
        let track = self.state().current_track()?;
        MarkerStyle::for_position(&track, index, &self.config.colors())
    }
}

/// Counts a load as in flight until its future completes or is dropped
struct InFlight(Rc<Cell<usize>>);

impl InFlight {
    fn new(counter: &Rc<Cell<usize>>) -> Self {
        counter.set(counter.get() + 1);
        Self(Rc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl ViewModel for MapViewModel {
    fn base(&self) -> &ViewModelBase {
        &self.base
    }

    fn register_observers(self: &Rc<Self>) -> Vec<ObserverId> {
        let notifier = self.state().notifier().clone();

        let weak = Rc::downgrade(self);
        let track_id =
            notifier.observe_nested(self.state().target(), PROP_CURRENT_TRACK, move |change| {
                if let Some(vm) = weak.upgrade() {
                    vm.on_current_track_changed(change);
                }
            });

        let weak = Rc::downgrade(self);
        let api_id = notifier.observe(self.config.target(), PROP_MAP_API, move |change| {
            if let Some(vm) = weak.upgrade() {
                vm.on_map_api_changed(change);
            }
        });

        vec![track_id, api_id]
    }
}

impl std::fmt::Debug for MapViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapViewModel")
            .field("api", &self.api_name())
            .field("generation", &self.generation.get())
            .field("in_flight", &self.in_flight.get())
            .field("observing", &self.base.is_observing())
            .finish()
    }
}
