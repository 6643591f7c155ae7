//! Observable runtime configuration
//!
//! [`Config`] mirrors [`Settings`] into an observed record so view-models can
//! react to changes (most importantly of the preferred map backend) through
//! the same [`Notifier`] as the application state.

use std::cell::RefCell;
use std::rc::Rc;

use ulog_core::prelude::*;
use ulog_core::{Notifier, Target, Value};

use super::types::{ColorSettings, Settings, Units, DEFAULT_MAP_API};

// ─────────────────────────────────────────────────────────────────────────────
// Property names
// ─────────────────────────────────────────────────────────────────────────────

pub const PROP_MAP_API: &str = "mapApi";
pub const PROP_UNITS: &str = "units";
pub const PROP_INTERVAL: &str = "interval";
pub const PROP_INIT_LATITUDE: &str = "initLatitude";
pub const PROP_INIT_LONGITUDE: &str = "initLongitude";

pub const PROP_FACTOR_SPEED: &str = "factorSpeed";
pub const PROP_UNIT_SPEED: &str = "unitSpeed";
pub const PROP_FACTOR_DISTANCE: &str = "factorDistance";
pub const PROP_UNIT_DISTANCE: &str = "unitDistance";
pub const PROP_FACTOR_DISTANCE_MAJOR: &str = "factorDistanceMajor";
pub const PROP_UNIT_DISTANCE_MAJOR: &str = "unitDistanceMajor";
pub const PROP_UNIT_DAY: &str = "unitDay";

pub const PROP_COLOR_NORMAL: &str = "colorNormal";
pub const PROP_COLOR_START: &str = "colorStart";
pub const PROP_COLOR_STOP: &str = "colorStop";
pub const PROP_COLOR_EXTRA: &str = "colorExtra";
pub const PROP_COLOR_HILITE: &str = "colorHilite";
pub const PROP_STROKE_COLOR: &str = "strokeColor";

/// Observed application configuration. Clones share the same record.
#[derive(Clone)]
pub struct Config {
    notifier: Notifier,
    target: Target,
    /// Settings restored by [`Config::reinitialize`]
    baseline: Rc<RefCell<Settings>>,
}

impl Config {
    /// Configuration with built-in defaults.
    pub fn new(notifier: &Notifier) -> Self {
        Self::with_settings(notifier, Settings::default())
    }

    /// Configuration initialized from loaded settings, without notifying.
    pub fn with_settings(notifier: &Notifier, settings: Settings) -> Self {
        let config = Self {
            notifier: notifier.clone(),
            target: notifier.record(),
            baseline: Rc::new(RefCell::new(settings.clone())),
        };
        config.write_all(&settings, false);
        config
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Restore every property to the loaded settings.
    ///
    /// Observers see the properties that actually change.
    pub fn reinitialize(&self) {
        let settings = self.baseline.borrow().clone();
        debug!("Reinitializing config (map api: {})", settings.map.api);
        self.write_all(&settings, true);
    }

    /// Apply new settings and make them the reinitialize baseline.
    pub fn apply(&self, settings: Settings) {
        self.write_all(&settings, true);
        *self.baseline.borrow_mut() = settings;
    }

    fn write_all(&self, settings: &Settings, notify: bool) {
        let write = |property: &str, value: Value| {
            if notify {
                self.target.set(property, value);
            } else {
                self.notifier.set_silently(&self.target, property, value);
            }
        };

        write(PROP_MAP_API, settings.map.api.clone().into());
        write(PROP_INIT_LATITUDE, settings.map.init_latitude.into());
        write(PROP_INIT_LONGITUDE, settings.map.init_longitude.into());
        write(PROP_INTERVAL, (settings.track.interval as f64).into());

        write(PROP_COLOR_NORMAL, settings.colors.normal.clone().into());
        write(PROP_COLOR_START, settings.colors.start.clone().into());
        write(PROP_COLOR_STOP, settings.colors.stop.clone().into());
        write(PROP_COLOR_EXTRA, settings.colors.extra.clone().into());
        write(PROP_COLOR_HILITE, settings.colors.hilite.clone().into());
        write(PROP_STROKE_COLOR, settings.colors.stroke.clone().into());

        let factors = settings.units.factors();
        write(PROP_UNITS, settings.units.as_str().into());
        write(PROP_FACTOR_SPEED, factors.speed.into());
        write(PROP_UNIT_SPEED, factors.unit_speed.into());
        write(PROP_FACTOR_DISTANCE, factors.distance.into());
        write(PROP_UNIT_DISTANCE, factors.unit_distance.into());
        write(PROP_FACTOR_DISTANCE_MAJOR, factors.distance_major.into());
        write(PROP_UNIT_DISTANCE_MAJOR, factors.unit_distance_major.into());
        write(PROP_UNIT_DAY, factors.unit_day.into());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    /// Raw property value
    pub fn get(&self, property: &str) -> Value {
        self.target.get(property)
    }

    /// Text property, `None` when missing or not text
    pub fn text(&self, property: &str) -> Option<String> {
        self.target.get(property).as_text().map(str::to_string)
    }

    fn number(&self, property: &str, default: f64) -> f64 {
        self.target.get(property).as_number().unwrap_or(default)
    }

    /// Preferred map backend name
    pub fn map_api(&self) -> String {
        self.text(PROP_MAP_API)
            .unwrap_or_else(|| DEFAULT_MAP_API.to_string())
    }

    pub fn set_map_api(&self, name: &str) {
        self.target.set(PROP_MAP_API, name);
    }

    pub fn units(&self) -> Units {
        self.text(PROP_UNITS)
            .and_then(|name| Units::parse(&name))
            .unwrap_or_default()
    }

    /// Switch the unit system, updating factors and unit keys together.
    pub fn set_units(&self, units: Units) {
        let factors = units.factors();
        self.target.set(PROP_UNITS, units.as_str());
        self.target.set(PROP_FACTOR_SPEED, factors.speed);
        self.target.set(PROP_UNIT_SPEED, factors.unit_speed);
        self.target.set(PROP_FACTOR_DISTANCE, factors.distance);
        self.target.set(PROP_UNIT_DISTANCE, factors.unit_distance);
        self.target.set(PROP_FACTOR_DISTANCE_MAJOR, factors.distance_major);
        self.target.set(PROP_UNIT_DISTANCE_MAJOR, factors.unit_distance_major);
        self.target.set(PROP_UNIT_DAY, factors.unit_day);
    }

    pub fn factor_speed(&self) -> f64 {
        self.number(PROP_FACTOR_SPEED, 1.0)
    }

    pub fn factor_distance(&self) -> f64 {
        self.number(PROP_FACTOR_DISTANCE, 1.0)
    }

    pub fn factor_distance_major(&self) -> f64 {
        self.number(PROP_FACTOR_DISTANCE_MAJOR, 1.0)
    }

    pub fn interval(&self) -> u64 {
        self.number(PROP_INTERVAL, 10.0) as u64
    }

    pub fn colors(&self) -> ColorSettings {
        let defaults = ColorSettings::default();
        ColorSettings {
            normal: self.text(PROP_COLOR_NORMAL).unwrap_or(defaults.normal),
            start: self.text(PROP_COLOR_START).unwrap_or(defaults.start),
            stop: self.text(PROP_COLOR_STOP).unwrap_or(defaults.stop),
            extra: self.text(PROP_COLOR_EXTRA).unwrap_or(defaults.extra),
            hilite: self.text(PROP_COLOR_HILITE).unwrap_or(defaults.hilite),
            stroke: self.text(PROP_STROKE_COLOR).unwrap_or(defaults.stroke),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("map_api", &self.map_api())
            .field("units", &self.units())
            .finish()
    }
}
