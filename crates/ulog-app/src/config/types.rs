//! Configuration types for the map viewer
//!
//! Defines:
//! - `Settings` - Settings read from `ulogger.toml`
//! - `Units` - Unit system presets and their conversion factors
//! - Related sub-types

use serde::{Deserialize, Serialize};

/// Map backend used when nothing else is configured or loading failed
pub const DEFAULT_MAP_API: &str = "openlayers";

/// Global application settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub units: Units,

    #[serde(default)]
    pub map: MapSettings,

    #[serde(default)]
    pub colors: ColorSettings,

    #[serde(default)]
    pub track: TrackSettings,
}

/// Map backend selection and initial viewport
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MapSettings {
    /// Preferred backend name, e.g. "openlayers" or "gmaps"
    #[serde(default = "default_map_api")]
    pub api: String,

    /// Map center shown before any track is loaded
    #[serde(default = "default_init_latitude")]
    pub init_latitude: f64,

    #[serde(default = "default_init_longitude")]
    pub init_longitude: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            api: default_map_api(),
            init_latitude: default_init_latitude(),
            init_longitude: default_init_longitude(),
        }
    }
}

fn default_map_api() -> String {
    DEFAULT_MAP_API.to_string()
}

fn default_init_latitude() -> f64 {
    52.23
}

fn default_init_longitude() -> f64 {
    21.01
}

/// Marker and track line colors (any CSS color)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColorSettings {
    #[serde(default = "default_color_normal")]
    pub normal: String,

    #[serde(default = "default_color_start")]
    pub start: String,

    #[serde(default = "default_color_stop")]
    pub stop: String,

    /// Fill of positions carrying a comment or image
    #[serde(default = "default_color_extra")]
    pub extra: String,

    /// Fill of the highlighted position
    #[serde(default = "default_color_hilite")]
    pub hilite: String,

    /// Track line color
    #[serde(default = "default_color_stroke")]
    pub stroke: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            normal: default_color_normal(),
            start: default_color_start(),
            stop: default_color_stop(),
            extra: default_color_extra(),
            hilite: default_color_hilite(),
            stroke: default_color_stroke(),
        }
    }
}

fn default_color_normal() -> String {
    "#ffffff".to_string()
}

fn default_color_start() -> String {
    "#55b500".to_string()
}

fn default_color_stop() -> String {
    "#ff6a00".to_string()
}

fn default_color_extra() -> String {
    "#ccccff".to_string()
}

fn default_color_hilite() -> String {
    "#feff6a".to_string()
}

fn default_color_stroke() -> String {
    "#ff0000".to_string()
}

/// Live tracking behaviour
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackSettings {
    /// Live tracking refresh interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Show only the latest position of each user
    #[serde(default)]
    pub show_latest: bool,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            show_latest: false,
        }
    }
}

fn default_interval() -> u64 {
    10
}

// ─────────────────────────────────────────────────────────────────────────────
// Units
// ─────────────────────────────────────────────────────────────────────────────

/// Unit system preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Nautical,
}

/// Conversion factors and unit string keys of a preset.
///
/// Speeds are converted from m/s through km/h (`* 3.6`) before
/// `speed` applies; major distances from m through km (`/ 1000`)
/// before `distance_major` applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitFactors {
    pub speed: f64,
    pub unit_speed: &'static str,
    pub distance: f64,
    pub unit_distance: &'static str,
    pub distance_major: f64,
    pub unit_distance_major: &'static str,
    pub unit_day: &'static str,
}

impl Units {
    pub fn factors(self) -> UnitFactors {
        match self {
            Units::Metric => UnitFactors {
                speed: 1.0,
                unit_speed: "unitkmh",
                distance: 1.0,
                unit_distance: "unitm",
                distance_major: 1.0,
                unit_distance_major: "unitkm",
                unit_day: "unitday",
            },
            Units::Imperial => UnitFactors {
                speed: 0.62137,
                unit_speed: "unitmph",
                distance: 3.28084,
                unit_distance: "unitft",
                distance_major: 0.62137,
                unit_distance_major: "unitmi",
                unit_day: "unitday",
            },
            Units::Nautical => UnitFactors {
                speed: 0.539957,
                unit_speed: "unitkt",
                distance: 1.0,
                unit_distance: "unitm",
                distance_major: 0.539957,
                unit_distance_major: "unitnm",
                unit_day: "unitday",
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Nautical => "nautical",
        }
    }

    /// Parse a preset name; unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "metric" => Some(Units::Metric),
            "imperial" => Some(Units::Imperial),
            "nautical" => Some(Units::Nautical),
            _ => None,
        }
    }
}
