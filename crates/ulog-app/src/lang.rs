//! Localized strings and unit-aware number formatting
//!
//! [`Lang`] resolves string keys against a loaded table and converts SI
//! measurements (m, m/s, s) into the unit system selected in [`Config`].
//! Unknown keys are programming errors and surface as fatal
//! [`Error::UnknownString`] / [`Error::UnknownUnit`] values.

use std::collections::HashMap;

use ulog_core::prelude::*;

use crate::config::{Config, PROP_UNIT_DAY, PROP_UNIT_DISTANCE, PROP_UNIT_DISTANCE_MAJOR, PROP_UNIT_SPEED};

/// Built-in English string table
const ENGLISH_JSON: &str = include_str!("../locale/en.json");

const SECONDS_PER_DAY: i64 = 86_400;

/// Round half up, matching how the web client rounds display values
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// String table bound to the runtime configuration
#[derive(Debug, Clone)]
pub struct Lang {
    strings: HashMap<String, String>,
    config: Config,
}

impl Lang {
    pub fn new(config: Config, strings: HashMap<String, String>) -> Self {
        Self { strings, config }
    }

    /// Load a string table from a JSON object of key/translation pairs.
    pub fn from_json(config: Config, json: &str) -> Result<Self> {
        let strings: HashMap<String, String> = serde_json::from_str(json)?;
        debug!("Loaded {} localized strings", strings.len());
        Ok(Self::new(config, strings))
    }

    /// The built-in English table.
    pub fn english(config: Config) -> Result<Self> {
        Self::from_json(config, ENGLISH_JSON)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Localized string for `key`.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.strings
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::unknown_string(key))
    }

    /// Localized name of the unit configured under `name` (e.g. `unitSpeed`).
    pub fn unit(&self, name: &str) -> Result<&str> {
        let key = self
            .config
            .text(name)
            .ok_or_else(|| Error::unknown_unit(name))?;
        self.get(&key)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Conversions
    // ─────────────────────────────────────────────────────────────────────

    /// Speed given in m/s, in configured units with two decimals
    pub fn locale_speed(&self, ms: f64) -> f64 {
        round_half_up(ms * self.config.factor_speed() * 360.0) / 100.0
    }

    pub fn format_speed(&self, ms: f64) -> Result<String> {
        Ok(format!("{} {}", self.locale_speed(ms), self.unit(PROP_UNIT_SPEED)?))
    }

    /// Long distance given in m, in configured major units (km, mi, nm)
    pub fn locale_distance_major(&self, m: f64) -> f64 {
        round_half_up(m * self.config.factor_distance_major() / 10.0) / 100.0
    }

    pub fn format_distance_major(&self, m: f64) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.locale_distance_major(m),
            self.unit(PROP_UNIT_DISTANCE_MAJOR)?
        ))
    }

    /// Short distance given in m, in configured minor units (m, ft)
    pub fn locale_distance(&self, m: f64) -> f64 {
        round_half_up(m * self.config.factor_distance() * 100.0) / 100.0
    }

    pub fn format_distance(&self, m: f64) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.locale_distance(m),
            self.unit(PROP_UNIT_DISTANCE)?
        ))
    }

    pub fn locale_altitude(&self, m: f64) -> f64 {
        self.locale_distance(m)
    }

    pub fn format_altitude(&self, m: f64) -> Result<String> {
        self.format_distance(m)
    }

    pub fn locale_accuracy(&self, m: f64) -> f64 {
        self.locale_distance(m)
    }

    pub fn format_accuracy(&self, m: f64) -> Result<String> {
        self.format_distance(m)
    }

    /// Duration as `HH:MM:SS`, prefixed with `<days> <unitDay> ` past one day.
    pub fn locale_duration(&self, seconds: i64) -> Result<String> {
        let seconds = seconds.max(0);
        let days = seconds / SECONDS_PER_DAY;
        let rest = seconds % SECONDS_PER_DAY;
        let (h, m, s) = (rest / 3600, (rest % 3600) / 60, rest % 60);

        let prefix = if days > 0 {
            format!("{} {} ", days, self.unit(PROP_UNIT_DAY)?)
        } else {
            String::new()
        };
        Ok(format!("{}{:02}:{:02}:{:02}", prefix, h, m, s))
    }
}
