//! # Domain Types
//!
//! Plain data carried through the observed state: recorded positions,
//! viewport bounds and users. None of these are observed themselves; they
//! travel inside [`Value::Data`](crate::observe::Value::Data) payloads or as
//! fields of observed records.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for distances, in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ── ListItem ──────────────────────────────────────────────────────────────────

/// Something that can be shown as an entry of a selection list.
///
/// `list_value` is the stable key submitted on selection, `list_text` the
/// label shown to the user.
pub trait ListItem {
    fn list_value(&self) -> String;
    fn list_text(&self) -> String;
}

// ── User ──────────────────────────────────────────────────────────────────────

/// A registered user whose tracks can be displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
}

impl User {
    pub fn new(id: i64, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
        }
    }
}

impl ListItem for User {
    fn list_value(&self) -> String {
        self.id.to_string()
    }

    fn list_text(&self) -> String {
        self.login.clone()
    }
}

// ── Bounds ────────────────────────────────────────────────────────────────────

/// A map viewport as `[west, south, east, north]` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Smallest bounds containing every given position, `None` for none.
    pub fn around<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        positions.into_iter().fold(None, |acc: Option<Bounds>, p| {
            Some(match acc {
                None => Bounds::new(p.longitude, p.latitude, p.longitude, p.latitude),
                Some(b) => Bounds::new(
                    b.west.min(p.longitude),
                    b.south.min(p.latitude),
                    b.east.max(p.longitude),
                    b.north.max(p.latitude),
                ),
            })
        })
    }
}

impl From<[f64; 4]> for Bounds {
    fn from(value: [f64; 4]) -> Self {
        Bounds::new(value[0], value[1], value[2], value[3])
    }
}

impl From<Bounds> for [f64; 4] {
    fn from(value: Bounds) -> Self {
        value.to_array()
    }
}

// ── Position ──────────────────────────────────────────────────────────────────

/// A single recorded GPS fix.
///
/// The statistics fields (`meters`, `seconds`, `total_meters`,
/// `total_seconds`) are derived from the previous position of the same track
/// when the position is appended; they are never read from input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: i64,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Speed in meters per second
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub bearing: Option<f64>,
    /// Horizontal accuracy in meters
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Location provider, e.g. `gps` or `network`
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Name of an attached image
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub trackname: String,

    /// Distance from the previous position
    #[serde(skip_deserializing)]
    pub meters: f64,
    /// Time since the previous position
    #[serde(skip_deserializing)]
    pub seconds: i64,
    #[serde(skip_deserializing)]
    pub total_meters: f64,
    #[serde(skip_deserializing)]
    pub total_seconds: i64,
}

impl Position {
    /// A bare fix with no optional data
    pub fn new(id: i64, timestamp: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            timestamp,
            latitude,
            longitude,
            altitude: None,
            speed: None,
            bearing: None,
            accuracy: None,
            provider: None,
            comment: None,
            image: None,
            username: String::new(),
            trackname: String::new(),
            meters: 0.0,
            seconds: 0,
            total_meters: 0.0,
            total_seconds: 0,
        }
    }

    pub fn has_comment(&self) -> bool {
        self.comment.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.is_empty())
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_to(&self, other: &Position) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Seconds elapsed between `other` and this position
    pub fn seconds_to(&self, other: &Position) -> i64 {
        other.timestamp - self.timestamp
    }

    /// Fill the derived statistics, given the preceding position of the track.
    pub fn update_stats(&mut self, previous: Option<&Position>) {
        match previous {
            Some(prev) => {
                self.meters = prev.distance_to(self);
                self.seconds = prev.seconds_to(self);
                self.total_meters = prev.total_meters + self.meters;
                self.total_seconds = prev.total_seconds + self.seconds;
            }
            None => {
                self.meters = 0.0;
                self.seconds = 0;
                self.total_meters = 0.0;
                self.total_seconds = 0;
            }
        }
    }

    /// Average speed from the start of the track, in meters per second
    pub fn average_speed(&self) -> f64 {
        if self.total_seconds > 0 {
            self.total_meters / self.total_seconds as f64
        } else {
            0.0
        }
    }
}
