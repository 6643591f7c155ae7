//! Observed GPS tracks
//!
//! A [`Track`] is a typed view over an observed record with the properties
//! `id`, `name`, `userId` and `positions`. Positions live in an observed
//! [`List`] so live tracking can append to it and observers of whatever
//! property holds the track see an append rather than a replacement.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::observe::{List, Notifier, Target, Value};
use crate::prelude::*;
use crate::types::{ListItem, Position};

pub const PROP_ID: &str = "id";
pub const PROP_NAME: &str = "name";
pub const PROP_USER_ID: &str = "userId";
pub const PROP_POSITIONS: &str = "positions";

/// On-disk / wire representation of a track
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub positions: Vec<Position>,
}

impl TrackFile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Handle to an observed track. Clones share the same record.
#[derive(Clone)]
pub struct Track {
    target: Target,
}

impl Track {
    /// Create an empty track bound to `notifier`.
    pub fn new(notifier: &Notifier, id: i64, name: impl Into<String>, user_id: i64) -> Self {
        let target = notifier.record();
        notifier.set_silently(&target, PROP_ID, id);
        notifier.set_silently(&target, PROP_NAME, name.into());
        notifier.set_silently(&target, PROP_USER_ID, user_id);
        notifier.set_silently(&target, PROP_POSITIONS, notifier.list());
        Self { target }
    }

    /// Build a track from its file form, computing position statistics.
    pub fn from_file(notifier: &Notifier, file: TrackFile) -> Self {
        let track = Self::new(notifier, file.id, file.name, file.user_id);
        let mut previous: Option<Position> = None;
        let positions = track.positions_list();
        let values = file.positions.into_iter().map(|mut position| {
            position.update_stats(previous.as_ref());
            previous = Some(position.clone());
            Value::data(position)
        });
        // Nothing observes a fresh track yet, so this never notifies
        if let Some(list) = positions {
            list.extend(values.collect::<Vec<_>>());
        }
        track
    }

    /// View an observed record as a track, if it looks like one.
    pub fn from_target(target: &Target) -> Option<Self> {
        target
            .get(PROP_POSITIONS)
            .as_list()
            .map(|_| Self {
                target: target.clone(),
            })
    }

    /// View a property value as a track; `None` for null or non-tracks.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_record().and_then(Self::from_target)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn id(&self) -> i64 {
        self.target.get(PROP_ID).as_number().unwrap_or_default() as i64
    }

    pub fn name(&self) -> String {
        self.target
            .get(PROP_NAME)
            .as_text()
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn user_id(&self) -> i64 {
        self.target.get(PROP_USER_ID).as_number().unwrap_or_default() as i64
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.target.set(PROP_NAME, name.into());
    }

    fn positions_list(&self) -> Option<List> {
        self.target.get(PROP_POSITIONS).as_list().cloned()
    }

    pub fn len(&self) -> usize {
        self.positions_list().map_or(0, |list| list.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_positions(&self) -> bool {
        !self.is_empty()
    }

    /// Position at `index`
    pub fn get(&self, index: usize) -> Option<Rc<Position>> {
        self.positions_list()
            .and_then(|list| list.get(index))
            .and_then(|value| value.downcast::<Position>())
    }

    pub fn last(&self) -> Option<Rc<Position>> {
        self.positions_list()
            .and_then(|list| list.last())
            .and_then(|value| value.downcast::<Position>())
    }

    /// Snapshot of every position in order
    pub fn positions(&self) -> Vec<Rc<Position>> {
        self.positions_list()
            .map(|list| {
                list.to_vec()
                    .iter()
                    .filter_map(|value| value.downcast::<Position>())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append a live position, filling in its statistics.
    ///
    /// Observers of the property holding this track are notified with an
    /// append, not a replacement.
    pub fn push(&self, mut position: Position) {
        let Some(list) = self.positions_list() else {
            warn!("Track {} has no positions list, dropping position", self.id());
            return;
        };
        let previous = self.last();
        position.update_stats(previous.as_deref());
        trace!(
            "Track {}: appending position {} (+{:.1} m)",
            self.id(),
            position.id,
            position.meters
        );
        list.push(Value::data(position));
    }

    /// Append several positions as one change.
    pub fn extend(&self, positions: impl IntoIterator<Item = Position>) {
        let Some(list) = self.positions_list() else {
            return;
        };
        let mut previous = self.last().map(|p| (*p).clone());
        let values: Vec<Value> = positions
            .into_iter()
            .map(|mut position| {
                position.update_stats(previous.as_ref());
                previous = Some(position.clone());
                Value::data(position)
            })
            .collect();
        list.extend(values);
    }

    /// True if both handles refer to the same observed track.
    pub fn ptr_eq(&self, other: &Track) -> bool {
        self.target.ptr_eq(&other.target)
    }
}

impl From<Track> for Value {
    fn from(track: Track) -> Self {
        Value::Record(track.target)
    }
}

impl ListItem for Track {
    fn list_value(&self) -> String {
        self.id().to_string()
    }

    fn list_text(&self) -> String {
        self.name()
    }
}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("positions", &self.len())
            .finish()
    }
}
