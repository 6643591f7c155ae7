//! Headless map backend that records every command it receives
//!
//! [`RecordingMapApi`] renders nothing. It keeps a viewport so bounds can be
//! carried across backend swaps, and appends each call to a shared
//! [`CommandLog`], which makes it the backend of choice for the replay
//! binary and for tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use futures_util::future::LocalBoxFuture;
use serde::Serialize;
use ulog_core::prelude::*;
use ulog_core::{Bounds, Track};

use super::api::MapApi;

/// One call received by a recording backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MapCommand {
    Init {
        api: String,
    },
    Cleanup {
        api: String,
    },
    GetBounds {
        api: String,
        bounds: Bounds,
    },
    ZoomToBounds {
        api: String,
        bounds: Bounds,
    },
    ZoomToExtent {
        api: String,
    },
    DisplayTrack {
        api: String,
        track_id: i64,
        positions: usize,
        update: bool,
    },
    ClearMap {
        api: String,
    },
}

impl MapCommand {
    /// Backend the command was sent to
    pub fn api(&self) -> &str {
        match self {
            MapCommand::Init { api }
            | MapCommand::Cleanup { api }
            | MapCommand::GetBounds { api, .. }
            | MapCommand::ZoomToBounds { api, .. }
            | MapCommand::ZoomToExtent { api }
            | MapCommand::DisplayTrack { api, .. }
            | MapCommand::ClearMap { api } => api,
        }
    }

    /// Short label such as `cleanup(openlayers)`, handy in assertions
    pub fn label(&self) -> String {
        match self {
            MapCommand::Init { api } => format!("init({})", api),
            MapCommand::Cleanup { api } => format!("cleanup({})", api),
            MapCommand::GetBounds { api, .. } => format!("get_bounds({})", api),
            MapCommand::ZoomToBounds { api, bounds } => {
                format!("zoom_to_bounds({}, {:?})", api, bounds.to_array())
            }
            MapCommand::ZoomToExtent { api } => format!("zoom_to_extent({})", api),
            MapCommand::DisplayTrack { api, update, .. } => {
                format!("display_track({}, {})", api, update)
            }
            MapCommand::ClearMap { api } => format!("clear_map({})", api),
        }
    }
}

/// Command log shared between backends. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Rc<RefCell<Vec<MapCommand>>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, command: MapCommand) {
        self.commands.borrow_mut().push(command);
    }

    pub fn snapshot(&self) -> Vec<MapCommand> {
        self.commands.borrow().clone()
    }

    /// Labels of every command so far
    pub fn labels(&self) -> Vec<String> {
        self.commands.borrow().iter().map(MapCommand::label).collect()
    }

    /// Remove and return every command so far
    pub fn drain(&self) -> Vec<MapCommand> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }

    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of commands matching `predicate`
    pub fn count(&self, predicate: impl Fn(&MapCommand) -> bool) -> usize {
        self.commands.borrow().iter().filter(|c| predicate(c)).count()
    }
}

/// How the next `init()` call of a backend completes
#[derive(Debug)]
pub enum InitBehavior {
    Succeed,
    Fail(String),
    /// Completes when the sender fires; a dropped sender counts as failure
    Deferred(oneshot::Receiver<std::result::Result<(), String>>),
}

/// Queue of init behaviours consumed one per `init()` call.
///
/// Shared so a constructor closure can hand the same script to every
/// backend instance it builds. Once empty, inits succeed.
#[derive(Debug, Clone, Default)]
pub struct InitScript {
    queue: Rc<RefCell<VecDeque<InitBehavior>>>,
}

impl InitScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, behavior: InitBehavior) {
        self.queue.borrow_mut().push_back(behavior);
    }

    /// Queue a failing init
    pub fn fail_next(&self, message: impl Into<String>) {
        self.push(InitBehavior::Fail(message.into()));
    }

    /// Queue an init that completes when the returned sender is used
    pub fn defer_next(&self) -> oneshot::Sender<std::result::Result<(), String>> {
        let (tx, rx) = oneshot::channel();
        self.push(InitBehavior::Deferred(rx));
        tx
    }

    fn next(&self) -> InitBehavior {
        self.queue
            .borrow_mut()
            .pop_front()
            .unwrap_or(InitBehavior::Succeed)
    }
}

/// Viewport before anything was shown
pub const DEFAULT_VIEW: Bounds = Bounds {
    west: -180.0,
    south: -85.0,
    east: 180.0,
    north: 85.0,
};

/// A [`MapApi`] that records calls instead of rendering.
#[derive(Debug)]
pub struct RecordingMapApi {
    name: String,
    log: CommandLog,
    script: InitScript,
    view: Cell<Bounds>,
    /// Positions drawn so far
    drawn: Cell<usize>,
    track_bounds: Cell<Option<Bounds>>,
}

impl RecordingMapApi {
    pub fn new(name: impl Into<String>, log: CommandLog, script: InitScript) -> Self {
        Self {
            name: name.into(),
            log,
            script,
            view: Cell::new(DEFAULT_VIEW),
            drawn: Cell::new(0),
            track_bounds: Cell::new(None),
        }
    }

    /// Positions currently drawn
    pub fn drawn(&self) -> usize {
        self.drawn.get()
    }

    fn record(&self, command: MapCommand) {
        trace!("{}: {}", self.name, command.label());
        self.log.push(command);
    }
}

impl MapApi for RecordingMapApi {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self) -> LocalBoxFuture<'_, Result<()>> {
        self.record(MapCommand::Init {
            api: self.name.clone(),
        });
        match self.script.next() {
            InitBehavior::Succeed => Box::pin(async { Ok(()) }),
            InitBehavior::Fail(message) => {
                let err = Error::map_api_init(&self.name, message);
                Box::pin(async move { Err(err) })
            }
            InitBehavior::Deferred(rx) => Box::pin(async move {
                match rx.await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(message)) => Err(Error::map_api_init(&self.name, message)),
                    Err(_) => Err(Error::map_api_init(&self.name, "init abandoned")),
                }
            }),
        }
    }

    fn cleanup(&self) {
        self.record(MapCommand::Cleanup {
            api: self.name.clone(),
        });
        self.drawn.set(0);
        self.track_bounds.set(None);
    }

    fn get_bounds(&self) -> Bounds {
        let bounds = self.view.get();
        self.record(MapCommand::GetBounds {
            api: self.name.clone(),
            bounds,
        });
        bounds
    }

    fn zoom_to_bounds(&self, bounds: Bounds) {
        self.record(MapCommand::ZoomToBounds {
            api: self.name.clone(),
            bounds,
        });
        self.view.set(bounds);
    }

    fn zoom_to_extent(&self) {
        self.record(MapCommand::ZoomToExtent {
            api: self.name.clone(),
        });
        if let Some(bounds) = self.track_bounds.get() {
            self.view.set(bounds);
        }
    }

    fn display_track(&self, track: &Track, update: bool) {
        let positions = track.positions();
        self.record(MapCommand::DisplayTrack {
            api: self.name.clone(),
            track_id: track.id(),
            positions: if update {
                positions.len()
            } else {
                positions.len().saturating_sub(self.drawn.get())
            },
            update,
        });
        self.drawn.set(positions.len());
        let bounds = Bounds::around(positions.iter().map(|p| &**p));
        self.track_bounds.set(bounds);
        if update {
            if let Some(bounds) = bounds {
                self.view.set(bounds);
            }
        }
    }

    fn clear_map(&self) {
        self.record(MapCommand::ClearMap {
            api: self.name.clone(),
        });
        self.drawn.set(0);
        self.track_bounds.set(None);
    }
}
