//! Test fixtures for the map view-model

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ulog_core::{ManualScheduler, Notifier, Position, Scheduler, Track};

use super::{
    CommandLog, InitScript, LoadOutcome, MapApi, MapApiRegistry, MapCommand, MapViewModel,
    RecordingMapApi,
};
use crate::config::Config;
use crate::lang::Lang;
use crate::state::AppState;

/// Backends every harness registry knows about
pub const BACKENDS: &[&str] = &["openlayers", "gmaps", "mock"];

/// A wired-up view-model over recording backends
pub struct Harness {
    pub scheduler: Rc<ManualScheduler>,
    pub notifier: Notifier,
    pub state: AppState,
    pub config: Config,
    pub log: CommandLog,
    pub vm: Rc<MapViewModel>,
    scripts: HashMap<&'static str, InitScript>,
}

impl Harness {
    pub fn new() -> Self {
        let scheduler = Rc::new(ManualScheduler::new());
        let notifier = Notifier::new(scheduler.clone());
        let state = AppState::new(&notifier);
        let config = Config::new(&notifier);
        let lang = Rc::new(Lang::english(config.clone()).unwrap());
        let log = CommandLog::new();

        let mut registry = MapApiRegistry::new();
        let mut scripts = HashMap::new();
        for &name in BACKENDS {
            let script = InitScript::new();
            scripts.insert(name, script.clone());
            let log = log.clone();
            registry.register(name, move || -> Rc<dyn MapApi> {
                Rc::new(RecordingMapApi::new(name, log.clone(), script.clone()))
            });
        }

        let vm = MapViewModel::new(state.clone(), config.clone(), lang, Rc::new(registry));
        Self {
            scheduler,
            notifier,
            state,
            config,
            log,
            vm,
            scripts,
        }
    }

    /// Init script of backend `name`
    pub fn script(&self, name: &str) -> &InitScript {
        &self.scripts[name]
    }

    /// A recording backend sharing the harness log, for `set_api`
    pub fn backend(&self, name: &str) -> Rc<dyn MapApi> {
        Rc::new(RecordingMapApi::new(
            name,
            self.log.clone(),
            InitScript::new(),
        ))
    }

    /// Run everything queued, including notification delivery
    pub fn run(&self) {
        self.scheduler.run_until_stalled();
    }

    /// Load a backend to completion and deliver what it triggered
    pub fn load(&self, name: &str) -> LoadOutcome {
        let outcome = self.scheduler.run_until(self.vm.load_map_api(name));
        self.run();
        outcome
    }

    /// Start a load in the background; the slot fills in when it finishes.
    pub fn spawn_load(&self, name: &str) -> Rc<RefCell<Option<LoadOutcome>>> {
        let slot = Rc::new(RefCell::new(None));
        let sink = slot.clone();
        let load = self.vm.load_map_api(name);
        self.scheduler.spawn(Box::pin(async move {
            *sink.borrow_mut() = Some(load.await);
        }));
        slot
    }

    pub fn labels(&self) -> Vec<String> {
        self.log.labels()
    }

    pub fn count(&self, predicate: impl Fn(&MapCommand) -> bool) -> usize {
        self.log.count(predicate)
    }

    /// Track with `len` positions one minute apart
    pub fn track(&self, id: i64, len: usize) -> Track {
        let track = Track::new(&self.notifier, id, format!("track {}", id), 1);
        for i in 0..len {
            track.push(position(i as i64 + 1));
        }
        track
    }
}

/// Position `n` of a northbound walk
pub fn position(n: i64) -> Position {
    let mut p = Position::new(
        n,
        1_564_250_000 + n * 60,
        52.0 + n as f64 * 0.001,
        21.0,
    );
    p.username = "alice".to_string();
    p.trackname = "morning".to_string();
    p.speed = Some(1.5);
    p.altitude = Some(100.0 + n as f64);
    p.accuracy = Some(5.0);
    p.provider = Some("gps".to_string());
    p
}

pub fn is_display(update: bool) -> impl Fn(&MapCommand) -> bool {
    move |c| matches!(c, MapCommand::DisplayTrack { update: u, .. } if *u == update)
}

pub fn is_zoom_to_bounds(c: &MapCommand) -> bool {
    matches!(c, MapCommand::ZoomToBounds { .. })
}

pub fn is_cleanup(c: &MapCommand) -> bool {
    matches!(c, MapCommand::Cleanup { .. })
}
