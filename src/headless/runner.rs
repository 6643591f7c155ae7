//! Headless replay runner
//!
//! Loads a track file, wires the application state, configuration and map
//! view-model to recording backends, and replays the track:
//!
//! 1. the leading positions are shown at once and the configured backend is
//!    loaded
//! 2. optionally the backend is switched through the configuration
//! 3. the trailing `live` positions are appended one at a time
//!
//! Every backend call is reported as a [`HeadlessEvent::Map`] event.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use ulog_app::config::{default_config_dir, load_settings, load_settings_file, Settings, Units};
use ulog_app::map::{CommandLog, InitScript, LoadOutcome, MapApi, MapApiRegistry, RecordingMapApi};
use ulog_app::{AppState, Config, Lang, MapViewModel, ViewModel};
use ulog_core::prelude::*;
use ulog_core::{Notifier, Scheduler, Track, TrackFile};

use super::HeadlessEvent;

/// Backends a replay can load
pub const BACKENDS: &[&str] = &["openlayers", "gmaps"];

/// Scheduler turns to wait for the view-model to go quiet
const SETTLE_ROUNDS: usize = 1000;

/// Replay parameters, usually taken from the command line
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Settings file; the platform config dir is used when absent
    pub config: Option<PathBuf>,
    /// Backend overriding the configured one
    pub api: Option<String>,
    /// Unit preset overriding the configured one
    pub units: Option<Units>,
    /// Backends whose first init fails
    pub fail: Vec<String>,
    /// Backend to switch to once the track is shown
    pub switch: Option<String>,
    /// Trailing positions appended one at a time
    pub live: usize,
    /// Pause before each live position
    pub delay: Option<Duration>,
    /// Report the popup of the latest position
    pub popup: bool,
    pub show_latest: bool,
}

impl ReplayOptions {
    /// Settings with command line overrides applied
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => load_settings_file(path)?,
            None => load_settings(&default_config_dir()),
        };
        if let Some(api) = &self.api {
            settings.map.api = api.clone();
        }
        if let Some(units) = self.units {
            settings.units = units;
        }
        Ok(settings)
    }
}

/// Replay a track file, handing every event to `emit`.
pub async fn run_replay(
    track_path: &Path,
    options: &ReplayOptions,
    scheduler: Rc<dyn Scheduler>,
    mut emit: impl FnMut(HeadlessEvent),
) -> Result<()> {
    info!("Headless replay of {}", track_path.display());

    let result = replay_file(track_path, options, scheduler, &mut emit).await;
    if let Err(e) = &result {
        error!("Replay failed: {}", e);
        emit(HeadlessEvent::error(e.to_string(), e.is_fatal()));
    }

    info!("Headless replay exiting");
    result
}

async fn replay_file(
    track_path: &Path,
    options: &ReplayOptions,
    scheduler: Rc<dyn Scheduler>,
    emit: &mut impl FnMut(HeadlessEvent),
) -> Result<()> {
    let content = std::fs::read_to_string(track_path)?;
    let file = TrackFile::from_json(&content)?;
    let settings = options.settings()?;
    info!(
        "Map API {} ({} units, {} live positions)",
        settings.map.api,
        settings.units.as_str(),
        options.live
    );
    let replay = Replay::new(scheduler, settings, &options.fail)?;

    let result = replay.run(file, options, emit).await;
    replay.shutdown();
    result
}

/// Application objects of one replay
pub struct Replay {
    notifier: Notifier,
    state: AppState,
    config: Config,
    lang: Rc<Lang>,
    log: CommandLog,
    vm: Rc<MapViewModel>,
    /// Backend last reported as ready
    reported: RefCell<Option<String>>,
    commands: Cell<usize>,
}

impl Replay {
    /// Wire everything up over recording backends.
    ///
    /// Backends named in `failing` fail their first init.
    pub fn new(scheduler: Rc<dyn Scheduler>, settings: Settings, failing: &[String]) -> Result<Self> {
        let notifier = Notifier::new(scheduler);
        let state = AppState::new(&notifier);
        let config = Config::with_settings(&notifier, settings);
        let lang = Rc::new(Lang::english(config.clone())?);
        let log = CommandLog::new();

        let mut registry = MapApiRegistry::new();
        for &name in BACKENDS {
            let script = InitScript::new();
            if failing.iter().any(|f| f == name) {
                debug!("Backend {} will fail to initialize", name);
                script.fail_next(format!("{} refused to load", name));
            }
            let log = log.clone();
            registry.register(name, move || -> Rc<dyn MapApi> {
                Rc::new(RecordingMapApi::new(name, log.clone(), script.clone()))
            });
        }
        for name in failing {
            if !BACKENDS.contains(&name.as_str()) {
                warn!("Ignoring --fail for unknown backend {}", name);
            }
        }

        let vm = MapViewModel::new(state.clone(), config.clone(), lang.clone(), Rc::new(registry));
        vm.set_observers();

        Ok(Self {
            notifier,
            state,
            config,
            lang,
            log,
            vm,
            reported: RefCell::new(None),
            commands: Cell::new(0),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn view_model(&self) -> &Rc<MapViewModel> {
        &self.vm
    }

    /// Backend calls reported so far
    pub fn commands(&self) -> usize {
        self.commands.get()
    }

    /// Yield until notifications are delivered and no backend is loading.
    pub async fn settle(&self) {
        for _ in 0..SETTLE_ROUNDS {
            if !self.notifier.has_pending() && !self.vm.is_loading() {
                return;
            }
            tokio::task::yield_now().await;
        }
        warn!(
            "View-model still busy after {} turns (loading: {})",
            SETTLE_ROUNDS,
            self.vm.is_loading()
        );
    }

    /// Run the replay of `file`.
    pub async fn run(
        &self,
        mut file: TrackFile,
        options: &ReplayOptions,
        emit: &mut impl FnMut(HeadlessEvent),
    ) -> Result<()> {
        let live_count = options.live.min(file.positions.len());
        let live = file.positions.split_off(file.positions.len() - live_count);
        let api = self.config.map_api();
        emit(HeadlessEvent::replay_started(
            file.id,
            &file.name,
            file.positions.len(),
            live.len(),
            &api,
        ));

        self.state.set_show_latest(options.show_latest);
        let track = Track::from_file(&self.notifier, file);
        self.state.set_current_track(Some(track.clone()));
        self.settle().await;

        // Initial backend
        let outcome = self.vm.load_map_api(&api).await;
        self.drain(emit);
        if let LoadOutcome::Failed(e) = outcome {
            emit(HeadlessEvent::backend_failed(
                &api,
                Some(e.to_string()),
                self.vm.api_name(),
            ));
        }
        self.settle().await;
        self.drain(emit);
        self.report_backend(emit);

        if let Some(target) = &options.switch {
            info!("Switching map API to {}", target);
            self.config.set_map_api(target);
            self.settle().await;
            self.drain(emit);
            if self.vm.api_name().as_deref() != Some(target.as_str()) {
                emit(HeadlessEvent::backend_failed(target, None, self.vm.api_name()));
            }
            self.report_backend(emit);
        }

        for position in live {
            if let Some(delay) = options.delay {
                tokio::time::sleep(delay).await;
            }
            track.push(position);
            self.settle().await;
            self.drain(emit);
            if let Some(last) = track.last() {
                emit(HeadlessEvent::position_appended(
                    track.len() - 1,
                    last.total_meters,
                    last.total_seconds,
                ));
            }
        }

        if options.popup && track.has_positions() {
            let index = track.len() - 1;
            emit(HeadlessEvent::popup(index, self.vm.get_popup_html(index)?));
        }

        let (meters, seconds) = track
            .last()
            .map(|p| (p.total_meters, p.total_seconds))
            .unwrap_or_default();
        emit(HeadlessEvent::replay_finished(
            self.vm.api_name(),
            self.commands.get(),
            self.lang.locale_duration(seconds)?,
            self.lang.format_distance_major(meters)?,
        ));
        Ok(())
    }

    /// Stop reacting to state changes and release the active backend.
    pub fn shutdown(&self) {
        self.vm.teardown();
        if let Some(api) = self.vm.api() {
            api.cleanup();
        }
        self.vm.set_api(None);
    }

    fn drain(&self, emit: &mut impl FnMut(HeadlessEvent)) {
        for command in self.log.drain() {
            self.commands.set(self.commands.get() + 1);
            emit(HeadlessEvent::map(command));
        }
    }

    fn report_backend(&self, emit: &mut impl FnMut(HeadlessEvent)) {
        let current = self.vm.api_name();
        if current == *self.reported.borrow() {
            return;
        }
        if let Some(api) = &current {
            emit(HeadlessEvent::backend_ready(api));
        }
        *self.reported.borrow_mut() = current;
    }
}
