//! μlogger map viewer - headless track replay
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ulog_app::config::{
    default_config_dir, load_settings, load_settings_file, save_settings, Units, CONFIG_FILENAME,
};
use ulog_core::logging::{self, Banner};
use ulog_core::LocalScheduler;
use ulogger_map::{run_replay, ReplayOptions};

/// μlogger map viewer - replays GPS tracks through the map view-model
#[derive(Parser, Debug)]
#[command(name = "ulog-map")]
#[command(about = "Replay μlogger tracks through the map view-model", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level (ULOG_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a track file, printing backend calls as NDJSON (one event per line)
    Replay {
        /// Track file (JSON)
        #[arg(value_name = "TRACK")]
        track: PathBuf,

        /// Settings file to use instead of the platform config dir
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Map backend to start with
        #[arg(long, value_name = "API")]
        api: Option<String>,

        /// Unit preset: metric, imperial or nautical
        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,

        /// Make the first init of this backend fail (repeatable)
        #[arg(long, value_name = "API")]
        fail: Vec<String>,

        /// Switch to this backend once the track is shown
        #[arg(long, value_name = "API")]
        switch: Option<String>,

        /// Replay the last N positions as live updates
        #[arg(long, value_name = "N", default_value_t = 0)]
        live: usize,

        /// Pause between live updates, in milliseconds
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        /// Report the popup of the latest position
        #[arg(long)]
        popup: bool,

        /// Leave the statistics out of the latest position's popup
        #[arg(long)]
        show_latest: bool,
    },

    /// Print the effective settings as TOML
    Config {
        /// Settings file to use instead of the platform config dir
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the settings to the platform config dir
        #[arg(long)]
        init: bool,
    },
}

fn parse_units(name: &str) -> Result<Units, String> {
    Units::parse(name).ok_or_else(|| format!("unknown units '{}' (metric, imperial, nautical)", name))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };

    match args.command {
        Command::Replay {
            track,
            config,
            api,
            units,
            fail,
            switch,
            live,
            delay_ms,
            popup,
            show_latest,
        } => {
            let options = ReplayOptions {
                config,
                api,
                units,
                fail,
                switch,
                live,
                delay: delay_ms.map(Duration::from_millis),
                popup,
                show_latest,
            };

            // Logs go to a file, stdout carries the events
            let mut banner = Banner::new("replay").with("Track", track.display());
            if let Ok(settings) = options.settings() {
                banner = banner
                    .with("Map API", &settings.map.api)
                    .with("Units", settings.units.as_str());
            }
            logging::init(level, &banner)?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let local = tokio::task::LocalSet::new();
            local.block_on(&runtime, async {
                run_replay(&track, &options, Rc::new(LocalScheduler), |event| {
                    event.emit()
                })
                .await
            })?;
        }
        Command::Config { config, init } => {
            let dir = default_config_dir();
            logging::init(level, &Banner::new("config").with("Config dir", dir.display()))?;
            let settings = match &config {
                Some(path) => load_settings_file(path)?,
                None => load_settings(&dir),
            };
            if init {
                save_settings(&dir, &settings)?;
                eprintln!("Wrote {}", dir.join(CONFIG_FILENAME).display());
            }
            print!("{}", toml::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}
