//! Logging configuration using tracing
//!
//! stdout carries replay events, so everything is logged to a daily file.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable overriding the log filter
pub const LOG_ENV_VAR: &str = "ULOG_LOG";

const LOG_FILE_NAME: &str = "ulog-map.log";

/// Crates whose events pass the default filter
const CRATES: &[&str] = &["ulog_core", "ulog_app", "ulogger_map"];

/// Filter used when `ULOG_LOG` is unset: `level` for our crates, warn for
/// dependencies.
pub fn default_filter(level: &str) -> String {
    let mut directives: Vec<String> = CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Startup facts written under the log banner
#[derive(Debug, Clone, Default)]
pub struct Banner {
    /// What the process is doing, e.g. "replay of walk.json"
    pub mode: String,
    lines: Vec<(&'static str, String)>,
}

impl Banner {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            lines: Vec::new(),
        }
    }

    /// Add a `label: value` line
    pub fn with(mut self, label: &'static str, value: impl ToString) -> Self {
        self.lines.push((label, value.to_string()));
        self
    }

    fn render(&self, log_dir: &std::path::Path) -> Vec<String> {
        let mut out = vec![format!("μlogger map viewer starting ({})", self.mode)];
        out.extend(self.lines.iter().map(|(l, v)| format!("{}: {}", l, v)));
        out.push(format!("Log directory: {}", log_dir.display()));
        out
    }
}

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/ulogger/logs/`.
/// Without `ULOG_LOG`, our crates log at `level` (see [`default_filter`]).
///
/// # Examples
/// ```bash
/// ULOG_LOG=debug ulog-map replay track.json
/// ULOG_LOG=ulog_app::map=trace ulog-map replay track.json
/// ```
pub fn init(level: &str, banner: &Banner) -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);

    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    for line in banner.render(&log_dir) {
        tracing::info!("{}", line);
    }
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("ulogger").join("logs"))
}

/// Get the log file path for the current day
pub fn get_current_log_file() -> Result<PathBuf> {
    let dir = get_log_directory()?;
    Ok(dir.join(LOG_FILE_NAME))
}
