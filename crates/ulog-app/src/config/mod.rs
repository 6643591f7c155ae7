//! Configuration for the μlogger map viewer
//!
//! Supports:
//! - `ulogger.toml` - Settings file (units, map backend, colors)
//! - [`Config`] - Observed runtime configuration derived from the settings

pub mod observed;
pub mod settings;
pub mod types;

pub use observed::*;
pub use settings::{
    default_config_dir, load_settings, load_settings_file, save_settings, CONFIG_FILENAME,
};
pub use types::*;
