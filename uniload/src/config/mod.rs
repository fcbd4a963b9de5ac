//! Persistent configuration.
//!
//! Settings live in an INI file at `<config dir>/uniload/config.ini`:
//!
//! ```ini
//! [service]
//! base_url = http://localhost:5000
//! timeout_secs = 300
//!
//! [progress]
//! interval_ms = 800
//! max_increment = 2
//! ceiling = 90
//!
//! [defaults]
//! format = mp4
//! quality = 1080p
//! ```
//!
//! A missing file means defaults. Individual values are addressed as
//! `section.key` through [`ConfigKey`].

mod file;
mod keys;

pub use file::{
    config_dir, config_file_path, ConfigError, ConfigFile, ConfigResult, DefaultSettings,
    ProgressSettings, ServiceSettings,
};
pub use keys::ConfigKey;
