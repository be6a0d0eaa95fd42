pub mod loader;

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant, SystemTime};

// Global configuration instance with thread-safe access
pub static CONFIG: once_cell::sync::Lazy<RwLock<Config>> =
    once_cell::sync::Lazy::new(|| RwLock::new(Config::default()));

// Time to wait between checking for config file changes
const CONFIG_CHECK_INTERVAL: Duration = Duration::from_secs(2);

// Last time the file was checked, and the modification time seen then
static LAST_CHECK: Mutex<Option<(Instant, Option<SystemTime>)>> = Mutex::new(None);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub music_enabled: bool,
    pub sound_enabled: bool,
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            music_enabled: true,
            sound_enabled: true,
            volume: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_grid: bool,
    pub show_preview: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_grid: false,
            show_preview: true,
        }
    }
}

impl Config {
    /// Copy of the active configuration.
    pub fn current() -> Config {
        match CONFIG.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the active configuration.
    pub fn install(config: Config) {
        match CONFIG.write() {
            Ok(mut current) => *current = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    /// Loads the config file into [`CONFIG`], falling back to defaults.
    pub fn init() -> Config {
        let config = match loader::load_config_from_file() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                config
            }
            Err(e) => {
                error!("Failed to load configuration: {e}");
                Config::default()
            }
        };
        remember_modified(&loader::get_config_file_path());
        Self::install(config.clone());
        config
    }

    // Check if the config needs to be reloaded and reload if necessary
    pub fn check_and_reload() -> bool {
        let path = loader::get_config_file_path();
        let now = Instant::now();

        let Ok(mut last_check) = LAST_CHECK.lock() else {
            return false;
        };
        if let Some((checked_at, _)) = *last_check {
            if now.duration_since(checked_at) < CONFIG_CHECK_INTERVAL {
                return false;
            }
        }

        let modified = loader::modified_time(&path);
        let changed = match *last_check {
            Some((_, seen)) => seen != modified,
            None => true,
        };
        *last_check = Some((now, modified));
        drop(last_check);

        if !changed {
            return false;
        }

        match loader::load_config_from_path(&path) {
            Ok(config) => {
                info!("Configuration reloaded from {}", path.display());
                Self::install(config);
                true
            }
            Err(e) => {
                error!("Failed to reload configuration: {e}");
                false
            }
        }
    }
}

fn remember_modified(path: &Path) {
    if let Ok(mut last_check) = LAST_CHECK.lock() {
        *last_check = Some((Instant::now(), loader::modified_time(path)));
    }
}
