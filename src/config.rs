//! TOML configuration for the tracker settings.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::tracker::TrackerSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Default location of the configuration file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("padstream").join("config.toml"))
}

/// Read settings from `path`. Missing keys fall back to their defaults.
pub fn load_from(path: &Path) -> Result<TrackerSettings, ConfigError> {
    let raw = fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

/// Write `settings` to `path`, creating parent directories as needed.
pub fn save_to(path: &Path, settings: &TrackerSettings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(settings)?)?;
    Ok(())
}

/// Settings from the default config file, falling back to defaults when the
/// file is missing or unparseable.
pub fn load_or_default() -> TrackerSettings {
    let Some(path) = config_path() else {
        warn!("No config directory available, using default settings");
        return TrackerSettings::default();
    };

    match load_from(&path) {
        Ok(settings) => {
            debug!("Loaded settings from {}", path.display());
            settings
        }
        Err(ConfigError::Io(_)) => {
            debug!("No config file at {}, using defaults", path.display());
            TrackerSettings::default()
        }
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TrackerSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padstream").join("config.toml");

        let settings = TrackerSettings {
            stick_deadzone: 0.2,
            trigger_deadzone: 0.1,
            polls_per_second: 30,
            stop_iteration_threshold: 8,
        };

        save_to(&path, &settings).unwrap();
        let loaded = load_from(&path).unwrap();

        assert_eq!(loaded.stick_deadzone, 0.2);
        assert_eq!(loaded.trigger_deadzone, 0.1);
        assert_eq!(loaded.polls_per_second, 30);
        assert_eq!(loaded.stop_iteration_threshold, 8);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "polls_per_second = 120\n").unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.polls_per_second, 120);
        assert_eq!(loaded.stick_deadzone, 0.15);
        assert_eq!(loaded.stop_iteration_threshold, 5);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(load_from(&path), Err(ConfigError::Io(_))));
    }
}
