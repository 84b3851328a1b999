use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::WeekStart;
use crate::timetables::state_dir;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// User preferences read from `config.toml` in the state directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Week start for timetables that do not exist yet.
    pub week_start: WeekStart,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn config_path() -> PathBuf {
    state_dir().join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::domain::WeekStart;

    use super::{ConfigError, Settings};

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.week_start, WeekStart::Monday);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "week_start = \"sunday\"\n").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.week_start, WeekStart::Sunday);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn invalid_values_are_reported() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "week_start = \"friday\"\n").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
