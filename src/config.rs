use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::proximity::{DEFAULT_DISTANCE_METERS, MAX_DISTANCE_METERS, MIN_DISTANCE_METERS};

pub const DEFAULT_USER_ID: &str = "local";

/// On-disk configuration (TOML). Every field is optional; the CLI's
/// `--db` flag overrides `db_path`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    pub db_path: Option<String>,
    pub user_id: Option<String>,
    pub remote_dir: Option<String>,
    #[serde(default)]
    pub proximity: ProximityConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProximityConfig {
    pub default_distance_meters: Option<u32>,
}

/// Resolved configuration with every default applied.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub user_id: String,
    pub remote_dir: PathBuf,
    pub proximity_default_distance: u32,
}

impl Config {
    /// Load from an explicit path, or from `$HOME/.waylist/config.toml`
    /// when it exists; a missing default file means defaults.
    pub fn load(explicit: Option<&str>) -> Result<Config, ConfigError> {
        let file = match explicit {
            Some(path) => read_file(Path::new(path))?,
            None => {
                let default = default_config_path();
                if default.exists() {
                    read_file(&default)?
                } else {
                    ConfigFile::default()
                }
            }
        };
        Ok(Config::from_file(file))
    }

    pub fn from_file(file: ConfigFile) -> Config {
        let db_path = file
            .db_path
            .unwrap_or_else(|| default_db_path().to_string_lossy().into_owned());
        let remote_dir = file
            .remote_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| crate::cloud::default_remote_dir(&db_path));
        Config {
            db_path,
            user_id: file.user_id.unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            remote_dir,
            proximity_default_distance: file
                .proximity
                .default_distance_meters
                .unwrap_or(DEFAULT_DISTANCE_METERS)
                .clamp(MIN_DISTANCE_METERS, MAX_DISTANCE_METERS),
        }
    }
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
    toml::from_str(&raw).map_err(|err| ConfigError::Parse(path.to_path_buf(), err))
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_config_path() -> PathBuf {
    home_dir().join(".waylist").join("config.toml")
}

fn default_db_path() -> PathBuf {
    home_dir().join(".waylist").join("waylist.db")
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, err) => {
                write!(f, "failed to read config '{}': {}", path.display(), err)
            }
            ConfigError::Parse(path, err) => {
                write!(f, "failed to parse config '{}': {}", path.display(), err)
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(_, err) => Some(err),
            ConfigError::Parse(_, err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigFile};

    #[test]
    fn defaults_fill_every_field() {
        let config = Config::from_file(ConfigFile::default());
        assert!(config.db_path.ends_with("waylist.db"));
        assert_eq!(config.user_id, "local");
        assert_eq!(config.proximity_default_distance, 500);
        assert!(config.remote_dir.ends_with("remote"));
    }

    #[test]
    fn file_values_win_and_distance_is_clamped() {
        let file: ConfigFile = toml::from_str(
            r#"
db_path = "/tmp/waylist-test.db"
user_id = "u-42"

[proximity]
default_distance_meters = 5000
"#,
        )
        .expect("parse");
        let config = Config::from_file(file);
        assert_eq!(config.db_path, "/tmp/waylist-test.db");
        assert_eq!(config.user_id, "u-42");
        assert_eq!(config.proximity_default_distance, 2000);
        assert_eq!(
            config.remote_dir,
            std::path::Path::new("/tmp").join("remote")
        );
    }
}
