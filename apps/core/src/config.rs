use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_AI_SIGIL;

const APP_DIR_NAME: &str = "lumina";
const CONFIG_FILE_NAME: &str = "config.json";
const OPTIONS_FILE_NAME: &str = "options.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid options file {path}: {source}")]
    Options {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not resolve a per-user config directory")]
    MissingConfigDir,
}

/// User settings owned by the Settings surface. The controller stores and
/// forwards this record but never interprets its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub ai_service: String,
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    pub default_model: String,
    #[serde(default)]
    pub search_directories: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai_service: "openrouter".to_string(),
            openrouter_api_key: None,
            openai_api_key: None,
            default_model: "anthropic/claude-3.5-sonnet".to_string(),
            search_directories: vec![
                dirs::home_dir()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .into_owned(),
                "/usr/share/applications".to_string(),
            ],
        }
    }
}

/// Tuning for the controller itself, kept apart from the user-facing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerOptions {
    pub debounce_ms: u64,
    pub min_loading_ms: u64,
    pub ai_sigil: char,
    pub settings_shortcut: String,
    pub log_level: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_loading_ms: 200,
            ai_sigil: DEFAULT_AI_SIGIL,
            settings_shortcut: "Ctrl+,".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ControllerOptions {
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn min_loading(&self) -> Duration {
        Duration::from_millis(self.min_loading_ms)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default())
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&raw).map_err(|source| ConfigError::Options {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl AppPaths {
    pub fn resolve(config_dir_override: Option<&Path>) -> Result<Self, ConfigError> {
        let config_dir = match config_dir_override {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .ok_or(ConfigError::MissingConfigDir)?
                .join(APP_DIR_NAME),
        };
        let logs_dir = match config_dir_override {
            Some(dir) => dir.join("logs"),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| config_dir.clone())
                .join(APP_DIR_NAME)
                .join("logs"),
        };
        Ok(Self {
            config_dir,
            logs_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    pub fn options_file(&self) -> PathBuf {
        self.config_dir.join(OPTIONS_FILE_NAME)
    }
}

/// File-backed storage for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the default record.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Config::default())
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        json5::from_str(&raw).map_err(|error| ConfigError::Parse {
            path: self.path.clone(),
            message: error.to_string(),
        })
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let encoded = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, encoded).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
