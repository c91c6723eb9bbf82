use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR_NAME: &str = "Slingshot";
const CONFIG_FILE_NAME: &str = "config.json";
const FRECENCY_FILE_NAME: &str = "frecency.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_results: u16,
    pub search_roots: Vec<PathBuf>,
    pub max_depth: usize,
    pub frecency_path: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            max_results: 10,
            search_roots: default_search_roots(),
            max_depth: 3,
            frecency_path: base.join(FRECENCY_FILE_NAME),
            log_dir: None,
            log_level: "info".to_string(),
            config_path: base.join(CONFIG_FILE_NAME),
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

fn default_search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    #[cfg(target_os = "windows")]
    {
        if let Some(data) = dirs::data_dir() {
            roots.push(data.join("Microsoft\\Windows\\Start Menu\\Programs"));
        }
        if let Ok(program_data) = std::env::var("ProgramData") {
            roots.push(PathBuf::from(program_data).join("Microsoft\\Windows\\Start Menu\\Programs"));
        }
    }
    #[cfg(not(target_os = "windows"))]
    {
        roots.push(PathBuf::from("/usr/share/applications"));
        if let Some(data) = dirs::data_dir() {
            roots.push(data.join("applications"));
        }
    }
    if let Some(desktop) = dirs::desktop_dir() {
        roots.push(desktop);
    }
    roots
}

/// Reads the config at `path` (or the default location).
///
/// A missing file yields defaults. Comments and trailing commas are accepted.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Config::default().config_path);

    let raw = match std::fs::read_to_string(&config_path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Config {
                config_path,
                ..Config::default()
            });
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: config_path,
                source,
            })
        }
    };

    let mut cfg: Config = json5::from_str(&raw).map_err(|error| ConfigError::Parse {
        path: config_path.clone(),
        message: error.to_string(),
    })?;
    cfg.config_path = config_path;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    let io_error = |source: std::io::Error| ConfigError::Io {
        path: cfg.config_path.clone(),
        source,
    };
    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let encoded = serde_json::to_string_pretty(cfg)?;
    std::fs::write(&cfg.config_path, encoded).map_err(io_error)
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !(5..=100).contains(&cfg.max_results) {
        return Err(ConfigError::Invalid(
            "max_results must be between 5 and 100".into(),
        ));
    }

    if cfg.frecency_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("frecency_path is required".into()));
    }

    if cfg.log_level.trim().is_empty() {
        return Err(ConfigError::Invalid("log_level is required".into()));
    }

    Ok(())
}
