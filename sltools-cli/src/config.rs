//! Optional TOML configuration.
//!
//! Looked up at `--config <path>` or `<config dir>/sltools/config.toml`.
//! Every field is optional and command-line flags take precedence.

use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::Deserialize;
use sltools::IncludePolicy;

/// Environment variable holding the translation service key.
pub const API_KEY_ENV: &str = "DEEPL_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub log_level: Option<String>,
    pub include_base_dir: Option<PathBuf>,
    pub include_policy: Option<IncludePolicy>,
    pub deepl_api_key: Option<String>,
    pub deepl_endpoint: Option<String>,
}

/// `<config dir>/sltools/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sltools").join("config.toml"))
}

/// Loads the configuration.
///
/// An explicit path must exist. The default location is optional and a
/// missing file yields an empty configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, String> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => return Ok(Config::default()),
        },
    };
    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("Cannot read config file {}: {}", path.display(), e))?;
    let config = parse_config(&text)
        .map_err(|e| format!("Invalid config file {}: {}", path.display(), e))?;
    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<Config, String> {
    let config: Config = toml::from_str(text).map_err(|e| e.to_string())?;
    if let Some(level) = &config.log_level {
        level
            .parse::<LevelFilter>()
            .map_err(|_| format!("unknown log_level '{level}'"))?;
    }
    Ok(config)
}

impl Config {
    pub fn log_level(&self) -> Option<LevelFilter> {
        self.log_level.as_deref().and_then(|level| level.parse().ok())
    }

    /// The flag wins over the environment, which wins over the file. Blank
    /// values are skipped.
    pub fn api_key(&self, flag: Option<String>, env: Option<String>) -> Option<String> {
        let present = |key: &String| !key.trim().is_empty();
        flag.filter(present)
            .or_else(|| env.filter(present))
            .or_else(|| self.deepl_api_key.clone().filter(present))
    }
}
