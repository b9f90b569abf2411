pub mod model;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub use model::ClientConfig;

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subarashi")
        .join("config.toml")
}

/// Load the config from `path`, or from [`config_path`] when none is given.
/// A missing default file yields [`ClientConfig::default`]; a missing
/// explicit path is an error.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = config_path();
            if !default.exists() {
                return Ok(ClientConfig::default());
            }
            default
        }
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: ClientConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
