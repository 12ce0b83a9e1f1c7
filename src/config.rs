//! Config loading for the tempo CLI.
//!
//! Config lives at ~/.config/tempo/config.toml and holds the data
//! directory override plus the user's weekly focus blocks.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tempo_core::FocusBlock;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Directory holding the event store (defaults to the platform data dir)
    pub data_dir: Option<String>,

    /// Protected weekly focus blocks
    #[serde(default, rename = "focus")]
    pub focus_blocks: Vec<FocusBlockConfig>,
}

/// One `[[focus]]` table from config.toml.
#[derive(Debug, Deserialize)]
pub struct FocusBlockConfig {
    /// Day of week, 0 = Sunday
    pub day: u8,
    pub start_hour: u32,
    pub end_hour: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Config {
    /// Focus blocks in engine form.
    pub fn focus(&self) -> Vec<FocusBlock> {
        self.focus_blocks
            .iter()
            .map(|block| FocusBlock {
                day_of_week: block.day,
                start_hour: block.start_hour,
                end_hour: block.end_hour,
                is_active: block.active,
            })
            .collect()
    }
}

/// Get the config directory path (~/.config/tempo)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("tempo");
    Ok(config_dir)
}

/// Get the config file path (~/.config/tempo/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from ~/.config/tempo/config.toml, falling back to defaults
/// when no file exists yet.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Resolve the event store path (<data_dir>/events.json).
pub fn store_path(config: &Config) -> Result<PathBuf> {
    let dir = match &config.data_dir {
        Some(dir) => expand_path(dir),
        None => dirs::data_dir()
            .context("Could not determine data directory")?
            .join("tempo"),
    };
    Ok(dir.join("events.json"))
}

/// Expand ~ in paths to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
