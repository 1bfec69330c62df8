//! Configuration.
//!
//! Loads a TOML file from `~/.config/madrona/config.toml`, generating one
//! with defaults on first run. Everything here has a sensible default so a
//! missing or partial file never blocks startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit socket name; `None` picks the first free wayland-N.
    pub socket_name: Option<String>,
    /// Output layout. Empty falls back to a single 1920x1080 output.
    pub outputs: Vec<OutputConfig>,
}

/// One output in the virtual desktop layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub name: String,
    /// Position in virtual-desktop coordinates.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            name: "output-1".to_string(),
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if it doesn't exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        info!("Configuration loaded from {:?}", config_path);
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("madrona");
        Ok(config_dir.join("config.toml"))
    }

    fn save_default(path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;
        fs::write(path, toml_string).context("Failed to write default config file")?;
        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [[outputs]]
            name = "DP-1"
            width = 2560
            height = 1440
            "#,
        )
        .unwrap();
        assert_eq!(config.socket_name, None);
        assert_eq!(config.outputs.len(), 1);
        assert_eq!(config.outputs[0].name, "DP-1");
        assert_eq!((config.outputs[0].x, config.outputs[0].y), (0, 0));
    }

    #[test]
    fn default_config_round_trips() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert!(parsed.outputs.is_empty());
    }
}
