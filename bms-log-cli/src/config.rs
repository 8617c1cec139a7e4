//! Configuration loading and parsing

use anyhow::{Context, Result};
use bms_log_decoder::DecoderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration (loaded from a TOML file)
///
/// Every section is optional; command line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub filtering: FilteringConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub log: Option<PathBuf>,
    pub dbc: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SignalsConfig {
    /// Target signals; the BMS defaults when absent
    pub track: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilteringConfig {
    pub channels: Option<Vec<u32>>,
    pub message_ids: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChartConfig {
    pub title: Option<String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    600
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: None,
            width: default_width(),
            height: default_height(),
        }
    }
}

impl AppConfig {
    /// Decoder settings described by this configuration
    pub fn decoder_config(&self) -> DecoderConfig {
        let mut config = DecoderConfig::new();
        if let Some(track) = &self.signals.track {
            config = config.with_target_signals(track.iter().cloned());
        }
        if let Some(channels) = &self.filtering.channels {
            config = config.with_channel_filter(channels.clone());
        }
        if let Some(ids) = &self.filtering.message_ids {
            config = config.with_message_filter(ids.clone());
        }
        config
    }

    /// Make relative input paths relative to `base` instead of the working directory
    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.input.log, &mut self.input.dbc].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }

    Ok(config)
}
