// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Runtime configuration.
//!
//! Loaded from the YAML file named by `PANELINE_CONFIG`, else
//! `paneline.yaml` in the working directory. Missing fields take their
//! defaults and a malformed file falls back to defaults entirely.

use crate::canvas::magnifier::{self, MagnifierSettings};
use crate::canvas::store::DEFAULT_HISTORY_LIMIT;
use crate::models::annotation::Rgba;
use crate::util::scale::DEFAULT_REFERENCE_WIDTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "PANELINE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "paneline.yaml";

/// Loupe settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnifierConfig {
    /// Loupe diameter in screen pixels.
    pub diameter: f32,
    pub zoom: f32,
    /// Gap between the pointer and the loupe edge, in screen pixels.
    pub gap: f32,
    /// Show the loupe for mouse drags too.
    pub always_on: bool,
}

impl Default for MagnifierConfig {
    fn default() -> Self {
        Self {
            diameter: magnifier::DEFAULT_DIAMETER,
            zoom: magnifier::DEFAULT_ZOOM,
            gap: magnifier::DEFAULT_GAP,
            always_on: false,
        }
    }
}

impl MagnifierConfig {
    pub fn settings(&self) -> MagnifierSettings {
        let defaults = MagnifierSettings::default();
        MagnifierSettings {
            diameter: positive_or(self.diameter, defaults.diameter),
            zoom: positive_or(self.zoom, defaults.zoom),
            gap: if self.gap.is_finite() { self.gap.max(0.0) } else { defaults.gap },
        }
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image width at which reference units equal pixels.
    pub reference_width: f32,
    /// Undo snapshots kept, 0 for no limit. Beyond a limit the oldest are
    /// dropped, never the empty base state.
    pub history_limit: usize,
    pub magnifier: MagnifierConfig,
    pub default_color: Rgba,
    /// Brush radius in reference units.
    pub brush_radius: f32,
    /// Text size in reference units.
    pub font_size: f32,
    pub font_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_width: DEFAULT_REFERENCE_WIDTH,
            history_limit: DEFAULT_HISTORY_LIMIT,
            magnifier: MagnifierConfig::default(),
            default_color: Rgba::RED,
            brush_radius: 3.0,
            font_size: 28.0,
            font_path: None,
        }
    }
}

impl Config {
    /// Parse YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(text).context("Invalid configuration")?;
        Ok(config)
    }

    /// Read a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load from the environment-selected or default file, falling back to
    /// defaults.
    pub fn load() -> Self {
        let (path, explicit) = match std::env::var_os(CONFIG_ENV) {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !explicit && !path.exists() {
            log::debug!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{:#}; using default configuration", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.reference_width, 1000.0);
        assert_eq!(config.history_limit, 0);
        assert_eq!(config.default_color.to_hex(), "#ff3b30");
        assert_eq!(config.magnifier.settings(), MagnifierSettings::default());
        assert!(!config.magnifier.always_on);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml(
            "history_limit: 20\ndefault_color: '#00ff00'\nmagnifier:\n  zoom: 4\n  always_on: true\n",
        )
        .unwrap();
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.default_color, Rgba::rgb(0, 255, 0));
        assert_eq!(config.magnifier.zoom, 4.0);
        assert!(config.magnifier.always_on);
        assert_eq!(config.magnifier.diameter, 160.0);
        assert_eq!(config.font_size, 28.0);
    }

    #[test]
    fn test_empty_and_invalid_yaml() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert!(Config::from_yaml("history_limit: lots").is_err());
        assert!(Config::from_file(Path::new("/nonexistent/paneline.yaml")).is_err());
    }

    #[test]
    fn test_invalid_magnifier_values_fall_back() {
        let magnifier = MagnifierConfig {
            diameter: -5.0,
            zoom: 0.0,
            gap: f32::NAN,
            always_on: false,
        };
        assert_eq!(magnifier.settings(), MagnifierSettings::default());
    }
}
