//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target window application name (from `xcap::Window::app_name()`).
    ///
    /// If multiple windows share the same app name, the first match is used.
    pub app_name: String,

    /// Optional max capture height (downscales large captures for performance).
    pub max_capture_height: Option<u32>,

    /// Folder holding `anchors/` and `ocr/`. Discovered automatically when unset.
    pub assets_dir: Option<PathBuf>,

    /// Category layout to expect. The bundled layout is used when unset.
    pub schema_path: Option<PathBuf>,

    /// Prefix of the OCR recognition model and charset files.
    pub ocr_language: String,

    pub guide: guide::GuideConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "RuneScape".to_string(),
            max_capture_height: Some(1080),
            assets_dir: None,
            schema_path: None,
            ocr_language: "latin".to_string(),
            guide: guide::GuideConfig::default(),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("ripper.json"))
    }

    /// Load configuration from disk, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        match Self::try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from disk. A missing file yields the defaults.
    pub fn try_load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
        Self::from_json(&json).with_context(|| format!("parse {:?}", path))
    }

    fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_the_defaults() {
        let cfg = Config::from_json(r#"{"app_name":"rs2client","guide":{"max_fps":30}}"#).unwrap();
        assert_eq!(cfg.app_name, "rs2client");
        assert_eq!(cfg.guide.max_fps, 30);
        assert_eq!(cfg.guide.interval_ms, 50);
        assert_eq!(cfg.max_capture_height, Some(1080));
        assert_eq!(cfg.ocr_language, "latin");
    }

    #[test]
    fn saved_json_loads_back() {
        let cfg = Config {
            schema_path: Some(PathBuf::from("layouts/achievements.json")),
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), cfg);
    }
}
