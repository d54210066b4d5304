//! Application settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// OCR language passed to the engine (e.g. "eng", "chi_sim").
    pub language: String,
    /// OCR backend name ("tesseract", "paddle").
    pub backend: String,
    /// Render resolution for PDF pages, in DPI.
    pub pdf_dpi: u32,
    /// Seconds between autosave snapshots.
    pub autosave_interval_secs: u64,
    /// Directory for autosave exports.
    pub autosave_dir: PathBuf,
    /// Maximum number of regions per page.
    pub max_regions: usize,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("invoscan");

        Self {
            language: "eng".to_string(),
            backend: "tesseract".to_string(),
            pdf_dpi: 300,
            autosave_interval_secs: 30,
            autosave_dir: data_dir.join("autosave"),
            max_regions: 32,
        }
    }
}

impl Settings {
    /// Default config file location under the user config directory.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("invoscan")
            .join("config.toml")
    }

    /// Load settings from `path`, or from the default location when no
    /// path is given. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.backend, "tesseract");
        assert_eq!(settings.pdf_dpi, 300);
        assert_eq!(settings.autosave_interval_secs, 30);
        assert_eq!(settings.max_regions, 32);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let settings: Settings = toml::from_str("language = \"chi_sim\"\npdf_dpi = 150\n").unwrap();
        assert_eq!(settings.language, "chi_sim");
        assert_eq!(settings.pdf_dpi, 150);
        assert_eq!(settings.backend, "tesseract");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let settings = Settings::load(Some(Path::new("/nonexistent/invoscan.toml"))).unwrap();
        assert_eq!(settings.max_regions, 32);
    }
}
