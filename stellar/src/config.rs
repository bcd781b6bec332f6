//! Application configuration.
//!
//! Settings live in an optional JSON file; anything missing from the file
//! falls back to [`AppConfig::default`], and command line flags override both.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skyview::{ImageFormat, SkyViewConfig};
use thiserror::Error;

/// Default location of the classifier artifact
pub const DEFAULT_MODEL_PATH: &str = "stellar_classifier.json";

/// Default file written by the image command
pub const DEFAULT_OUTPUT_PATH: &str = "star_image.png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to the classifier artifact
    pub model_path: PathBuf,
    /// Image service settings
    pub skyview: SkyViewConfig,
    /// Payload requested from the image service
    pub image_format: ImageFormat,
    /// Where the image command writes its result
    pub output_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            skyview: SkyViewConfig::default(),
            image_format: ImageFormat::default(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl AppConfig {
    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load from `path` when given, built-in defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                log::debug!("Loading config from {}", path.display());
                Self::load_from_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stellar.json");

        let mut config = AppConfig::default();
        config.skyview.survey = "2MASS-J".to_string();
        config.skyview.pixels = Some(500);
        config.image_format = ImageFormat::Fits;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "image_format": "fits", "skyview": { "survey": "SDSSr" } }"#)
            .unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.image_format, ImageFormat::Fits);
        assert_eq!(loaded.skyview.survey, "SDSSr");
        assert_eq!(loaded.skyview.base_url, skyview::DEFAULT_SKYVIEW_URL);
        assert_eq!(loaded.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(matches!(
            AppConfig::load_or_default(Some(Path::new("/nonexistent/stellar.json"))),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }
}
