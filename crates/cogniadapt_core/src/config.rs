//! Configuration for CogniAdapt.
//!
//! Settings persist across sessions as TOML. The API key is taken from the
//! `GEMINI_API_KEY` environment variable when not present in the file; a
//! missing key is logged at startup but calls fail at invocation time
//! instead of preventing startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CogniConfig {
    /// API key for the generative backend. Usually left out of the file
    /// and supplied via `GEMINI_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used for text transforms, chat, and media analysis.
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Model used for image generation.
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Model used for image-to-video animation.
    #[serde(default = "default_video_model")]
    pub video_model: String,

    /// Seconds between polls of a long-running video operation.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Where the selected profile is persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<PathBuf>,
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_video_model() -> String {
    DEFAULT_VIDEO_MODEL.to_string()
}

fn default_poll_interval() -> u64 {
    10
}

impl Default for CogniConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            text_model: default_text_model(),
            image_model: default_image_model(),
            video_model: default_video_model(),
            poll_interval_secs: default_poll_interval(),
            profile_path: None,
        }
    }
}

impl CogniConfig {
    /// Fill the API key from the environment when the file omits it, and
    /// log if it is missing entirely.
    pub fn resolve_api_key(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        if self.api_key.is_none() {
            tracing::error!(
                "{} is not set. Backend calls will fail until it is provided.",
                API_KEY_ENV
            );
        }
    }

    pub async fn load() -> Result<Self> {
        load_config_from_standard_locations().await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        load_config(path).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        save_config(self, path).await
    }
}

/// Standard config file locations, in lookup order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("cogniadapt.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("cogniadapt").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".cogniadapt").join("config.toml"));
    }

    paths
}

/// Load configuration from a TOML file.
pub async fn load_config(path: &Path) -> Result<CogniConfig> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        CoreError::config_error(
            path.display().to_string(),
            "file",
            "readable TOML file",
            e,
        )
    })?;

    toml::from_str(&content).map_err(|e| {
        CoreError::config_error(
            path.display().to_string(),
            "content",
            "valid TOML configuration",
            e,
        )
    })
}

/// Save configuration to a TOML file.
pub async fn save_config(config: &CogniConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            CoreError::config_error(
                parent.display().to_string(),
                "directory",
                "writable directory",
                e,
            )
        })?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| {
        CoreError::config_error(
            path.display().to_string(),
            "serialization",
            "serializable config structure",
            e,
        )
    })?;

    tokio::fs::write(path, content).await.map_err(|e| {
        CoreError::config_error(
            path.display().to_string(),
            "file",
            "writable file location",
            e,
        )
    })
}

/// Load configuration from standard locations, falling back to defaults.
pub async fn load_config_from_standard_locations() -> Result<CogniConfig> {
    for path in config_paths() {
        if path.exists() {
            return load_config(&path).await;
        }
    }

    Ok(CogniConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = CogniConfig::default();
        config.poll_interval_secs = 2;
        config.text_model = "gemini-test".to_string();
        config.save_to(&path).await.unwrap();

        let loaded = CogniConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded.poll_interval_secs, 2);
        assert_eq!(loaded.text_model, "gemini-test");
        assert_eq!(loaded.image_model, DEFAULT_IMAGE_MODEL);
    }

    #[tokio::test]
    async fn partial_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "text_model = \"gemini-other\"\n").unwrap();

        let config = CogniConfig::load_from(&path).await.unwrap();
        assert_eq!(config.text_model, "gemini-other");
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.video_model, DEFAULT_VIDEO_MODEL);
    }

    #[tokio::test]
    async fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not toml = = =").unwrap();

        let result = CogniConfig::load_from(&path).await;
        assert!(matches!(result, Err(CoreError::ConfigurationError { .. })));
    }
}
