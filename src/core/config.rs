use std::path::PathBuf;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

use super::error::{BloomyError, Result};
use crate::{API_KEY_ENV, DEFAULT_BASE_URL};

/// Resolved client configuration.
///
/// The API key is looked up in priority order: an explicit argument to
/// [`Configuration::resolve_api_key`], the `BG_API_KEY` environment
/// variable, then `~/.config/bloomy/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Configuration {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Configuration {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: None,
        }
    }

    /// Load configuration from the config file and `BG_*` environment
    /// variables, environment taking precedence.
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = Self::config_file_path() {
            debug!("Looking for config file at {}", path.display());
            builder = builder.add_source(
                File::from(path).format(FileFormat::Toml).required(false),
            );
        }

        builder = builder.add_source(Environment::with_prefix("BG"));

        let settings = builder
            .build()
            .map_err(|e| BloomyError::Configuration(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| BloomyError::Configuration(e.to_string()))
    }

    /// The API key to use, with an explicit key taking priority over
    /// anything loaded from the environment or file.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(key) = explicit {
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }

        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(BloomyError::Configuration(format!(
                "No API key provided. Set {API_KEY_ENV} or pass a key explicitly."
            ))),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    fn config_file_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("bloomy")
                .join("config.toml")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_key_wins() {
        let config = Configuration::new("stored-key");
        assert_eq!(
            config.resolve_api_key(Some("direct-key")).unwrap(),
            "direct-key"
        );
    }

    #[test]
    fn stored_key_used_when_no_explicit() {
        let config = Configuration::new("stored-key");
        assert_eq!(config.resolve_api_key(None).unwrap(), "stored-key");
    }

    #[test]
    fn missing_key_is_configuration_error() {
        let config = Configuration::default();
        let err = config.resolve_api_key(None).unwrap_err();
        assert!(matches!(err, BloomyError::Configuration(_)));
        assert!(err.to_string().contains("No API key provided"));
    }

    #[test]
    fn empty_explicit_key_falls_through() {
        let config = Configuration::new("stored-key");
        assert_eq!(config.resolve_api_key(Some("")).unwrap(), "stored-key");
    }

    #[test]
    fn default_base_url() {
        let config = Configuration::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn custom_base_url() {
        let config = Configuration {
            api_key: None,
            base_url: Some("https://staging.example.com/api/v1".to_string()),
        };
        assert_eq!(config.base_url(), "https://staging.example.com/api/v1");
    }
}
