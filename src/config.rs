//! Runtime configuration loaded from `config.yml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::i18n::Language;
use crate::paths;

/// Environment variable overriding [`Config::api_base_url`].
pub const API_URL_ENV: &str = "LANGSYNC_API_URL";

/// Written to `config.yml` the first time the tool runs.
pub const SKELETON_CONFIG_CONTENT: &str = r"# langsync configuration

# Backend origin serving /api/language-contents/{lang}/{namespace}
api_base_url: http://localhost:5000

# Dictionary namespace requested from the backend
namespace: translation

# Language used when no choice is persisted and the system locale is unsupported (vi | en)
default_language: vi

# How long a fetched dictionary is trusted before the next start refetches it
cache_ttl_secs: 3600

# Storage file for cached dictionaries and the language choice.
# Relative paths are resolved against this directory. Defaults to the data directory.
# storage_file: i18n_storage.json

connect_timeout_secs: 15
request_timeout_secs: 30
";

/// Settings for the store, its cache and the HTTP source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend origin.
    pub api_base_url: String,
    /// Dictionary namespace.
    pub namespace: String,
    /// Language used when nothing else applies.
    pub default_language: Language,
    /// Cache freshness window in seconds.
    pub cache_ttl_secs: u64,
    /// Storage file override.
    pub storage_file: Option<PathBuf>,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            namespace: "translation".to_string(),
            default_language: Language::Vi,
            cache_ttl_secs: 3600,
            storage_file: None,
            connect_timeout_secs: 15,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Cache freshness window.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Connect timeout for the HTTP source.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout for the HTTP source.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Effective storage file location.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.storage_file
            .as_deref()
            .map_or_else(paths::default_storage_file, paths::resolve_against_config)
    }

    /// What: Parse configuration from YAML text.
    ///
    /// # Errors
    /// - Returns `Err` with a readable message when the YAML is malformed or has wrong types
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_norway::from_str(content).map_err(|e| format!("Failed to parse config: {e}"))
    }

    /// What: Load configuration from `path`, falling back to defaults.
    ///
    /// Details:
    /// - Missing file: defaults (debug log)
    /// - Unreadable or invalid file: defaults (warning)
    /// - `LANGSYNC_API_URL` overrides the base URL either way
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "invalid config, using defaults"
                );
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read config, using defaults"
                );
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    /// What: Load `config.yml` from the config directory, writing a skeleton when missing.
    #[must_use]
    pub fn load() -> Self {
        let path = paths::config_dir().join("config.yml");
        if !path.exists() {
            match fs::write(&path, SKELETON_CONFIG_CONTENT) {
                Ok(()) => tracing::info!(path = %path.display(), "wrote default config"),
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "could not write default config"
                    );
                }
            }
        }
        Self::load_from(&path)
    }

    /// Apply environment overrides on top of file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            tracing::debug!(url = %url, "api base url overridden from environment");
            self.api_base_url = url.trim().to_string();
        }
    }
}
