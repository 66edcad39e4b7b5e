//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::{Deserialize, de};
use serde_json::Value;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/tagger.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RINGETTE_TAGGER_CONFIG_PATH";
const DEFAULT_COMMIT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SSE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Upper bound for one remote commit; expiry counts as a failed commit.
    pub commit_timeout: Duration,
    /// Buffer size of the SSE broadcast channel.
    pub sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        commit_timeout_ms = app_config.commit_timeout.as_millis() as u64,
                        sse_capacity = app_config.sse_capacity,
                        "loaded tagger config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document. Missing fields keep their defaults.
    ///
    /// The document must be a JSON object; positional arrays are rejected.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(contents)?;
        if !value.is_object() {
            return Err(<serde_json::Error as de::Error>::custom(
                "tagger config must be a JSON object",
            ));
        }
        serde_json::from_value::<RawConfig>(value).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            commit_timeout: Duration::from_millis(DEFAULT_COMMIT_TIMEOUT_MS),
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default = "default_commit_timeout_ms")]
    commit_timeout_ms: u64,
    #[serde(default = "default_sse_capacity")]
    sse_capacity: usize,
}

fn default_commit_timeout_ms() -> u64 {
    DEFAULT_COMMIT_TIMEOUT_MS
}

fn default_sse_capacity() -> usize {
    DEFAULT_SSE_CAPACITY
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            commit_timeout: Duration::from_millis(value.commit_timeout_ms.max(1)),
            sse_capacity: value.sse_capacity.max(1),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_keep_defaults() {
        let config = AppConfig::from_json(r#"{ "commit_timeout_ms": 2500 }"#).unwrap();
        assert_eq!(config.commit_timeout, Duration::from_millis(2500));
        assert_eq!(config.sse_capacity, DEFAULT_SSE_CAPACITY);

        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn zero_values_are_clamped() {
        let config =
            AppConfig::from_json(r#"{ "commit_timeout_ms": 0, "sse_capacity": 0 }"#).unwrap();
        assert_eq!(config.commit_timeout, Duration::from_millis(1));
        assert_eq!(config.sse_capacity, 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json("[1, 2]").is_err());
        assert!(AppConfig::from_json("[]").is_err());
        assert!(AppConfig::from_json("250").is_err());
        assert!(AppConfig::from_json("{ \"commit_timeout_ms\": ").is_err());
    }
}
