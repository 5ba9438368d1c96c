use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::context::MAX_CONTEXT_RECORDS;
use crate::analysis::truncator::MAX_PAYLOAD_CHARS;
use crate::stats::MAX_TIMELINE_BUCKETS;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Environment variable {0} is not set")]
    MissingCredential(String),
}

/// Configuration for loglens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External analyzer configuration
    pub analyzer: AnalyzerConfig,
    /// Payload and aggregation bounds
    pub limits: LimitsConfig,
    /// Sample data source
    pub sample: SampleConfig,
    /// Output configuration
    pub output: OutputConfig,
}

/// External analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Base URL of the generative language API
    pub endpoint: String,
    /// Model name used for analysis and chat
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Payload and aggregation bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum characters of raw log text sent for analysis
    pub max_payload_chars: usize,
    /// Records included ahead of a chat question
    pub context_records: usize,
    /// Timeline buckets kept, earliest dropped first
    pub timeline_buckets: usize,
}

/// Sample data source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// URL of a JSON document of example records
    pub url: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format for stats: "console" or "json"
    pub format: String,
    /// Directory that exported reports are written to
    pub export_dir: PathBuf,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_seconds: 120,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_payload_chars: MAX_PAYLOAD_CHARS,
            context_records: MAX_CONTEXT_RECORDS,
            timeline_buckets: MAX_TIMELINE_BUCKETS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: "console".to_string(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::warn!("Config file {:?} not found, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Read the analyzer credential from the environment
    pub fn api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.analyzer.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential(self.analyzer.api_key_env.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loglens.toml");

        let mut config = Config::default();
        config.limits.context_records = 25;
        config.sample.url = Some("https://example.invalid/logs.json".to_string());
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.limits.context_records, 25);
        assert_eq!(loaded.limits.max_payload_chars, MAX_PAYLOAD_CHARS);
        assert_eq!(loaded.sample.url.as_deref(), Some("https://example.invalid/logs.json"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[analyzer]\nmodel = \"gemini-pro\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.analyzer.model, "gemini-pro");
        assert_eq!(config.analyzer.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.limits.timeline_buckets, MAX_TIMELINE_BUCKETS);
        assert_eq!(config.output.format, "console");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.limits.max_payload_chars, MAX_PAYLOAD_CHARS);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[limits\nmax_payload_chars = ").unwrap();
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_credential() {
        let mut config = Config::default();
        config.analyzer.api_key_env = "LOGLENS_TEST_UNSET_KEY_9F3A".to_string();
        match config.api_key() {
            Err(ConfigError::MissingCredential(name)) => assert_eq!(name, "LOGLENS_TEST_UNSET_KEY_9F3A"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
