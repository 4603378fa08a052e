//! Configuration file parser for ~/.config/feedset/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::FetchPolicy;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Largest feed body accepted, in bytes.
    pub max_feed_bytes: usize,

    /// Retries for rate limiting, server errors and truncated bodies.
    pub max_retries: u32,

    /// First retry delay in milliseconds; doubles on every retry.
    pub retry_base_delay_ms: u64,

    /// Allow feed URLs on localhost and private networks.
    pub allow_private_hosts: bool,

    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// Named feed sources. Values must be strings (markup or URL); anything
    /// else is rejected when the source is opened.
    pub feeds: toml::Table,
}

impl Default for Config {
    fn default() -> Self {
        let policy = FetchPolicy::default();
        Self {
            timeout_secs: policy.timeout.as_secs(),
            max_feed_bytes: policy.max_bytes,
            max_retries: policy.max_retries,
            retry_base_delay_ms: policy.retry_base_delay.as_millis() as u64,
            allow_private_hosts: policy.allow_private_hosts,
            user_agent: policy.user_agent,
            feeds: toml::Table::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "timeout_secs",
        "max_feed_bytes",
        "max_retries",
        "retry_base_delay_ms",
        "allow_private_hosts",
        "user_agent",
        "feeds",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to avoid loading a corrupted multi-megabyte file
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            feeds = config.feeds.len(),
            allow_private_hosts = config.allow_private_hosts,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Fetch limits derived from this configuration.
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            max_bytes: self.max_feed_bytes,
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
            allow_private_hosts: self.allow_private_hosts,
            user_agent: self.user_agent.clone(),
        }
    }

    /// Looks up a named feed source.
    pub fn feed_source(&self, name: &str) -> Option<&toml::Value> {
        self.feeds.get(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("feedset_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_feed_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay_ms, 2000);
        assert!(!config.allow_private_hosts);
        assert!(config.user_agent.starts_with("feedset/"));
        assert!(config.feeds.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedset_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = temp_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_retries, 3);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::from_toml("timeout_secs = 5\n").unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_retries, 3); // default
        assert!(!config.allow_private_hosts); // default
    }

    #[test]
    fn test_full_config_and_policy() {
        let content = r#"
timeout_secs = 10
max_feed_bytes = 4096
max_retries = 1
retry_base_delay_ms = 250
allow_private_hosts = true
user_agent = "tester/1.0"

[feeds]
news = "https://example.com/news.atom"
broken = 42
"#;
        let path = temp_config("full", content);
        let config = Config::load(&path).unwrap();

        let policy = config.fetch_policy();
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.max_bytes, 4096);
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.retry_base_delay, Duration::from_millis(250));
        assert!(policy.allow_private_hosts);
        assert_eq!(policy.user_agent, "tester/1.0");

        assert_eq!(
            config.feed_source("news").and_then(|v| v.as_str()),
            Some("https://example.com/news.atom")
        );
        assert_eq!(config.feed_source("broken").map(|v| v.type_str()), Some("integer"));
        assert!(config.feed_source("missing").is_none());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::from_toml("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::from_toml("max_retries = 2\ntotally_fake_key = \"x\"\n").unwrap();
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::from_toml("timeout_secs = \"soon\"\n").is_err());
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = temp_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
