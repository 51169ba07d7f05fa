//! Reader configuration, optionally loaded from a TOML file.
//!
//! The config file is optional. A missing or empty file yields
//! `Config::default()`; unknown keys are accepted and logged as warnings.
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the size limit.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Everything a [`FeedReader`](crate::feed::FeedReader) needs to know.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The reader copies this at setup; later edits do not affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absolute URL of the RSS feed.
    pub rss_url: String,

    /// Maximum number of articles returned (0 returns none).
    pub max_items: usize,

    /// Minimum preview image width in pixels (inclusive).
    pub min_image_width: u32,

    /// Minimum preview image height in pixels (inclusive).
    pub min_image_height: u32,

    /// Memoize results in memory, keyed by [`Config::cache_key`].
    pub use_cache: bool,

    /// Upper bound on one image probe, in seconds.
    pub probe_timeout_secs: u64,

    /// How long a cached result stays fresh, in hours.
    pub cache_ttl_hours: u64,

    /// Maximum number of feed results held in the in-memory cache.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rss_url: String::new(),
            max_items: 10,
            min_image_width: 200,
            min_image_height: 0,
            use_cache: true,
            probe_timeout_secs: 10,
            cache_ttl_hours: 24,
            cache_capacity: 64,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "rss_url",
        "max_items",
        "min_image_width",
        "min_image_height",
        "use_cache",
        "probe_timeout_secs",
        "cache_ttl_hours",
        "cache_capacity",
    ];

    /// Default settings reading from `rss_url`.
    pub fn new(rss_url: impl Into<String>) -> Self {
        Self {
            rss_url: rss_url.into(),
            ..Self::default()
        }
    }

    /// Cache key for this configuration.
    ///
    /// Identical configurations always produce the same key. Only the fields
    /// that change the result participate. The key always ends in exactly
    /// three numeric fields, so distinct configurations never collide even
    /// when the URL itself contains dashes and digits.
    pub fn cache_key(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.rss_url, self.max_items, self.min_image_width, self.min_image_height
        )
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.max(1).saturating_mul(3600))
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Refuse oversized files before reading them
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

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            rss_url = %config.rss_url,
            max_items = config.max_items,
            "Loaded configuration"
        );
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
