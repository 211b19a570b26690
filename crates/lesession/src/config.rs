// Engine Configuration
//
// *La Configuration* (The Configuration) - Tuning knobs for the session search engine

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".lesession/config.toml";

/// Default number of most recent messages kept per session
pub const DEFAULT_MAX_INDEX_SIZE: usize = 10_000;

/// Default cached result lifetime in seconds (5 minutes)
pub const DEFAULT_CACHE_TIMEOUT_SECS: u64 = 300;

/// Default background cache sweep period in seconds
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Default fuzzy tolerance for search (0 = exact, 1 = anything)
pub const DEFAULT_SEARCH_THRESHOLD: f64 = 0.4;

/// Default fuzzy tolerance for suggestions
pub const DEFAULT_SUGGESTION_THRESHOLD: f64 = 0.6;

/// Default characters of context on each side of a highlight
pub const DEFAULT_SNIPPET_CONTEXT_CHARS: usize = 50;

/// Session search engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum messages indexed per session (oldest dropped first)
    pub max_index_size: usize,

    /// Lifetime of a cached search result in seconds
    pub cache_timeout_secs: u64,

    /// Whether search results are memoized
    pub enable_cache: bool,

    /// Default for `SearchOptions::enable_highlighting`
    pub enable_highlighting: bool,

    /// Period of the background cache sweep in seconds
    pub cleanup_interval_secs: u64,

    /// Fuzzy tolerance used by search
    pub search_threshold: f64,

    /// Fuzzy tolerance used by suggestions
    pub suggestion_threshold: f64,

    /// Characters of context kept before and after each highlight
    pub snippet_context_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_index_size: DEFAULT_MAX_INDEX_SIZE,
            cache_timeout_secs: DEFAULT_CACHE_TIMEOUT_SECS,
            enable_cache: true,
            enable_highlighting: true,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            search_threshold: DEFAULT_SEARCH_THRESHOLD,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
            snippet_context_chars: DEFAULT_SNIPPET_CONTEXT_CHARS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the default configuration. Fields absent from
    /// the file keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::validation(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            Error::validation(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables on top of this configuration
    ///
    /// Environment variables:
    /// - `LESESSION_MAX_INDEX_SIZE`
    /// - `LESESSION_CACHE_TIMEOUT_SECS`
    /// - `LESESSION_ENABLE_CACHE`
    /// - `LESESSION_ENABLE_HIGHLIGHTING`
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Some(size) = env_parse("LESESSION_MAX_INDEX_SIZE") {
            self.max_index_size = size;
        }
        if let Some(secs) = env_parse("LESESSION_CACHE_TIMEOUT_SECS") {
            self.cache_timeout_secs = secs;
        }
        if let Some(enabled) = env_parse("LESESSION_ENABLE_CACHE") {
            self.enable_cache = enabled;
        }
        if let Some(enabled) = env_parse("LESESSION_ENABLE_HIGHLIGHTING") {
            self.enable_highlighting = enabled;
        }
        self
    }

    /// Default configuration with environment overrides applied
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_index_size == 0 {
            return Err(Error::validation("max_index_size must be greater than zero"));
        }

        if self.cache_timeout_secs == 0 {
            return Err(Error::validation("cache_timeout_secs must be greater than zero"));
        }

        if self.cleanup_interval_secs == 0 {
            return Err(Error::validation(
                "cleanup_interval_secs must be greater than zero",
            ));
        }

        for (name, value) in [
            ("search_threshold", self.search_threshold),
            ("suggestion_threshold", self.suggestion_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::validation(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Cached result lifetime
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_secs)
    }

    /// Background sweep period
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
