//! Configuration file support
//!
//! Settings are read from an optional TOML file. Every key has a default, so
//! an empty file (or no file at all) yields a working configuration.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default base URL of the per-project release history feed
pub const DEFAULT_RELEASE_HISTORY_URL: &str = "https://updates.drupal.org/release-history/";

/// Default base URL of the paginated project listing
pub const DEFAULT_LISTING_URL: &str = "https://www.drupal.org/api-d7/";

/// Default number of in-flight requests
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub sources: SourcesConfig,
    pub fetch: FetchConfig,
    pub descriptor: DescriptorConfig,
}

/// Transport settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Floor applied to `Retry-After` values the upstream reports as zero
    pub min_retry_after_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            min_retry_after_secs: 30,
            user_agent: concat!("coregate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_retry_after(&self) -> Duration {
        Duration::from_secs(self.min_retry_after_secs)
    }
}

/// Upstream endpoints
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub release_history_url: String,
    pub listing_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            release_history_url: DEFAULT_RELEASE_HISTORY_URL.to_string(),
            listing_url: DEFAULT_LISTING_URL.to_string(),
        }
    }
}

/// Worker pool settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Metadata of the generated conflict descriptor package
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DescriptorConfig {
    pub name: String,
    pub description: Option<String>,
    pub license: String,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            name: "coregate/conflicts".to_string(),
            description: None,
            license: "MIT".to_string(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject values the fetch layer cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "fetch.concurrency",
                message: "must be at least 1".to_string(),
            });
        }
        for (key, value) in [
            ("sources.release_history_url", &self.sources.release_history_url),
            ("sources.listing_url", &self.sources.listing_url),
        ] {
            let url = url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
                key,
                message: format!("'{}': {}", value, e),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidValue {
                    key,
                    message: format!("'{}' is not an http(s) URL", value),
                });
            }
        }
        if self.descriptor.name.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "descriptor.name",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
