//! Configuration loader and validator for the catalog feed demo.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub feed: Feed,
    pub mock: Mock,
    #[serde(default)]
    pub retry: Retry,
}

/// Feed behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feed {
    /// Categories requested per page.
    pub page_size: usize,
    /// Where the recommendations section goes when it is first laid out.
    #[serde(default)]
    pub recommendation_index: Option<usize>,
    /// Rows from the end of the list at which the next page is requested.
    pub prefetch_threshold: usize,
}

/// Mock data source settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mock {
    pub latency_ms: u64,
    /// Pages served after the initial load.
    pub total_pages: u32,
    pub banners: usize,
    pub recommended_items: usize,
    pub subcategories_per_category: usize,
    pub items_per_subcategory: usize,
}

/// Retry policy for the initial load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Retry {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_ms: 200,
            max_backoff_ms: 5_000,
        }
    }
}

impl Retry {
    /// Delay before retrying after failed attempt number `attempt` (1-based):
    /// `backoff_ms * 2^(attempt - 1)`, capped at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let ms = self.backoff_ms.saturating_mul(1 << shift);
        Duration::from_millis(ms.min(self.max_backoff_ms))
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.feed.page_size == 0 {
        return Err(ConfigError::Invalid("feed.page_size must be > 0"));
    }
    if cfg.mock.subcategories_per_category == 0 {
        return Err(ConfigError::Invalid("mock.subcategories_per_category must be > 0"));
    }
    if cfg.mock.items_per_subcategory == 0 {
        return Err(ConfigError::Invalid("mock.items_per_subcategory must be > 0"));
    }
    if cfg.mock.latency_ms > 60_000 {
        return Err(ConfigError::Invalid("mock.latency_ms must be <= 60000"));
    }
    if cfg.retry.max_attempts == 0 {
        return Err(ConfigError::Invalid("retry.max_attempts must be > 0"));
    }
    if cfg.retry.backoff_ms > cfg.retry.max_backoff_ms {
        return Err(ConfigError::Invalid("retry.backoff_ms must be <= retry.max_backoff_ms"));
    }
    Ok(())
}

pub fn example() -> &'static str {
    r#"feed:
  page_size: 2
  recommendation_index: 2
  prefetch_threshold: 3

mock:
  latency_ms: 100
  total_pages: 3
  banners: 3
  recommended_items: 6
  subcategories_per_category: 2
  items_per_subcategory: 3

retry:
  max_attempts: 5
  backoff_ms: 200
  max_backoff_ms: 5000
"#
}
