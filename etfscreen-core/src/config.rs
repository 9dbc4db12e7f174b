//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file) reproduces the
//! stock behaviour: all twelve tabs, 2235 rows per page, positional merge,
//! bounded exponential backoff.

use crate::error::ScreenerError;
use crate::source::{RetryPolicy, DEFAULT_ENDPOINT};
use crate::table::{CleanOptions, MergeKey};
use crate::tab::Tab;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PER_PAGE: u32 = 2235;
pub const DEFAULT_ONLY: &str = "data";

/// What to fetch and how to merge it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerRequest {
    pub per_page: u32,
    /// Selection mode forwarded verbatim (`data` or `meta`).
    pub only: String,
    pub tabs: Vec<Tab>,
    pub merge_key: MergeKey,
}

impl Default for ScreenerRequest {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            only: DEFAULT_ONLY.to_string(),
            tabs: Tab::ALL.to_vec(),
            merge_key: MergeKey::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per tab; ignored when `unbounded` is set.
    pub max_attempts: u32,
    /// Retry forever, with no attempt cap.
    pub unbounded: bool,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts.unwrap_or(8),
            unbounded: false,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            jitter: policy.jitter,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: (!self.unbounded).then_some(self.max_attempts),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub endpoint: String,
    pub per_page: u32,
    pub only: String,
    pub tabs: Vec<Tab>,
    pub merge_key: MergeKey,
    pub retry: RetryConfig,
    pub clean: CleanOptions,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        let request = ScreenerRequest::default();
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            per_page: request.per_page,
            only: request.only,
            tabs: request.tabs,
            merge_key: request.merge_key,
            retry: RetryConfig::default(),
            clean: CleanOptions::default(),
        }
    }
}

impl ScreenerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ScreenerError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ScreenerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ScreenerError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScreenerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ScreenerError> {
        if self.tabs.is_empty() {
            return Err(ScreenerError::Config("at least one tab is required".into()));
        }
        if self.per_page == 0 {
            return Err(ScreenerError::Config("per_page must be positive".into()));
        }
        if !self.retry.unbounded && self.retry.max_attempts == 0 {
            return Err(ScreenerError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(ScreenerError::Config(
                "retry.jitter must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }

    pub fn request(&self) -> ScreenerRequest {
        ScreenerRequest {
            per_page: self.per_page,
            only: self.only.clone(),
            tabs: self.tabs.clone(),
            merge_key: self.merge_key,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }
}
