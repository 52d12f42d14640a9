//! Configuration for the lead pipeline
//!
//! Loaded from a TOML file, with environment variable overrides applied on
//! top. Every field has a default so an empty file is a valid configuration.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::form::FormCopy;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Analytics sink selection
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Source tag attached to every payload (site or deployment name)
    #[serde(default = "default_source")]
    pub source: String,

    /// Per-funnel copy overrides, keyed by form type tag
    #[serde(default)]
    pub copy: BTreeMap<String, CopyOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the funnel endpoint paths are joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent header for lead POSTs
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsMode {
    /// Log events through tracing (default)
    Tracing,
    /// POST events to a collector endpoint
    Http,
    /// Drop events
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_analytics_mode")]
    pub mode: AnalyticsMode,

    /// Collector URL, required in `http` mode
    #[serde(default)]
    pub collector_url: Option<String>,

    /// Timeout for each collector POST in milliseconds
    #[serde(default = "default_analytics_timeout_ms")]
    pub timeout_ms: u64,
}

/// Optional replacement for a funnel's success/failure copy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyOverride {
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub failure: Option<String>,
}

// Default value functions
fn default_source() -> String { "website".to_string() }
fn default_base_url() -> String { "http://localhost:3000".to_string() }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_user_agent() -> String { format!("fusion-leads/{}", env!("CARGO_PKG_VERSION")) }
fn default_analytics_mode() -> AnalyticsMode { AnalyticsMode::Tracing }
fn default_analytics_timeout_ms() -> u64 { 5_000 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            mode: default_analytics_mode(),
            collector_url: None,
            timeout_ms: default_analytics_timeout_ms(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            analytics: AnalyticsConfig::default(),
            source: default_source(),
            copy: BTreeMap::new(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AnalyticsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl PipelineConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(contents).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` (if any), the TOML file, then environment overrides
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.from_env()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn with_env_overrides() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.from_env()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn from_env(&mut self) -> Result<()> {
        if let Ok(base_url) = std::env::var("FUSION_API_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("FUSION_API_TIMEOUT_MS") {
            self.api.timeout_ms = timeout
                .parse()
                .map_err(|e| anyhow!("Invalid FUSION_API_TIMEOUT_MS: {}", e))?;
        }

        if let Ok(source) = std::env::var("FUSION_SOURCE") {
            self.source = source;
        }

        if let Ok(mode) = std::env::var("FUSION_ANALYTICS_MODE") {
            self.analytics.mode = match mode.to_ascii_lowercase().as_str() {
                "tracing" => AnalyticsMode::Tracing,
                "http" => AnalyticsMode::Http,
                "disabled" => AnalyticsMode::Disabled,
                other => return Err(anyhow!("Invalid FUSION_ANALYTICS_MODE: {}", other)),
            };
        }

        if let Ok(url) = std::env::var("FUSION_ANALYTICS_URL") {
            self.analytics.collector_url = Some(url);
        }

        self.validate()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(anyhow!("api.base_url must not be empty"));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(anyhow!("api.base_url must be an http(s) URL"));
        }
        if self.api.timeout_ms == 0 {
            return Err(anyhow!("api.timeout_ms must be > 0"));
        }
        if self.analytics.timeout_ms == 0 {
            return Err(anyhow!("analytics.timeout_ms must be > 0"));
        }
        if self.source.trim().is_empty() {
            return Err(anyhow!("source must not be empty"));
        }
        if self.analytics.mode == AnalyticsMode::Http
            && self
                .analytics
                .collector_url
                .as_deref()
                .map_or(true, |u| u.trim().is_empty())
        {
            return Err(anyhow!("analytics.collector_url is required in http mode"));
        }
        Ok(())
    }

    /// Funnel copy with any configured override applied
    pub fn copy_for(&self, form_type: &str, default: FormCopy) -> FormCopy {
        match self.copy.get(form_type) {
            Some(o) => FormCopy {
                success: o.success.clone().unwrap_or(default.success),
                failure: o.failure.clone().unwrap_or(default.failure),
            },
            None => default,
        }
    }
}
