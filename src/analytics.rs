//! Fire-and-forget analytics events
//!
//! Analytics is best-effort telemetry. Sinks may fail; the submission
//! controller swallows every error (and panic) a sink produces so that the
//! form's phase never depends on it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{AnalyticsConfig, AnalyticsMode};

pub const CATEGORY_LEAD_GENERATION: &str = "lead_generation";
pub const ACTION_SUBMIT: &str = "submit";
pub const ACTION_SUBMIT_ERROR: &str = "submit_error";

/// One analytics hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub category: String,
    pub action: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl AnalyticsEvent {
    pub fn new(
        category: impl Into<String>,
        action: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: label.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Emitted when a lead is accepted by the backend
    pub fn lead_submitted(form_type: &str) -> Self {
        Self::new(CATEGORY_LEAD_GENERATION, ACTION_SUBMIT, form_type)
    }

    /// Emitted when a lead POST fails
    pub fn lead_submit_failed(form_type: &str) -> Self {
        Self::new(CATEGORY_LEAD_GENERATION, ACTION_SUBMIT_ERROR, form_type)
    }
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// HTTP sink used outside a tokio runtime
    #[error("No async runtime available to deliver analytics event")]
    NoRuntime,

    #[error("Analytics sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for analytics events
///
/// `track` must not block; sinks that do I/O hand the work off.
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError>;
}

/// Logs events as structured tracing records
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn track(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        info!(
            category = %event.category,
            action = %event.action,
            label = %event.label,
            value = ?event.value,
            "Analytics event"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn track(&self, _event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        Ok(())
    }
}

/// Keeps every event in memory (tests, dry runs)
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }

    pub fn count_action(&self, action: &str) -> usize {
        self.events.lock().iter().filter(|e| e.action == action).count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl AnalyticsSink for MemorySink {
    fn track(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        self.events.lock().push(event);
        Ok(())
    }
}

/// POSTs each event to a collector on a spawned task
///
/// Every POST is bounded by the client timeout, so a stalled collector
/// cannot pile up delivery tasks.
pub struct HttpAnalyticsSink {
    http: reqwest::Client,
    collector_url: String,
    timeout: Duration,
}

impl HttpAnalyticsSink {
    pub fn new(collector_url: impl Into<String>, timeout: Duration) -> Result<Self, AnalyticsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalyticsError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            collector_url: collector_url.into(),
            timeout,
        })
    }

    pub fn collector_url(&self) -> &str {
        &self.collector_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl AnalyticsSink for HttpAnalyticsSink {
    fn track(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| AnalyticsError::NoRuntime)?;
        let request = self.http.post(&self.collector_url).json(&event);

        handle.spawn(async move {
            match request.send().await {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => debug!(status = %resp.status(), "Analytics collector rejected event"),
                Err(e) => debug!(error = %e, "Analytics delivery failed"),
            }
        });

        Ok(())
    }
}

/// Build the sink selected by configuration
pub fn sink_from_config(config: &AnalyticsConfig) -> Result<Arc<dyn AnalyticsSink>, AnalyticsError> {
    match config.mode {
        AnalyticsMode::Tracing => Ok(Arc::new(TracingSink)),
        AnalyticsMode::Disabled => Ok(Arc::new(NoopSink)),
        AnalyticsMode::Http => {
            let url = config.collector_url.as_deref().ok_or_else(|| {
                AnalyticsError::Unavailable("collector_url not configured".to_string())
            })?;
            Ok(Arc::new(HttpAnalyticsSink::new(url, config.timeout())?))
        }
    }
}
