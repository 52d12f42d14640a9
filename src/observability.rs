//! Correlation ids and tracing spans for lead submissions

use serde::{Deserialize, Serialize};
use tracing::Span;
use uuid::Uuid;

/// Identifies one submission across logs, the backend and retries
///
/// A fresh id is minted for every accepted `submit()`; `retry()` reuses it so
/// the backend can correlate repeated attempts for the same lead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 chars; enough to eyeball in logs
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Span wrapping one network attempt of a submission
pub fn submission_span(form_type: &str, endpoint: &str, correlation_id: &CorrelationId) -> Span {
    tracing::info_span!(
        "lead_submission",
        form_type = %form_type,
        endpoint = %endpoint,
        correlation_id = %correlation_id.short(),
    )
}
