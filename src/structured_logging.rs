//! Structured log events for the submission lifecycle

/// Emits the submission pipeline's log events tagged with one context id
#[derive(Debug, Clone)]
pub struct SubmissionLogger {
    context_id: String,
}

impl SubmissionLogger {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
        }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn log_submit_attempt(&self, form_type: &str, endpoint: &str, is_retry: bool) {
        tracing::info!(
            context_id = %self.context_id,
            form_type = %form_type,
            endpoint = %endpoint,
            is_retry = %is_retry,
            "Submitting lead"
        );
    }

    pub fn log_validation_rejected(&self, form_type: &str, fields: &[&str]) {
        tracing::debug!(
            context_id = %self.context_id,
            form_type = %form_type,
            fields = ?fields,
            "Lead form failed validation"
        );
    }

    pub fn log_submit_success(&self, form_type: &str, status: u16, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            form_type = %form_type,
            status = %status,
            latency_ms = %latency_ms,
            "Lead submitted"
        );
    }

    /// `error` is the internal description; it may include server detail
    /// and must never be forwarded to the view
    pub fn log_submit_failure(&self, form_type: &str, kind: &str, error: &str, latency_ms: u64) {
        tracing::warn!(
            context_id = %self.context_id,
            form_type = %form_type,
            kind = %kind,
            error = %error,
            latency_ms = %latency_ms,
            "Lead submission failed"
        );
    }

    pub fn log_submit_abandoned(&self, form_type: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            form_type = %form_type,
            "Lead submission dropped before the backend answered"
        );
    }

    pub fn log_result_discarded(&self, form_type: &str) {
        tracing::debug!(
            context_id = %self.context_id,
            form_type = %form_type,
            "Discarding late submission result"
        );
    }
}
