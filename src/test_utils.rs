//! Test Utilities Module
//!
//! Scripted transports and misbehaving analytics sinks for driving the
//! submission controller deterministically, without a network.
//!
//! Only compiled when running tests or when the `test_utils` feature is
//! enabled.

#![cfg(any(test, feature = "test_utils"))]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::analytics::{AnalyticsError, AnalyticsEvent, AnalyticsSink};
use crate::form::SubmissionError;
use crate::transport::{LeadRequest, LeadTransport, TransportResponse};

/// Transport that replays queued responses and records every request
///
/// When the queue is empty it answers `200 {"ok":true}`.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, SubmissionError>>>,
    requests: Mutex<Vec<LeadRequest>>,
    gate: Option<Arc<Notify>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose calls block until the returned `Notify` is signalled
    /// once per call; lets a test observe the `submitting` phase
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let transport = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (transport, gate)
    }

    pub fn push_response(&self, response: Result<TransportResponse, SubmissionError>) {
        self.responses.lock().push_back(response);
    }

    pub fn push_status(&self, status: u16, body: &str) {
        self.push_response(Ok(TransportResponse::new(status, body)));
    }

    pub fn requests(&self) -> Vec<LeadRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LeadTransport for MockTransport {
    async fn post(&self, request: &LeadRequest) -> Result<TransportResponse, SubmissionError> {
        self.requests.lock().push(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let next = self.responses.lock().pop_front();
        next.unwrap_or_else(|| Ok(TransportResponse::new(200, r#"{"ok":true}"#)))
    }
}

/// Sink that rejects every event
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSink;

impl AnalyticsSink for FailingSink {
    fn track(&self, _event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        Err(AnalyticsError::Unavailable("blocked by client".to_string()))
    }
}

/// Sink that panics on every event
#[derive(Debug, Default, Clone, Copy)]
pub struct PanickingSink;

impl AnalyticsSink for PanickingSink {
    fn track(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        panic!("analytics sink exploded on {}", event.action);
    }
}
