//! Submission state machine
//!
//! ```text
//!   idle --submit--> validating --ok--> submitting --2xx--> succeeded
//!    ^                   |                  |  ^
//!    +----invalid--------+                  |  | retry
//!    ^                                      v  |
//!    +--------------reset------------------ failed
//! ```
//!
//! One controller owns one form's `FormState`. It is cheap to clone; clones
//! share the same state, so a view and a background task can both hold it.
//! The lock around the state is never held across an `.await`; the only
//! suspension point is the transport call.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn, Instrument};

use super::adapter::SubmissionAdapter;
use super::errors::{SubmissionError, ValidationErrors};
use super::schema::FieldSchema;
use super::validator::{validate, FieldValues};
use crate::analytics::{AnalyticsEvent, AnalyticsSink};
use crate::metrics::metrics;
use crate::observability::{submission_span, CorrelationId};
use crate::structured_logging::SubmissionLogger;
use crate::transport::{LeadRequest, LeadTransport};

const TRANSITION_CHANNEL_CAPACITY: usize = 32;

/// Lifecycle phase of a form submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl Phase {
    /// A submission is in progress; new submits are ignored
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }

    pub fn accepts_submit(self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published on the controller's broadcast channel for every phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
}

/// View-facing snapshot of a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub values: FieldValues,
    /// Inline messages; only populated after a failed validation pass
    pub errors: BTreeMap<String, String>,
    pub phase: Phase,
    /// Display-safe failure text; never the server's response
    pub last_error: Option<String>,
}

/// Confirmation and failure text shown by a funnel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCopy {
    pub success: String,
    pub failure: String,
}

impl FormCopy {
    pub fn new(success: impl Into<String>, failure: impl Into<String>) -> Self {
        Self {
            success: success.into(),
            failure: failure.into(),
        }
    }
}

impl Default for FormCopy {
    fn default() -> Self {
        Self::new(
            "Thank you! We'll be in touch within 24 hours.",
            "Something went wrong. Please try again later.",
        )
    }
}

/// Everything a controller needs to know about its form
#[derive(Debug, Clone)]
pub struct FormConfig {
    pub schema: Arc<FieldSchema>,
    pub adapter: SubmissionAdapter,
    /// Source tag written into every payload
    pub source: String,
    pub copy: FormCopy,
}

impl FormConfig {
    pub fn new(schema: Arc<FieldSchema>, adapter: SubmissionAdapter, source: impl Into<String>) -> Self {
        Self {
            schema,
            adapter,
            source: source.into(),
            copy: FormCopy::default(),
        }
    }

    pub fn with_copy(mut self, copy: FormCopy) -> Self {
        self.copy = copy;
        self
    }
}

/// Result of a `submit()` or `retry()` call
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Call arrived in a phase that does not accept it; nothing changed
    Ignored,
    /// Validation failed; the form is back to idle with field errors
    Invalid(ValidationErrors),
    Succeeded { message: String },
    /// Network leg failed; `message` is the funnel's generic failure copy
    Failed { message: String },
    /// Response arrived after reset/unmount and was dropped
    Discarded,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

struct ControllerState {
    form: FormState,
    /// Bumped by reset/unmount; in-flight results from an older generation are dropped
    generation: u64,
    unmounted: bool,
    /// Last validated request, kept for retry
    pending: Option<LeadRequest>,
}

/// Armed across the transport await; if the future is dropped there the
/// form goes to `failed` instead of staying in `submitting`
struct InFlight<'a> {
    controller: &'a SubmissionController,
    generation: u64,
    logger: &'a SubmissionLogger,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.controller.abandon(self.generation, self.logger);
        }
    }
}

/// Drives one form through validation, submission and analytics
#[derive(Clone)]
pub struct SubmissionController {
    config: Arc<FormConfig>,
    transport: Arc<dyn LeadTransport>,
    analytics: Arc<dyn AnalyticsSink>,
    state: Arc<Mutex<ControllerState>>,
    transitions: broadcast::Sender<PhaseTransition>,
}

impl fmt::Debug for SubmissionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionController")
            .field("form_type", &self.form_type())
            .field("phase", &self.phase())
            .finish()
    }
}

impl SubmissionController {
    pub fn new(
        config: FormConfig,
        transport: Arc<dyn LeadTransport>,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        Self {
            config: Arc::new(config),
            transport,
            analytics,
            state: Arc::new(Mutex::new(ControllerState {
                form: FormState::default(),
                generation: 0,
                unmounted: false,
                pending: None,
            })),
            transitions,
        }
    }

    pub fn form_type(&self) -> &str {
        self.config.adapter.form_type()
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Snapshot of the current form state
    pub fn state(&self) -> FormState {
        self.state.lock().form.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().form.phase
    }

    pub fn is_unmounted(&self) -> bool {
        self.state.lock().unmounted
    }

    /// Receive every subsequent phase transition
    pub fn subscribe(&self) -> broadcast::Receiver<PhaseTransition> {
        self.transitions.subscribe()
    }

    /// Validate `raw` and, if it passes, post it
    ///
    /// Accepted from `idle` and `failed`. While a submission is in flight, or
    /// after success (until `reset()`), the call is ignored.
    pub async fn submit(&self, raw: FieldValues) -> SubmitOutcome {
        let (generation, request) = {
            let mut state = self.state.lock();
            if state.unmounted || !state.form.phase.accepts_submit() {
                debug!(form_type = %self.form_type(), phase = %state.form.phase, "Ignoring submit");
                return SubmitOutcome::Ignored;
            }

            let correlation_id = CorrelationId::new();
            state.form.values = raw;
            state.form.errors.clear();
            state.form.last_error = None;
            state.pending = None;
            self.set_phase(&mut state, Phase::Validating);

            let normalized = match validate(&self.config.schema, &state.form.values) {
                Ok(normalized) => normalized,
                Err(errors) => {
                    state.form.errors = errors.messages();
                    self.set_phase(&mut state, Phase::Idle);
                    metrics().validation_rejections.inc();
                    let fields: Vec<&str> = errors.keys().collect();
                    SubmissionLogger::new(correlation_id.as_str())
                        .log_validation_rejected(self.form_type(), &fields);
                    return SubmitOutcome::Invalid(errors);
                }
            };

            let payload = self.config.adapter.adapt(&normalized, &self.config.source);
            let request = LeadRequest {
                path: self.config.adapter.endpoint().to_string(),
                body: payload.to_json(),
                correlation_id,
            };
            state.pending = Some(request.clone());
            self.set_phase(&mut state, Phase::Submitting);
            (state.generation, request)
        };

        self.dispatch(generation, request, false).await
    }

    /// Re-send the last validated payload after a failure
    ///
    /// Skips validation; the values have not changed since they passed.
    pub async fn retry(&self) -> SubmitOutcome {
        let (generation, request) = {
            let mut state = self.state.lock();
            if state.unmounted || state.form.phase != Phase::Failed {
                debug!(form_type = %self.form_type(), phase = %state.form.phase, "Ignoring retry");
                return SubmitOutcome::Ignored;
            }
            let Some(request) = state.pending.clone() else {
                return SubmitOutcome::Ignored;
            };

            state.form.last_error = None;
            self.set_phase(&mut state, Phase::Submitting);
            metrics().retries_total.inc();
            (state.generation, request)
        };

        self.dispatch(generation, request, true).await
    }

    /// Back to a blank idle form; any in-flight result will be discarded
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if state.unmounted {
            return;
        }
        state.generation += 1;
        state.pending = None;
        state.form.values.clear();
        state.form.errors.clear();
        state.form.last_error = None;
        self.set_phase(&mut state, Phase::Idle);
    }

    /// The owning view is gone: drop late results and ignore further calls
    pub fn unmount(&self) {
        let mut state = self.state.lock();
        state.unmounted = true;
        state.generation += 1;
        state.pending = None;
    }

    /// One network attempt, then the terminal transition and its analytics event
    async fn dispatch(&self, generation: u64, request: LeadRequest, is_retry: bool) -> SubmitOutcome {
        let form_type = self.form_type();
        let logger = SubmissionLogger::new(request.correlation_id.as_str());
        let span = submission_span(form_type, &request.path, &request.correlation_id);

        logger.log_submit_attempt(form_type, &request.path, is_retry);
        metrics().submissions_total.inc();

        let started = Instant::now();
        let mut in_flight = InFlight {
            controller: self,
            generation,
            logger: &logger,
            settled: false,
        };
        let result = self.transport.post(&request).instrument(span).await;
        in_flight.settled = true;
        let elapsed = started.elapsed();
        metrics().submit_latency.observe(elapsed.as_secs_f64());
        let latency_ms = elapsed.as_millis() as u64;

        let result = match result {
            Ok(resp) if resp.is_success() => Ok(resp.status),
            Ok(resp) => Err(SubmissionError::Server {
                status: resp.status,
                body: resp.body,
            }),
            Err(e) => Err(e),
        };

        let succeeded = {
            let mut state = self.state.lock();
            if state.unmounted || state.generation != generation {
                metrics().results_discarded.inc();
                logger.log_result_discarded(form_type);
                return SubmitOutcome::Discarded;
            }

            match result {
                Ok(status) => {
                    state.form.errors.clear();
                    state.form.last_error = None;
                    state.pending = None;
                    self.set_phase(&mut state, Phase::Succeeded);
                    metrics().submissions_succeeded.inc();
                    logger.log_submit_success(form_type, status, latency_ms);
                    true
                }
                Err(e) => {
                    state.form.last_error = Some(self.config.copy.failure.clone());
                    self.set_phase(&mut state, Phase::Failed);
                    metrics().submissions_failed.inc();
                    let detail = match &e {
                        SubmissionError::Server { body, .. } => format!("{}: {}", e, body),
                        _ => e.to_string(),
                    };
                    logger.log_submit_failure(form_type, e.kind(), &detail, latency_ms);
                    false
                }
            }
        };

        if succeeded {
            self.emit(AnalyticsEvent::lead_submitted(form_type));
            SubmitOutcome::Succeeded {
                message: self.config.copy.success.clone(),
            }
        } else {
            self.emit(AnalyticsEvent::lead_submit_failed(form_type));
            SubmitOutcome::Failed {
                message: self.config.copy.failure.clone(),
            }
        }
    }

    /// The dispatch future was dropped mid-request; fail the form unless
    /// reset or unmount already moved it on
    fn abandon(&self, generation: u64, logger: &SubmissionLogger) {
        let form_type = self.form_type();
        {
            let mut state = self.state.lock();
            if state.unmounted
                || state.generation != generation
                || state.form.phase != Phase::Submitting
            {
                return;
            }
            state.form.last_error = Some(self.config.copy.failure.clone());
            self.set_phase(&mut state, Phase::Failed);
        }
        metrics().submissions_failed.inc();
        logger.log_submit_abandoned(form_type);
        self.emit(AnalyticsEvent::lead_submit_failed(form_type));
    }

    fn set_phase(&self, state: &mut ControllerState, to: Phase) {
        let from = state.form.phase;
        if from == to {
            return;
        }
        state.form.phase = to;
        debug!(form_type = %self.form_type(), from = %from, to = %to, "Form phase changed");
        // No subscribers is fine
        let _ = self.transitions.send(PhaseTransition { from, to });
    }

    /// Hand an event to the sink; errors and panics stop here
    fn emit(&self, event: AnalyticsEvent) {
        let action = event.action.clone();
        match catch_unwind(AssertUnwindSafe(|| self.analytics.track(event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(action = %action, error = %e, "Analytics event dropped"),
            Err(_) => warn!(action = %action, "Analytics sink panicked; event dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{MemorySink, ACTION_SUBMIT, ACTION_SUBMIT_ERROR};
    use crate::form::{FieldSpec, SubmissionAdapter};
    use crate::test_utils::{FailingSink, MockTransport, PanickingSink};
    use crate::transport::TransportResponse;
    use std::time::Duration;

    const RAW_SERVER_BODY: &str = "Internal Server Error: connection to 10.0.0.3:5432 refused";

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn valid_input() -> FieldValues {
        values(&[("name", "Jane Doe"), ("email", "jane@x.com")])
    }

    fn controller(transport: Arc<MockTransport>, sink: Arc<dyn AnalyticsSink>) -> SubmissionController {
        let schema = FieldSchema::new(vec![
            FieldSpec::text("name").required(),
            FieldSpec::email("email").required(),
        ])
        .unwrap();
        let config = FormConfig::new(
            Arc::new(schema),
            SubmissionAdapter::new("healthcare", "/api/leads"),
            "website",
        );
        SubmissionController::new(config, transport, sink)
    }

    fn drain(rx: &mut broadcast::Receiver<PhaseTransition>) -> Vec<Phase> {
        let mut phases = Vec::new();
        while let Ok(t) = rx.try_recv() {
            phases.push(t.to);
        }
        phases
    }

    async fn wait_for_calls(transport: &MockTransport, n: usize) {
        while transport.call_count() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_invalid_input_stays_idle() {
        let transport = Arc::new(MockTransport::new());
        let sink = Arc::new(MemorySink::new());
        let ctrl = controller(transport.clone(), sink.clone());
        let mut rx = ctrl.subscribe();

        let outcome = ctrl.submit(values(&[("name", ""), ("email", "bad")])).await;

        assert!(matches!(outcome, SubmitOutcome::Invalid(ref e) if e.len() == 2));
        let state = ctrl.state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.errors["name"], "required");
        assert_eq!(state.errors["email"], "invalid email");
        assert_eq!(drain(&mut rx), vec![Phase::Validating, Phase::Idle]);
        assert_eq!(transport.call_count(), 0);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let transport = Arc::new(MockTransport::new());
        let sink = Arc::new(MemorySink::new());
        let ctrl = controller(transport.clone(), sink.clone());
        let mut rx = ctrl.subscribe();

        let outcome = ctrl.submit(valid_input()).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Succeeded {
                message: FormCopy::default().success
            }
        );
        assert_eq!(
            drain(&mut rx),
            vec![Phase::Validating, Phase::Submitting, Phase::Succeeded]
        );
        assert_eq!(transport.call_count(), 1);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, ACTION_SUBMIT);
        assert_eq!(events[0].label, "healthcare");

        let request = &transport.requests()[0];
        assert_eq!(request.path, "/api/leads");
        assert_eq!(request.body["formType"], "healthcare");
        assert_eq!(request.body["source"], "website");
        assert_eq!(request.body["name"], "Jane Doe");

        let state = ctrl.state();
        assert!(state.errors.is_empty());
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_server_error_then_retry() {
        let transport = Arc::new(MockTransport::new());
        transport.push_status(500, RAW_SERVER_BODY);
        transport.push_status(200, "{}");
        let sink = Arc::new(MemorySink::new());
        let ctrl = controller(transport.clone(), sink.clone());
        let mut rx = ctrl.subscribe();

        let outcome = ctrl.submit(valid_input()).await;
        let failure = FormCopy::default().failure;
        assert_eq!(outcome, SubmitOutcome::Failed { message: failure.clone() });

        let state = ctrl.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.last_error.as_deref(), Some(failure.as_str()));
        assert!(!failure.contains(RAW_SERVER_BODY));
        assert_eq!(sink.count_action(ACTION_SUBMIT), 0);
        assert_eq!(sink.count_action(ACTION_SUBMIT_ERROR), 1);
        assert_eq!(
            drain(&mut rx),
            vec![Phase::Validating, Phase::Submitting, Phase::Failed]
        );

        let outcome = ctrl.retry().await;
        assert!(outcome.is_success());
        assert_eq!(transport.call_count(), 2);
        // Straight back to submitting, no validation pass
        assert_eq!(drain(&mut rx), vec![Phase::Submitting, Phase::Succeeded]);

        let requests = transport.requests();
        assert_eq!(requests[0].body, requests[1].body);
        assert_eq!(requests[0].correlation_id, requests[1].correlation_id);
        assert_eq!(sink.count_action(ACTION_SUBMIT), 1);
    }

    #[tokio::test]
    async fn test_transport_timeout_fails_with_generic_copy() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(Err(SubmissionError::Timeout { timeout_ms: 50 }));
        let sink = Arc::new(MemorySink::new());
        let ctrl = controller(transport.clone(), sink.clone());

        let outcome = ctrl.submit(valid_input()).await;

        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert_eq!(ctrl.state().last_error, Some(FormCopy::default().failure));
        assert_eq!(sink.count_action(ACTION_SUBMIT_ERROR), 1);
    }

    #[tokio::test]
    async fn test_reset_after_success() {
        let transport = Arc::new(MockTransport::new());
        let ctrl = controller(transport.clone(), Arc::new(MemorySink::new()));

        assert!(ctrl.submit(valid_input()).await.is_success());
        assert_eq!(ctrl.submit(valid_input()).await, SubmitOutcome::Ignored);

        ctrl.reset();
        let state = ctrl.state();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.values.is_empty());
        assert!(state.errors.is_empty());

        assert!(ctrl.submit(valid_input()).await.is_success());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_submit_while_submitting_is_noop() {
        let (transport, gate) = MockTransport::gated();
        let transport = Arc::new(transport);
        let sink = Arc::new(MemorySink::new());
        let ctrl = controller(transport.clone(), sink.clone());

        let first = tokio::spawn({
            let ctrl = ctrl.clone();
            async move { ctrl.submit(valid_input()).await }
        });
        wait_for_calls(&transport, 1).await;

        let before = ctrl.state();
        assert_eq!(before.phase, Phase::Submitting);
        assert_eq!(
            ctrl.submit(values(&[("name", "Other"), ("email", "o@x.com")])).await,
            SubmitOutcome::Ignored
        );
        assert_eq!(ctrl.retry().await, SubmitOutcome::Ignored);
        assert_eq!(ctrl.state(), before);

        gate.notify_one();
        assert!(first.await.unwrap().is_success());
        assert_eq!(transport.call_count(), 1);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_unmount_discards_late_result() {
        let (transport, gate) = MockTransport::gated();
        let transport = Arc::new(transport);
        let sink = Arc::new(MemorySink::new());
        let ctrl = controller(transport.clone(), sink.clone());

        let pending = tokio::spawn({
            let ctrl = ctrl.clone();
            async move { ctrl.submit(valid_input()).await }
        });
        wait_for_calls(&transport, 1).await;

        ctrl.unmount();
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), SubmitOutcome::Discarded);
        assert_eq!(ctrl.phase(), Phase::Submitting);
        assert!(sink.is_empty());
        assert_eq!(ctrl.submit(valid_input()).await, SubmitOutcome::Ignored);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_while_submitting_discards_result() {
        let (transport, gate) = MockTransport::gated();
        let transport = Arc::new(transport);
        let sink = Arc::new(MemorySink::new());
        let ctrl = controller(transport.clone(), sink.clone());

        let pending = tokio::spawn({
            let ctrl = ctrl.clone();
            async move { ctrl.submit(valid_input()).await }
        });
        wait_for_calls(&transport, 1).await;

        ctrl.reset();
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), SubmitOutcome::Discarded);
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_submit_future_fails_form() {
        let (transport, gate) = MockTransport::gated();
        let transport = Arc::new(transport);
        let sink = Arc::new(MemorySink::new());
        let ctrl = controller(transport.clone(), sink.clone());
        let mut rx = ctrl.subscribe();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), ctrl.submit(valid_input())).await;
        assert!(timed_out.is_err());

        let state = ctrl.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.last_error, Some(FormCopy::default().failure));
        assert_eq!(sink.count_action(ACTION_SUBMIT_ERROR), 1);
        assert_eq!(
            drain(&mut rx),
            vec![Phase::Validating, Phase::Submitting, Phase::Failed]
        );

        // The retained payload is still there for retry
        gate.notify_one();
        assert!(ctrl.retry().await.is_success());
        assert_eq!(transport.call_count(), 2);
        let requests = transport.requests();
        assert_eq!(requests[0].correlation_id, requests[1].correlation_id);
    }

    #[tokio::test]
    async fn test_aborted_submit_after_reset_stays_idle() {
        let (transport, _gate) = MockTransport::gated();
        let transport = Arc::new(transport);
        let sink = Arc::new(MemorySink::new());
        let ctrl = controller(transport.clone(), sink.clone());

        let pending = tokio::spawn({
            let ctrl = ctrl.clone();
            async move { ctrl.submit(valid_input()).await }
        });
        wait_for_calls(&transport, 1).await;

        ctrl.reset();
        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());

        assert_eq!(ctrl.phase(), Phase::Idle);
        assert!(ctrl.state().last_error.is_none());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_analytics_failures_are_swallowed() {
        let transport = Arc::new(MockTransport::new());
        let failing = controller(transport.clone(), Arc::new(FailingSink));
        assert!(failing.submit(valid_input()).await.is_success());
        assert_eq!(failing.phase(), Phase::Succeeded);

        let panicking = controller(transport.clone(), Arc::new(PanickingSink));
        transport.push_status(503, "unavailable");
        assert!(matches!(
            panicking.submit(valid_input()).await,
            SubmitOutcome::Failed { .. }
        ));
        assert_eq!(panicking.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_retry_requires_failed_phase() {
        let transport = Arc::new(MockTransport::new());
        let ctrl = controller(transport.clone(), Arc::new(MemorySink::new()));

        assert_eq!(ctrl.retry().await, SubmitOutcome::Ignored);
        assert!(ctrl.submit(valid_input()).await.is_success());
        assert_eq!(ctrl.retry().await, SubmitOutcome::Ignored);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resubmit_from_failed_revalidates() {
        let transport = Arc::new(MockTransport::new());
        transport.push_status(500, RAW_SERVER_BODY);
        let ctrl = controller(transport.clone(), Arc::new(MemorySink::new()));

        ctrl.submit(valid_input()).await;
        assert_eq!(ctrl.phase(), Phase::Failed);

        let outcome = ctrl.submit(values(&[("name", "Jane"), ("email", "")])).await;
        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        let state = ctrl.state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.errors["email"], "required");
        assert!(state.last_error.is_none());
        // Retained payload is gone; nothing to retry
        assert_eq!(ctrl.retry().await, SubmitOutcome::Ignored);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_custom_copy_is_used() {
        let transport = Arc::new(MockTransport::new());
        transport.push_status(502, RAW_SERVER_BODY);
        let schema = FieldSchema::new(vec![FieldSpec::email("email").required()]).unwrap();
        let config = FormConfig::new(
            Arc::new(schema),
            SubmissionAdapter::new("trades", "/api/leads"),
            "trades-landing",
        )
        .with_copy(FormCopy::new("Booked!", "Our scheduler is down, call us instead."));
        let ctrl = SubmissionController::new(config, transport.clone(), Arc::new(MemorySink::new()));

        let outcome = ctrl.submit(values(&[("email", "pro@plumb.co")])).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                message: "Our scheduler is down, call us instead.".to_string()
            }
        );
        transport.push_response(Ok(TransportResponse::new(201, "")));
        assert_eq!(
            ctrl.retry().await,
            SubmitOutcome::Succeeded {
                message: "Booked!".to_string()
            }
        );
    }
}
