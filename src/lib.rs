//! Fusion Leads - lead-capture pipeline for the Fusion Data Co funnels
//!
//! Every funnel page (healthcare, trades, small business, ...) ends in a lead
//! form. This library is the shared pipeline behind those forms:
//!
//! - **Schema & validation**: declarative `FieldSchema` + pure `validate`
//! - **Payload mapping**: per-funnel `SubmissionAdapter` tables
//! - **Submission**: `SubmissionController` phase state machine over a
//!   pluggable `LeadTransport`
//! - **Analytics**: fire-and-forget `AnalyticsSink` events on terminal phases

pub mod analytics;
pub mod config;
pub mod form;
pub mod funnels;
pub mod metrics;
pub mod observability;
pub mod structured_logging;
pub mod transport;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use analytics::{AnalyticsEvent, AnalyticsSink, MemorySink, TracingSink};
pub use config::PipelineConfig;
pub use form::{
    validate, FieldSchema, FieldSpec, FieldValues, FormState, Phase, SubmissionController,
    SubmitOutcome,
};
pub use funnels::{Funnel, FunnelDefinition};
pub use transport::{HttpTransport, LeadTransport};
