// Lead-form pipeline components
pub mod schema;               // FieldSchema, FieldSpec, FieldKind, ValidationRule
pub mod validator;            // pure validate(schema, values) -> NormalizedValues | ValidationErrors
pub mod adapter;              // SubmissionAdapter mapping table + SubmissionPayload
pub mod controller;           // SubmissionController phase state machine
pub mod errors;               // SchemaError, FieldError, ValidationErrors, SubmissionError

// Re-export commonly used types
pub use schema::{FieldKind, FieldSchema, FieldSpec, ValidationRule, RESERVED_KEYS};
pub use validator::{validate, FieldValues, NormalizedValues};
pub use adapter::{build_payload, SubmissionAdapter, SubmissionPayload};
pub use controller::{
    FormConfig, FormCopy, FormState, Phase, PhaseTransition, SubmissionController, SubmitOutcome,
};
pub use errors::{FieldError, SchemaError, SubmissionError, ValidationErrors};
