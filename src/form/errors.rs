//! Error types for the lead-form pipeline
//!
//! Three families live here:
//! - `SchemaError`: a form definition is malformed (caught at construction)
//! - `FieldError` / `ValidationErrors`: user-correctable input problems
//! - `SubmissionError`: the network leg failed (transport, timeout, non-2xx)
//!
//! Only `ValidationErrors` is ever shown to the visitor verbatim. Submission
//! failures reach the view as the funnel's generic failure copy.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Errors raised while building a `FieldSchema`
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Field keys must be non-empty
    #[error("Field key must not be empty")]
    EmptyKey,

    /// Two fields share the same key
    #[error("Duplicate field key: {0}")]
    DuplicateKey(String),

    /// Key collides with a payload key owned by the adapter
    #[error("Field key '{0}' is reserved for the submission payload")]
    ReservedKey(String),

    /// A choice field was declared without any options
    #[error("Choice field '{0}' has no options")]
    EmptyChoice(String),

    /// A pattern rule did not compile
    #[error("Invalid validation pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A single field's validation failure
///
/// `Display` renders the short message the view shows inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required,
    InvalidEmail,
    InvalidPhone,
    InvalidSelection,
    TooShort { min: usize },
    TooLong { max: usize },
    /// Custom pattern rule failed; carries the rule's message
    Pattern(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::InvalidEmail => write!(f, "invalid email"),
            Self::InvalidPhone => write!(f, "invalid phone"),
            Self::InvalidSelection => write!(f, "invalid selection"),
            Self::TooShort { .. } => write!(f, "too short"),
            Self::TooLong { .. } => write!(f, "too long"),
            Self::Pattern(message) => write!(f, "{}", message),
        }
    }
}

/// Field-level errors from one validation pass, keyed by field key
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("Validation failed for {} field(s)", .0.len())]
pub struct ValidationErrors(BTreeMap<String, FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, error: FieldError) {
        self.0.insert(key.into(), error);
    }

    pub fn get(&self, key: &str) -> Option<&FieldError> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render every error as its inline display message
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(key, error)| (key.clone(), error.to_string()))
            .collect()
    }
}

/// Failure of the network leg of a submission
///
/// The full error (including any server body) is for logs only. Views get
/// the funnel's failure copy instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Network unreachable, connection reset, TLS failure...
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured client timeout
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Backend answered with a non-2xx status
    #[error("Server responded with status {status}")]
    Server { status: u16, body: String },

    /// Client could not be constructed from configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SubmissionError {
    /// Whether a user-initiated retry has a reasonable chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Server { status, .. } => *status >= 500 || *status == 429,
            Self::Configuration(_) => false,
        }
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout { .. } => "timeout",
            Self::Server { .. } => "server",
            Self::Configuration(_) => "configuration",
        }
    }
}
