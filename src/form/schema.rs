//! Declarative form field schemas
//!
//! A `FieldSchema` is built once per form and shared (behind an `Arc`) by the
//! validator, the view and the controller. Field order is preserved so views
//! can render fields in declaration order.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use super::errors::{FieldError, SchemaError};

/// Payload keys the adapter writes itself; no field may use them
pub const RESERVED_KEYS: [&str; 2] = ["formType", "source"];

/// Semantic type of a form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    LongText,
    Choice(Vec<String>),
    /// Filled in by the page (UTM tags, referrer...), never typed by a visitor
    Hidden,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
            Self::LongText => write!(f, "long text"),
            Self::Choice(options) => write!(f, "choice [{}]", options.join(" | ")),
            Self::Hidden => write!(f, "hidden"),
        }
    }
}

/// Extra rule checked after the kind-specific check passes
#[derive(Debug, Clone)]
pub enum ValidationRule {
    Pattern { regex: Regex, message: String },
    MinLength(usize),
    MaxLength(usize),
}

impl ValidationRule {
    /// Compile a pattern rule; the whole value must match
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self, SchemaError> {
        let anchored = format!("^(?:{})$", pattern);
        Ok(Self::Pattern {
            regex: Regex::new(&anchored)?,
            message: message.into(),
        })
    }

    pub(crate) fn check(&self, value: &str) -> Result<(), FieldError> {
        match self {
            Self::Pattern { regex, message } => {
                if regex.is_match(value) {
                    Ok(())
                } else {
                    Err(FieldError::Pattern(message.clone()))
                }
            }
            // Lengths count characters, not bytes
            Self::MinLength(min) if value.chars().count() < *min => {
                Err(FieldError::TooShort { min: *min })
            }
            Self::MaxLength(max) if value.chars().count() > *max => {
                Err(FieldError::TooLong { max: *max })
            }
            Self::MinLength(_) | Self::MaxLength(_) => Ok(()),
        }
    }
}

/// One input of a lead form
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub key: String,
    pub kind: FieldKind,
    pub required: bool,
    pub rule: Option<ValidationRule>,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            required: false,
            rule: None,
        }
    }

    pub fn text(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Text)
    }

    pub fn email(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Email)
    }

    pub fn phone(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Phone)
    }

    pub fn long_text(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::LongText)
    }

    pub fn choice<S: AsRef<str>>(key: impl Into<String>, options: &[S]) -> Self {
        let options = options.iter().map(|o| o.as_ref().to_string()).collect();
        Self::new(key, FieldKind::Choice(options))
    }

    pub fn hidden(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Hidden)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rule = Some(rule);
        self
    }
}

/// Ordered, immutable set of fields for one form
#[derive(Debug, Clone)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Build a schema, rejecting empty, duplicate or reserved keys and
    /// choice fields without options
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::with_capacity(fields.len());

        for field in &fields {
            if field.key.trim().is_empty() {
                return Err(SchemaError::EmptyKey);
            }
            if RESERVED_KEYS.contains(&field.key.as_str()) {
                return Err(SchemaError::ReservedKey(field.key.clone()));
            }
            if !seen.insert(field.key.as_str()) {
                return Err(SchemaError::DuplicateKey(field.key.clone()));
            }
            if let FieldKind::Choice(options) = &field.kind {
                if options.is_empty() {
                    return Err(SchemaError::EmptyChoice(field.key.clone()));
                }
            }
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
