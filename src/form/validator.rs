//! Pure schema validation
//!
//! `validate` never touches the network or any view state; identical inputs
//! always produce identical outputs.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::{FieldError, ValidationErrors};
use super::schema::{FieldKind, FieldSchema, FieldSpec};

/// Raw key -> value map as typed by the visitor
pub type FieldValues = BTreeMap<String, String>;

/// Plausible phone numbers carry between 7 and 15 digits (E.164 max)
const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

/// RFC 5321 path limit
const EMAIL_MAX_LEN: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// Field values that passed validation, trimmed, schema keys only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedValues(BTreeMap<String, String>);

impl NormalizedValues {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Validate `values` against `schema`
///
/// Fields are checked in schema order. Keys the schema does not name are
/// dropped, and empty optional fields are left out of the result.
pub fn validate(
    schema: &FieldSchema,
    values: &FieldValues,
) -> Result<NormalizedValues, ValidationErrors> {
    let mut normalized = BTreeMap::new();
    let mut errors = ValidationErrors::new();

    for field in schema.fields() {
        let value = values
            .get(&field.key)
            .map(|v| v.trim())
            .unwrap_or_default();

        if value.is_empty() {
            if field.required {
                errors.insert(field.key.clone(), FieldError::Required);
            }
            continue;
        }

        match check_field(field, value) {
            Ok(()) => {
                normalized.insert(field.key.clone(), value.to_string());
            }
            Err(e) => errors.insert(field.key.clone(), e),
        }
    }

    if errors.is_empty() {
        Ok(NormalizedValues(normalized))
    } else {
        Err(errors)
    }
}

/// Kind check, then the optional extra rule, on a non-empty trimmed value
fn check_field(field: &FieldSpec, value: &str) -> Result<(), FieldError> {
    match &field.kind {
        FieldKind::Email if !is_valid_email(value) => return Err(FieldError::InvalidEmail),
        FieldKind::Phone if !is_valid_phone(value) => return Err(FieldError::InvalidPhone),
        FieldKind::Choice(options) if !options.iter().any(|o| o == value) => {
            return Err(FieldError::InvalidSelection)
        }
        _ => {}
    }

    match &field.rule {
        Some(rule) => rule.check(value),
        None => Ok(()),
    }
}

pub fn is_valid_email(value: &str) -> bool {
    value.len() <= EMAIL_MAX_LEN && EMAIL_RE.is_match(value)
}

/// Digits plus `space - . ( )`, with an optional leading `+`
pub fn is_valid_phone(value: &str) -> bool {
    let mut digits = 0;

    for (i, c) in value.chars().enumerate() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' => {}
            '+' if i == 0 => {}
            _ => return false,
        }
    }

    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
}
