//! Mapping validated values onto the backend's wire payload
//!
//! Each funnel gets a `SubmissionAdapter`: a small declarative table of field
//! renames and constant fields plus the endpoint it posts to. Adding a funnel
//! means adding a table, never touching controller code.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::schema::RESERVED_KEYS;
use super::validator::NormalizedValues;

/// Body of one lead POST
///
/// Serialises flat: `{ <fields...>, "formType": ..., "source": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    #[serde(rename = "formType")]
    pub form_type: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    pub source: String,
}

impl SubmissionPayload {
    /// Build the JSON body; reserved keys always come from the payload itself
    pub fn to_json(&self) -> Value {
        let mut body = Map::with_capacity(self.fields.len() + 2);
        for (key, value) in &self.fields {
            body.insert(key.clone(), Value::String(value.clone()));
        }
        body.insert("formType".to_string(), Value::String(self.form_type.clone()));
        body.insert("source".to_string(), Value::String(self.source.clone()));
        Value::Object(body)
    }
}

/// Pass-through merge of validated values with the form type and source tag
pub fn build_payload(
    form_type: &str,
    normalized: &NormalizedValues,
    source_tag: &str,
) -> SubmissionPayload {
    SubmissionPayload {
        form_type: form_type.to_string(),
        fields: normalized.as_map().clone(),
        source: source_tag.to_string(),
    }
}

/// Per-funnel payload mapping table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAdapter {
    form_type: String,
    endpoint: String,
    renames: BTreeMap<String, String>,
    static_fields: BTreeMap<String, String>,
}

impl SubmissionAdapter {
    pub fn new(form_type: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            form_type: form_type.into(),
            endpoint: endpoint.into(),
            renames: BTreeMap::new(),
            static_fields: BTreeMap::new(),
        }
    }

    /// Send schema field `from` under wire key `to`
    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    /// Always send `key: value`, overriding any field with the same wire key
    pub fn with_static(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.static_fields.insert(key.into(), value.into());
        self
    }

    pub fn form_type(&self) -> &str {
        &self.form_type
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn renames(&self) -> &BTreeMap<String, String> {
        &self.renames
    }

    pub fn static_fields(&self) -> &BTreeMap<String, String> {
        &self.static_fields
    }

    /// Apply the table to validated values and build the payload
    pub fn adapt(&self, normalized: &NormalizedValues, source_tag: &str) -> SubmissionPayload {
        let mut payload = build_payload(&self.form_type, normalized, source_tag);

        if !self.renames.is_empty() {
            payload.fields = payload
                .fields
                .into_iter()
                .map(|(key, value)| match self.renames.get(&key) {
                    Some(wire_key) => (wire_key.clone(), value),
                    None => (key, value),
                })
                .collect();
        }

        for (key, value) in &self.static_fields {
            payload.fields.insert(key.clone(), value.clone());
        }

        payload.fields.retain(|key, _| {
            let reserved = RESERVED_KEYS.contains(&key.as_str());
            if reserved {
                debug!(form_type = %self.form_type, key = %key, "Dropping reserved payload key");
            }
            !reserved
        });

        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::schema::{FieldSchema, FieldSpec};
    use crate::form::validator::validate;
    use serde_json::json;

    fn normalized(pairs: &[(&str, &str)]) -> NormalizedValues {
        let schema = FieldSchema::new(
            pairs.iter().map(|(k, _)| FieldSpec::text(*k)).collect(),
        )
        .unwrap();
        let values = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        validate(&schema, &values).unwrap()
    }

    #[test]
    fn test_build_payload_is_pass_through() {
        let values = normalized(&[("name", "Jane Doe"), ("email", "jane@x.com")]);
        let payload = build_payload("healthcare", &values, "website");

        assert_eq!(payload.form_type, "healthcare");
        assert_eq!(payload.source, "website");
        assert_eq!(payload.fields, *values.as_map());
    }

    #[test]
    fn test_payload_serialises_flat() {
        let values = normalized(&[("name", "Jane Doe"), ("email", "jane@x.com")]);
        let payload = build_payload("trades", &values, "trades-landing");

        let expected = json!({
            "name": "Jane Doe",
            "email": "jane@x.com",
            "formType": "trades",
            "source": "trades-landing",
        });
        assert_eq!(payload.to_json(), expected);
        assert_eq!(serde_json::to_value(&payload).unwrap(), expected);
    }

    #[test]
    fn test_adapter_renames_and_static_fields() {
        let adapter = SubmissionAdapter::new("crm", "/api/crm/contacts")
            .with_rename("company", "companyName")
            .with_rename("missing", "neverSent")
            .with_static("status", "new");

        let values = normalized(&[("name", "Jane"), ("company", "Acme")]);
        let payload = adapter.adapt(&values, "website");

        assert_eq!(payload.fields.get("companyName").map(String::as_str), Some("Acme"));
        assert!(!payload.fields.contains_key("company"));
        assert!(!payload.fields.contains_key("neverSent"));
        assert_eq!(payload.fields.get("status").map(String::as_str), Some("new"));
        assert_eq!(adapter.endpoint(), "/api/crm/contacts");
    }

    #[test]
    fn test_adapter_never_shadows_reserved_keys() {
        let adapter = SubmissionAdapter::new("contact", "/api/contact")
            .with_rename("origin", "source")
            .with_static("formType", "spoofed");

        let values = normalized(&[("name", "Jane"), ("origin", "ad")]);
        let body = adapter.adapt(&values, "website").to_json();

        assert_eq!(body["source"], "website");
        assert_eq!(body["formType"], "contact");
    }
}
