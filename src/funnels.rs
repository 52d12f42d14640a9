//! Catalog of the site's lead-capture funnels
//!
//! Each funnel is data: a schema, an adapter table and its copy. Pages
//! instantiate a controller from a definition instead of carrying their own
//! submit handler.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::analytics::AnalyticsSink;
use crate::config::PipelineConfig;
use crate::form::{
    FieldSchema, FieldSpec, FormConfig, FormCopy, SchemaError, SubmissionAdapter,
    SubmissionController, ValidationRule,
};
use crate::transport::LeadTransport;

pub const LEADS_ENDPOINT: &str = "/api/leads";
pub const CONTACT_ENDPOINT: &str = "/api/contact";
pub const CRM_CONTACTS_ENDPOINT: &str = "/api/crm/contacts";

const MESSAGE_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Funnel {
    Healthcare,
    Trades,
    SmallBusiness,
    EmailMarketing,
    SalesFunnel,
    Contact,
    CrmContact,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown funnel '{0}'")]
pub struct UnknownFunnel(pub String);

impl Funnel {
    pub const ALL: [Funnel; 7] = [
        Funnel::Healthcare,
        Funnel::Trades,
        Funnel::SmallBusiness,
        Funnel::EmailMarketing,
        Funnel::SalesFunnel,
        Funnel::Contact,
        Funnel::CrmContact,
    ];

    /// Tag sent as `formType` and used as the analytics label
    pub fn form_type(self) -> &'static str {
        match self {
            Self::Healthcare => "healthcare",
            Self::Trades => "trades",
            Self::SmallBusiness => "small_business",
            Self::EmailMarketing => "email_marketing",
            Self::SalesFunnel => "sales_funnel",
            Self::Contact => "contact",
            Self::CrmContact => "crm",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Contact => CONTACT_ENDPOINT,
            Self::CrmContact => CRM_CONTACTS_ENDPOINT,
            _ => LEADS_ENDPOINT,
        }
    }

    pub fn definition(self) -> Result<FunnelDefinition, SchemaError> {
        let mut fields = vec![
            FieldSpec::text("name").required(),
            FieldSpec::email("email").required(),
            FieldSpec::phone("phone"),
        ];
        fields.extend(self.specific_fields()?);
        fields.push(FieldSpec::hidden("utm_source"));
        fields.push(FieldSpec::hidden("utm_campaign"));

        let mut adapter = SubmissionAdapter::new(self.form_type(), self.endpoint());
        if self == Self::CrmContact {
            adapter = adapter
                .with_rename("company", "companyName")
                .with_static("status", "new");
        }

        Ok(FunnelDefinition {
            funnel: self,
            schema: Arc::new(FieldSchema::new(fields)?),
            adapter,
            copy: self.default_copy(),
        })
    }

    fn specific_fields(self) -> Result<Vec<FieldSpec>, SchemaError> {
        let message = FieldSpec::long_text("message")
            .with_rule(ValidationRule::MaxLength(MESSAGE_MAX_CHARS));

        let fields = match self {
            Self::Healthcare => vec![
                FieldSpec::text("practice_name").required(),
                FieldSpec::choice(
                    "practice_type",
                    &[
                        "Private Practice",
                        "Dental",
                        "Chiropractic",
                        "Physical Therapy",
                        "Mental Health",
                        "Other",
                    ],
                ),
                message,
            ],
            Self::Trades => vec![
                FieldSpec::text("business_name").required(),
                FieldSpec::choice(
                    "trade",
                    &[
                        "Plumbing",
                        "Electrical",
                        "HVAC",
                        "Roofing",
                        "Landscaping",
                        "General Contracting",
                        "Other",
                    ],
                )
                .required(),
                FieldSpec::text("service_area"),
            ],
            Self::SmallBusiness => vec![
                FieldSpec::text("business_name").required(),
                FieldSpec::choice("employees", &["1-5", "6-20", "21-50", "51+"]),
                FieldSpec::long_text("goals")
                    .with_rule(ValidationRule::MaxLength(MESSAGE_MAX_CHARS)),
            ],
            Self::EmailMarketing => vec![
                FieldSpec::text("company"),
                FieldSpec::choice(
                    "list_size",
                    &["0-1,000", "1,000-10,000", "10,000-50,000", "50,000+"],
                )
                .required(),
                FieldSpec::text("current_platform"),
            ],
            Self::SalesFunnel => vec![
                FieldSpec::text("website").with_rule(ValidationRule::pattern(
                    r"(https?://)?[A-Za-z0-9.-]+\.[A-Za-z]{2,}(/\S*)?",
                    "invalid website",
                )?),
                FieldSpec::choice(
                    "monthly_budget",
                    &["Under $1,000", "$1,000-$5,000", "$5,000-$10,000", "$10,000+"],
                ),
                message,
            ],
            Self::Contact => vec![
                FieldSpec::text("subject"),
                FieldSpec::choice("interest", &["demo", "pricing", "partnership", "other"]),
                message.required(),
            ],
            Self::CrmContact => vec![FieldSpec::text("company")],
        };

        Ok(fields)
    }

    fn default_copy(self) -> FormCopy {
        let success = match self {
            Self::Healthcare => "Thank you! A healthcare growth specialist will contact you within one business day.",
            Self::Trades => "Thanks! We'll call you to schedule your free marketing audit.",
            Self::Contact => "Thank you for reaching out. We'll respond within 24 hours.",
            Self::CrmContact => "Contact saved.",
            _ => "Thank you! We'll be in touch within 24 hours.",
        };
        FormCopy::new(success, FormCopy::default().failure)
    }
}

impl fmt::Display for Funnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_type())
    }
}

impl FromStr for Funnel {
    type Err = UnknownFunnel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|f| f.form_type() == tag)
            .ok_or_else(|| UnknownFunnel(s.to_string()))
    }
}

/// Everything needed to run one funnel's form
#[derive(Debug, Clone)]
pub struct FunnelDefinition {
    pub funnel: Funnel,
    pub schema: Arc<FieldSchema>,
    pub adapter: SubmissionAdapter,
    pub copy: FormCopy,
}

impl FunnelDefinition {
    pub fn with_copy(mut self, copy: FormCopy) -> Self {
        self.copy = copy;
        self
    }

    /// Apply a configuration's copy overrides for this funnel
    pub fn configured(self, config: &PipelineConfig) -> Self {
        let copy = config.copy_for(self.funnel.form_type(), self.copy.clone());
        self.with_copy(copy)
    }

    pub fn form_config(&self, source: &str) -> FormConfig {
        FormConfig::new(self.schema.clone(), self.adapter.clone(), source)
            .with_copy(self.copy.clone())
    }

    /// A fresh controller for one mount of this funnel's form
    pub fn controller(
        &self,
        transport: Arc<dyn LeadTransport>,
        analytics: Arc<dyn AnalyticsSink>,
        source: &str,
    ) -> SubmissionController {
        SubmissionController::new(self.form_config(source), transport, analytics)
    }
}
