//! Validation of submitted delegation request forms
//!
//! A candidate arrives as raw form values. Every rule is checked and all
//! failures are reported together; on success the candidate is normalized into
//! a [`ValidatedRequest`] with typed fields.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

use crate::error::{Field, ValidationError, ValidationErrors};
use crate::models::Urgency;
use crate::registry::InstanceRegistry;

pub const MIN_DELEGATE_LEN: usize = 3;
pub const MIN_JUSTIFICATION_LEN: usize = 10;

/// Raw values from the request form
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestCandidate {
    #[serde(deserialize_with = "string_or_number")]
    pub instance_id: String,
    pub proposed_delegate: String,
    pub justification: String,
    #[serde(rename = "fechaDesignacion")]
    pub designation_date: String,
    #[serde(rename = "fechaVencimiento")]
    pub expiry_date: Option<String>,
    pub urgency: String,
}

impl RequestCandidate {
    pub fn new(
        instance_id: impl Into<String>,
        proposed_delegate: impl Into<String>,
        justification: impl Into<String>,
        designation_date: impl Into<String>,
        urgency: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            proposed_delegate: proposed_delegate.into(),
            justification: justification.into(),
            designation_date: designation_date.into(),
            expiry_date: None,
            urgency: urgency.into(),
        }
    }

    pub fn with_expiry_date(mut self, expiry: impl Into<String>) -> Self {
        self.expiry_date = Some(expiry.into());
        self
    }
}

/// The form selects instances by numeric id but callers may send either shape
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
        Float(f64),
        Null,
    }

    // Anything unusable is left for `validate` to report
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Null => String::new(),
    })
}

/// A candidate that passed every rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub instance_id: u32,
    pub proposed_delegate: String,
    pub justification: String,
    pub designation_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub urgency: Urgency,
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (its date part is kept)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn check_min_len(
    errors: &mut Vec<ValidationError>,
    field: Field,
    value: &str,
    min: usize,
) -> Option<String> {
    let trimmed = value.trim();
    let actual = trimmed.chars().count();
    if actual < min {
        errors.push(ValidationError::TooShort { field, min, actual });
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Check a candidate against the registry.
pub fn validate(
    candidate: &RequestCandidate,
    registry: &InstanceRegistry,
) -> Result<ValidatedRequest, ValidationErrors> {
    let mut errors = Vec::new();

    let instance_id = candidate
        .instance_id
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|id| {
            registry
                .get_by_id(*id)
                .map(|instance| instance.is_delegable())
                .unwrap_or(false)
        });
    if instance_id.is_none() {
        errors.push(ValidationError::InvalidInstance {
            value: candidate.instance_id.clone(),
        });
    }

    let proposed_delegate = check_min_len(
        &mut errors,
        Field::ProposedDelegate,
        &candidate.proposed_delegate,
        MIN_DELEGATE_LEN,
    );

    let designation_date = parse_date(&candidate.designation_date);
    if designation_date.is_none() {
        errors.push(ValidationError::MissingDate {
            field: Field::DesignationDate,
        });
    }

    let expiry_raw = candidate
        .expiry_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let mut expiry_date = None;
    if let Some(raw) = expiry_raw {
        match parse_date(raw) {
            Some(expiry) => {
                if let Some(designation) = designation_date {
                    if expiry < designation {
                        errors.push(ValidationError::DateOrderViolation {
                            designation,
                            expiry,
                        });
                    }
                }
                expiry_date = Some(expiry);
            }
            None => errors.push(ValidationError::InvalidDate {
                field: Field::ExpiryDate,
                value: raw.to_string(),
            }),
        }
    }

    let urgency = candidate.urgency.trim().parse::<Urgency>().ok();
    if urgency.is_none() {
        errors.push(ValidationError::InvalidEnum {
            field: Field::Urgency,
            value: candidate.urgency.clone(),
        });
    }

    let justification = check_min_len(
        &mut errors,
        Field::Justification,
        &candidate.justification,
        MIN_JUSTIFICATION_LEN,
    );

    match (
        instance_id,
        proposed_delegate,
        designation_date,
        urgency,
        justification,
    ) {
        (Some(instance_id), Some(proposed_delegate), Some(designation_date), Some(urgency), Some(justification))
            if errors.is_empty() =>
        {
            Ok(ValidatedRequest {
                instance_id,
                proposed_delegate,
                justification,
                designation_date,
                expiry_date,
                urgency,
            })
        }
        _ => Err(ValidationErrors::new(errors)),
    }
}
