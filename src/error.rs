//! Error types for the delegation core

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::delegation::RequestId;

/// Candidate fields that validation can report on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    InstanceId,
    ProposedDelegate,
    Justification,
    #[serde(rename = "fechaDesignacion")]
    DesignationDate,
    #[serde(rename = "fechaVencimiento")]
    ExpiryDate,
    Urgency,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::InstanceId => "instanceId",
            Field::ProposedDelegate => "proposedDelegate",
            Field::Justification => "justification",
            Field::DesignationDate => "fechaDesignacion",
            Field::ExpiryDate => "fechaVencimiento",
            Field::Urgency => "urgency",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level problem with a request candidate
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    #[error("instanceId '{value}' does not reference a delegable instance")]
    InvalidInstance { value: String },

    #[error("{field} must have at least {min} characters (got {actual})")]
    TooShort {
        field: Field,
        min: usize,
        actual: usize,
    },

    #[error("{field} is required and must be a valid date")]
    MissingDate { field: Field },

    #[error("{field} is not a valid date: '{value}'")]
    InvalidDate { field: Field, value: String },

    #[error("fechaVencimiento {expiry} is earlier than fechaDesignacion {designation}")]
    DateOrderViolation {
        designation: NaiveDate,
        expiry: NaiveDate,
    },

    #[error("{field} has invalid value '{value}'")]
    InvalidEnum { field: Field, value: String },
}

impl ValidationError {
    /// The candidate field this error refers to
    pub fn field(&self) -> Field {
        match self {
            ValidationError::InvalidInstance { .. } => Field::InstanceId,
            ValidationError::TooShort { field, .. }
            | ValidationError::MissingDate { field }
            | ValidationError::InvalidDate { field, .. }
            | ValidationError::InvalidEnum { field, .. } => *field,
            ValidationError::DateOrderViolation { .. } => Field::ExpiryDate,
        }
    }
}

/// Every problem found in one candidate, in field order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Errors reported against a single field
    pub fn for_field(&self, field: Field) -> impl Iterator<Item = &ValidationError> {
        self.0.iter().filter(move |e| e.field() == field)
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Request not found: {0}")]
    RequestNotFound(RequestId),

    #[error("Duplicate request id: {0}")]
    DuplicateRequest(RequestId),

    #[error("Instance not found: {0}")]
    InstanceNotFound(u32),

    #[error("Duplicate instance id: {0}")]
    DuplicateInstance(u32),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("fechaVencimiento {expiry} is earlier than fechaDesignacion {designation}")]
    DateOrderViolation {
        designation: NaiveDate,
        expiry: NaiveDate,
    },

    #[error("Not permitted: {0}")]
    NotPermitted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_core_error_display() {
        let err = CoreError::RequestNotFound(RequestId::from("req-1"));
        assert_eq!(format!("{}", err), "Request not found: req-1");

        let err = CoreError::InstanceNotFound(7);
        assert_eq!(format!("{}", err), "Instance not found: 7");

        let err = CoreError::UnknownStatus("archivado".to_string());
        assert_eq!(format!("{}", err), "Unknown status: archivado");

        let err = CoreError::NotPermitted("export requires Admin".to_string());
        assert_eq!(format!("{}", err), "Not permitted: export requires Admin");
    }

    #[test]
    fn test_date_order_display() {
        let err = CoreError::DateOrderViolation {
            designation: date("2025-02-01"),
            expiry: date("2025-01-01"),
        };
        assert_eq!(
            format!("{}", err),
            "fechaVencimiento 2025-01-01 is earlier than fechaDesignacion 2025-02-01"
        );
    }

    #[test]
    fn test_validation_error_field() {
        let err = ValidationError::InvalidInstance {
            value: "abc".to_string(),
        };
        assert_eq!(err.field(), Field::InstanceId);

        let err = ValidationError::DateOrderViolation {
            designation: date("2025-02-01"),
            expiry: date("2025-01-01"),
        };
        assert_eq!(err.field(), Field::ExpiryDate);

        let err = ValidationError::TooShort {
            field: Field::Justification,
            min: 10,
            actual: 3,
        };
        assert_eq!(err.field(), Field::Justification);
    }

    #[test]
    fn test_validation_errors_display_joins() {
        let errors = ValidationErrors::new(vec![
            ValidationError::TooShort {
                field: Field::ProposedDelegate,
                min: 3,
                actual: 2,
            },
            ValidationError::MissingDate {
                field: Field::DesignationDate,
            },
        ]);
        assert_eq!(
            errors.to_string(),
            "proposedDelegate must have at least 3 characters (got 2); fechaDesignacion is required and must be a valid date"
        );
        assert_eq!(errors.for_field(Field::ProposedDelegate).count(), 1);
    }

    #[test]
    fn test_validation_error_serializes_with_kind() {
        let err = ValidationError::InvalidEnum {
            field: Field::Urgency,
            value: "Baja".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "invalidEnum");
        assert_eq!(json["field"], "urgency");
        assert_eq!(json["value"], "Baja");
    }

    #[test]
    fn test_core_error_from_validation() {
        let errors = ValidationErrors::new(vec![ValidationError::MissingDate {
            field: Field::DesignationDate,
        }]);
        let err: CoreError = errors.into();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_core_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);

        fn err_fn() -> Result<i32> {
            Err(CoreError::InstanceNotFound(1))
        }
        assert!(err_fn().is_err());
    }
}
