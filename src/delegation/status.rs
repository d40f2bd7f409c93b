//! Status catalog for delegation requests
//!
//! The set of statuses is fixed. Each carries a display label, a color tag and
//! a priority used when sorting requests by status.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Lifecycle status of a delegation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Submitted, awaiting authorization
    #[default]
    #[serde(rename = "solicitada")]
    Requested,
    /// Authorized by the general directorate
    #[serde(rename = "autorizadaDG")]
    AuthorizedDg,
    /// Delegation act is being drafted
    #[serde(rename = "enElaboracion")]
    InPreparation,
    #[serde(rename = "firmado")]
    Signed,
    #[serde(rename = "publicado")]
    Published,
    #[serde(rename = "rechazado")]
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Requested => "solicitada",
            RequestStatus::AuthorizedDg => "autorizadaDG",
            RequestStatus::InPreparation => "enElaboracion",
            RequestStatus::Signed => "firmado",
            RequestStatus::Published => "publicado",
            RequestStatus::Rejected => "rechazado",
        }
    }

    pub fn definition(&self) -> &'static StatusDefinition {
        match self {
            RequestStatus::Requested => &STATUS_CATALOG[0],
            RequestStatus::AuthorizedDg => &STATUS_CATALOG[1],
            RequestStatus::InPreparation => &STATUS_CATALOG[2],
            RequestStatus::Signed => &STATUS_CATALOG[3],
            RequestStatus::Published => &STATUS_CATALOG[4],
            RequestStatus::Rejected => &STATUS_CATALOG[5],
        }
    }

    pub fn priority(&self) -> u8 {
        self.definition().priority
    }

    pub fn label(&self) -> &'static str {
        self.definition().label
    }

    /// Terminal in intent only; updates may still move a request out of these
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Published | RequestStatus::Rejected)
    }

    /// Counted as approved on the dashboard
    pub fn is_approved(&self) -> bool {
        matches!(self, RequestStatus::Signed | RequestStatus::Published)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "solicitada" => Ok(RequestStatus::Requested),
            "autorizadaDG" => Ok(RequestStatus::AuthorizedDg),
            "enElaboracion" => Ok(RequestStatus::InPreparation),
            "firmado" => Ok(RequestStatus::Signed),
            "publicado" => Ok(RequestStatus::Published),
            "rechazado" => Ok(RequestStatus::Rejected),
            _ => Err(CoreError::UnknownStatus(s.to_string())),
        }
    }
}

/// Static description of one status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDefinition {
    pub value: RequestStatus,
    pub label: &'static str,
    pub color_tag: &'static str,
    pub priority: u8,
}

/// All statuses, in catalog order
pub static STATUS_CATALOG: [StatusDefinition; 6] = [
    StatusDefinition {
        value: RequestStatus::Requested,
        label: "Solicitada",
        color_tag: "blue",
        priority: 1,
    },
    StatusDefinition {
        value: RequestStatus::AuthorizedDg,
        label: "Autorizada DG",
        color_tag: "yellow",
        priority: 2,
    },
    StatusDefinition {
        value: RequestStatus::InPreparation,
        label: "En Elaboración",
        color_tag: "orange",
        priority: 3,
    },
    StatusDefinition {
        value: RequestStatus::Signed,
        label: "Firmado",
        color_tag: "green",
        priority: 4,
    },
    StatusDefinition {
        value: RequestStatus::Published,
        label: "Publicado",
        color_tag: "green-strong",
        priority: 5,
    },
    StatusDefinition {
        value: RequestStatus::Rejected,
        label: "Rechazado",
        color_tag: "red",
        priority: 0,
    },
];

pub fn list_statuses() -> &'static [StatusDefinition] {
    &STATUS_CATALOG
}

/// Priority of a raw status value
pub fn priority_of(status: &str) -> Result<u8> {
    Ok(status.parse::<RequestStatus>()?.priority())
}

/// Display label of a raw status value
pub fn label_of(status: &str) -> Result<&'static str> {
    Ok(status.parse::<RequestStatus>()?.label())
}

pub fn color_tag_of(status: &str) -> Result<&'static str> {
    Ok(status.parse::<RequestStatus>()?.definition().color_tag)
}
