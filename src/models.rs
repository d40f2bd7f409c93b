//! Data models for instances, urgency and the session user

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An organizational decision-making body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: u32,
    #[serde(rename = "nombre")]
    pub name: String,
    pub delegable: Delegability,
    pub status: InstanceStatus,
    pub created_at: NaiveDate,
    #[serde(rename = "dependenciaResponsable")]
    pub responsible_unit: String,
    #[serde(rename = "miembroPrincipal")]
    pub principal_member: String,
    #[serde(rename = "actoAdministrativo")]
    pub founding_act: String,
    #[serde(rename = "periodicidadReuniones")]
    pub meeting_frequency: String,
    #[serde(rename = "powerBIIntegration")]
    pub power_bi_integration: bool,
    pub orfeo_integration: bool,
    pub metadata: InstanceMetadata,
}

impl Instance {
    pub fn is_delegable(&self) -> bool {
        self.delegable == Delegability::Delegable
    }

    pub fn is_active(&self) -> bool {
        self.status == InstanceStatus::Active
    }
}

/// Bookkeeping attached to each instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceMetadata {
    pub last_updated: NaiveDate,
    pub version: String,
}

/// Whether an instance's authority can be delegated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Delegability {
    Delegable,
    Indelegable,
}

impl Delegability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delegability::Delegable => "DELEGABLE",
            Delegability::Indelegable => "INDELEGABLE",
        }
    }
}

impl std::str::FromStr for Delegability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELEGABLE" => Ok(Delegability::Delegable),
            "INDELEGABLE" => Ok(Delegability::Indelegable),
            _ => Err(format!("Invalid delegability: {}", s)),
        }
    }
}

/// Whether an instance is currently operating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceStatus {
    #[serde(rename = "Activa")]
    Active,
    #[serde(rename = "Inactiva")]
    Inactive,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Active => "Activa",
            InstanceStatus::Inactive => "Inactiva",
        }
    }
}

impl std::str::FromStr for InstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Activa" => Ok(InstanceStatus::Active),
            "Inactiva" => Ok(InstanceStatus::Inactive),
            _ => Err(format!("Invalid instance status: {}", s)),
        }
    }
}

/// Urgency tag on a delegation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Urgency {
    #[default]
    Normal,
    #[serde(rename = "Alta")]
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "Normal",
            Urgency::High => "Alta",
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(Urgency::Normal),
            "Alta" => Ok(Urgency::High),
            _ => Err(format!("Invalid urgency: {}", s)),
        }
    }
}

/// The single role assigned to the session user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }

    /// Instance edits and data export are admin-only
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" | "admin" => Ok(Role::Admin),
            "User" | "user" => Ok(Role::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// The user the session runs as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegability_round_trip() {
        assert_eq!(Delegability::Delegable.as_str(), "DELEGABLE");
        assert_eq!(
            "INDELEGABLE".parse::<Delegability>().unwrap(),
            Delegability::Indelegable
        );
        assert!("delegable".parse::<Delegability>().is_err());
    }

    #[test]
    fn test_urgency_from_str() {
        assert_eq!("Normal".parse::<Urgency>().unwrap(), Urgency::Normal);
        assert_eq!("Alta".parse::<Urgency>().unwrap(), Urgency::High);
        assert!("Baja".parse::<Urgency>().is_err());
        assert_eq!(Urgency::default(), Urgency::Normal);
    }

    #[test]
    fn test_urgency_serialization() {
        assert_eq!(serde_json::to_string(&Urgency::High).unwrap(), "\"Alta\"");
        assert_eq!(serde_json::to_string(&Urgency::Normal).unwrap(), "\"Normal\"");
    }

    #[test]
    fn test_instance_status_serialization() {
        assert_eq!(
            serde_json::to_string(&InstanceStatus::Active).unwrap(),
            "\"Activa\""
        );
        assert_eq!(
            "Inactiva".parse::<InstanceStatus>().unwrap(),
            InstanceStatus::Inactive
        );
    }

    #[test]
    fn test_role_parse_and_admin() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
        assert!("guest".parse::<Role>().is_err());
    }
}
