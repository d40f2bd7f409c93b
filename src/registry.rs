//! Instance registry
//!
//! Holds the catalogue of decision-making bodies. Ids are fixed at seeding and
//! never change or get reused.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::{Delegability, Instance, InstanceMetadata, InstanceStatus};

/// Which instances to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegabilityFilter {
    #[default]
    All,
    Delegable,
    Indelegable,
}

impl DelegabilityFilter {
    pub fn matches(&self, instance: &Instance) -> bool {
        match self {
            DelegabilityFilter::All => true,
            DelegabilityFilter::Delegable => instance.delegable == Delegability::Delegable,
            DelegabilityFilter::Indelegable => instance.delegable == Delegability::Indelegable,
        }
    }
}

impl std::str::FromStr for DelegabilityFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(DelegabilityFilter::All),
            "delegable" => Ok(DelegabilityFilter::Delegable),
            "indelegable" => Ok(DelegabilityFilter::Indelegable),
            _ => Err(format!("Invalid delegability filter: {}", s)),
        }
    }
}

/// Edits to an instance's descriptive fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePatch {
    pub name: Option<String>,
    pub delegable: Option<Delegability>,
    pub status: Option<InstanceStatus>,
    pub responsible_unit: Option<String>,
    pub principal_member: Option<String>,
    pub founding_act: Option<String>,
    pub meeting_frequency: Option<String>,
    pub power_bi_integration: Option<bool>,
    pub orfeo_integration: Option<bool>,
}

/// Catalogue of instances, in seed order
#[derive(Debug, Clone, Default)]
pub struct InstanceRegistry {
    instances: Vec<Instance>,
}

impl InstanceRegistry {
    /// Build from seed data; duplicate ids are rejected
    pub fn new(instances: Vec<Instance>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(instances.len());
        for instance in &instances {
            if !seen.insert(instance.id) {
                return Err(CoreError::DuplicateInstance(instance.id));
            }
        }
        Ok(Self { instances })
    }

    /// Registry with the built-in seed catalogue
    pub fn seeded() -> Self {
        Self {
            instances: seed_instances(),
        }
    }

    pub fn list_instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn list_delegable(&self) -> Vec<&Instance> {
        self.filter(DelegabilityFilter::Delegable)
    }

    pub fn filter(&self, filter: DelegabilityFilter) -> Vec<&Instance> {
        self.instances.iter().filter(|i| filter.matches(i)).collect()
    }

    pub fn get_by_id(&self, id: u32) -> Result<&Instance> {
        self.instances
            .iter()
            .find(|i| i.id == id)
            .ok_or(CoreError::InstanceNotFound(id))
    }

    pub fn active_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_active()).count()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Apply `patch` and stamp `metadata.lastUpdated` with `today`.
    pub fn edit(&mut self, id: u32, patch: InstancePatch, today: NaiveDate) -> Result<&Instance> {
        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(CoreError::InstanceNotFound(id))?;

        if let Some(name) = patch.name {
            instance.name = name;
        }
        if let Some(delegable) = patch.delegable {
            instance.delegable = delegable;
        }
        if let Some(status) = patch.status {
            instance.status = status;
        }
        if let Some(unit) = patch.responsible_unit {
            instance.responsible_unit = unit;
        }
        if let Some(member) = patch.principal_member {
            instance.principal_member = member;
        }
        if let Some(act) = patch.founding_act {
            instance.founding_act = act;
        }
        if let Some(frequency) = patch.meeting_frequency {
            instance.meeting_frequency = frequency;
        }
        if let Some(flag) = patch.power_bi_integration {
            instance.power_bi_integration = flag;
        }
        if let Some(flag) = patch.orfeo_integration {
            instance.orfeo_integration = flag;
        }
        instance.metadata.last_updated = today;

        Ok(instance)
    }
}

/// Only used to build constants, so a bad date fails the build
const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid seed date"),
    }
}

const SEED_CREATED: NaiveDate = ymd(2025, 1, 1);
const SEED_UPDATED_CONSEJO_MINISTROS: NaiveDate = ymd(2025, 1, 2);
const SEED_UPDATED_COMERCIO_EXTERIOR: NaiveDate = ymd(2025, 1, 3);

/// The catalogue the dashboard starts with
pub fn seed_instances() -> Vec<Instance> {
    vec![
        Instance {
            id: 1,
            name: "Consejo de Ministros".to_string(),
            delegable: Delegability::Indelegable,
            status: InstanceStatus::Active,
            created_at: SEED_CREATED,
            responsible_unit: "Dirección General".to_string(),
            principal_member: "Director General".to_string(),
            founding_act: "Resolución 001-2025".to_string(),
            meeting_frequency: "Cuando se requiera".to_string(),
            power_bi_integration: true,
            orfeo_integration: false,
            metadata: InstanceMetadata {
                last_updated: SEED_UPDATED_CONSEJO_MINISTROS,
                version: "1.0".to_string(),
            },
        },
        Instance {
            id: 2,
            name: "Consejo Superior de Comercio Exterior".to_string(),
            delegable: Delegability::Delegable,
            status: InstanceStatus::Active,
            created_at: SEED_CREATED,
            responsible_unit: "Subdirección General".to_string(),
            principal_member: "Subdirector General".to_string(),
            founding_act: "Resolución 002-2025".to_string(),
            meeting_frequency: "Mensual".to_string(),
            power_bi_integration: true,
            orfeo_integration: true,
            metadata: InstanceMetadata {
                last_updated: SEED_UPDATED_COMERCIO_EXTERIOR,
                version: "1.1".to_string(),
            },
        },
    ]
}
