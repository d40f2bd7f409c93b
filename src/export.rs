//! Snapshot export
//!
//! A snapshot holds the instance registry and every request verbatim. It is
//! written as pretty JSON (two-space indentation) into a file named after the
//! export time, and can be read back to rebuild the registry and the store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::delegation::{DelegationRequest, RequestStore};
use crate::error::Result;
use crate::models::Instance;
use crate::registry::InstanceRegistry;

const FILE_PREFIX: &str = "dnp_data_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub instances: Vec<Instance>,
    pub requests: Vec<DelegationRequest>,
}

pub fn snapshot(instances: &[Instance], requests: &[DelegationRequest]) -> Snapshot {
    Snapshot {
        instances: instances.to_vec(),
        requests: requests.to_vec(),
    }
}

/// `dnp_data_<ISO-8601 UTC with milliseconds>.json`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!(
        "{}{}.json",
        FILE_PREFIX,
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write into `dir` and return the path of the new file
    pub fn write_to_dir(&self, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
        let path = dir.join(export_file_name(now));
        std::fs::write(&path, self.to_json()?)?;
        tracing::info!(
            path = %path.display(),
            instances = self.instances.len(),
            requests = self.requests.len(),
            "Exported snapshot"
        );
        Ok(path)
    }

    /// Rebuild the registry and the store this snapshot was taken from
    pub fn restore(self) -> Result<(InstanceRegistry, RequestStore)> {
        let registry = InstanceRegistry::new(self.instances)?;
        let store = RequestStore::from_requests(self.requests)?;
        Ok((registry, store))
    }
}
