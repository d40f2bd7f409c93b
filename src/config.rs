//! Session configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{CurrentUser, Role};

/// How often the overdue sweep runs unless configured otherwise
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user_name: String,
    pub role: Role,
    #[serde(with = "duration_secs")]
    pub sweep_interval: Duration,
    pub export_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_name: "Administrador".to_string(),
            role: Role::Admin,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            export_dir: PathBuf::from("."),
        }
    }
}

impl SessionConfig {
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser::new(self.user_name.clone(), self.role)
    }

    pub fn with_user(mut self, name: impl Into<String>, role: Role) -> Self {
        self.user_name = name.into();
        self.role = role;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
