//! Delegation request management for organizational decision-making bodies

pub mod config;
pub mod delegation;
pub mod error;
pub mod events;
pub mod export;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod session;
pub mod sweep;

pub use config::SessionConfig;
pub use error::{CoreError, Result};
pub use session::DashboardSession;
