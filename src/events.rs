//! Events emitted by a dashboard session
//!
//! Events are broadcast fire-and-forget. A notification collaborator turns
//! each one into a `{requestId, message}` pair for display.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::delegation::{RequestId, RequestStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    RequestCreated {
        request_id: RequestId,
        instance_id: u32,
    },
    RequestUpdated {
        request_id: RequestId,
        status: RequestStatus,
    },
    RequestDeleted {
        request_id: RequestId,
    },
    /// Raised by the overdue sweep
    RequestOverdue {
        request_id: RequestId,
        expiry_date: NaiveDate,
    },
    DataExported {
        path: PathBuf,
    },
    InstanceEdited {
        instance_id: u32,
    },
}

/// What the notification collaborator receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    pub message: String,
    pub level: NotificationLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Warning,
}

impl DashboardEvent {
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            DashboardEvent::RequestCreated { request_id, .. }
            | DashboardEvent::RequestUpdated { request_id, .. }
            | DashboardEvent::RequestDeleted { request_id }
            | DashboardEvent::RequestOverdue { request_id, .. } => Some(request_id),
            DashboardEvent::DataExported { .. } | DashboardEvent::InstanceEdited { .. } => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            DashboardEvent::RequestCreated { request_id, .. } => {
                format!("Solicitud {} creada", request_id)
            }
            DashboardEvent::RequestUpdated { request_id, .. } => {
                format!("Solicitud {} actualizada", request_id)
            }
            DashboardEvent::RequestDeleted { request_id } => {
                format!("Solicitud {} eliminada", request_id)
            }
            DashboardEvent::RequestOverdue { request_id, .. } => {
                format!("Solicitud {} vencida", request_id)
            }
            DashboardEvent::DataExported { .. } => "Datos exportados exitosamente".to_string(),
            DashboardEvent::InstanceEdited { instance_id } => {
                format!("Instancia {} actualizada", instance_id)
            }
        }
    }

    pub fn notification(&self) -> Notification {
        let level = match self {
            DashboardEvent::RequestOverdue { .. } => NotificationLevel::Warning,
            _ => NotificationLevel::Success,
        };
        Notification {
            request_id: self.request_id().cloned(),
            message: self.message(),
            level,
        }
    }
}
