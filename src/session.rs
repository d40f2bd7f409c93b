//! Dashboard session
//!
//! The session owns the instance registry and the request store behind one
//! lock, runs as a single fixed user, and broadcasts an event for every
//! mutation. Each call takes the lock once and runs the core operation to
//! completion under it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::delegation::{
    validate, DelegationRequest, RequestCandidate, RequestId, RequestPatch, RequestStatus,
    RequestStore, SortBy, ValidatedRequest,
};
use crate::error::{CoreError, Result};
use crate::events::DashboardEvent;
use crate::export::{snapshot, Snapshot};
use crate::metrics::{compute_risk, compute_stats, DashboardStats, RiskAssessment};
use crate::models::{CurrentUser, Instance};
use crate::registry::{DelegabilityFilter, InstancePatch, InstanceRegistry};
use crate::sweep::SweepHandle;

/// Everything the session guards with its lock
#[derive(Debug, Default)]
pub struct DashboardState {
    pub registry: InstanceRegistry,
    pub requests: RequestStore,
}

pub struct DashboardSession {
    id: Uuid,
    user: CurrentUser,
    config: SessionConfig,
    state: Arc<RwLock<DashboardState>>,
    event_tx: broadcast::Sender<DashboardEvent>,
}

impl DashboardSession {
    /// Session over the built-in seed catalogue and an empty store
    pub fn new(config: SessionConfig) -> Self {
        Self::with_state(config, InstanceRegistry::seeded(), RequestStore::new())
    }

    pub fn with_state(config: SessionConfig, registry: InstanceRegistry, requests: RequestStore) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let id = Uuid::new_v4();
        let user = config.current_user();

        tracing::info!(
            session_id = %id,
            user = %user.name,
            role = user.role.as_str(),
            instances = registry.len(),
            requests = requests.len(),
            "Dashboard session started"
        );

        Self {
            id,
            user,
            config,
            state: Arc::new(RwLock::new(DashboardState { registry, requests })),
            event_tx,
        }
    }

    /// Session restored from a previous export
    pub fn from_snapshot(config: SessionConfig, snapshot: Snapshot) -> Result<Self> {
        let (registry, requests) = snapshot.restore()?;
        Ok(Self::with_state(config, registry, requests))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: DashboardEvent) {
        let _ = self.event_tx.send(event);
    }

    fn require_admin(&self, action: &str) -> Result<()> {
        if self.user.role.is_admin() {
            Ok(())
        } else {
            Err(CoreError::NotPermitted(format!(
                "{} requires the Admin role",
                action
            )))
        }
    }

    // Requests

    pub async fn validate(&self, candidate: &RequestCandidate) -> Result<ValidatedRequest> {
        let state = self.state.read().await;
        Ok(validate(candidate, &state.registry)?)
    }

    /// Validate and create a new request
    pub async fn submit(&self, candidate: &RequestCandidate) -> Result<DelegationRequest> {
        let request = {
            let mut state = self.state.write().await;
            let validated = validate(candidate, &state.registry).map_err(|errors| {
                tracing::debug!(errors = errors.len(), "Rejected delegation request candidate");
                errors
            })?;
            state.requests.create(validated, &self.user.name)
        };

        self.emit(DashboardEvent::RequestCreated {
            request_id: request.id.clone(),
            instance_id: request.instance_id,
        });

        Ok(request)
    }

    /// Validate a full edited form and merge it into an existing request
    pub async fn resubmit(
        &self,
        id: &RequestId,
        candidate: &RequestCandidate,
        status: Option<RequestStatus>,
    ) -> Result<DelegationRequest> {
        let request = {
            let mut state = self.state.write().await;
            state.requests.get(id)?;
            let validated = validate(candidate, &state.registry)?;
            let mut patch = RequestPatch::from(validated);
            patch.status = status;
            state.requests.update(id, &patch)?
        };

        self.emit(DashboardEvent::RequestUpdated {
            request_id: request.id.clone(),
            status: request.status,
        });

        Ok(request)
    }

    pub async fn update(&self, id: &RequestId, patch: &RequestPatch) -> Result<DelegationRequest> {
        let request = {
            let mut state = self.state.write().await;
            state.requests.update(id, patch)?
        };

        self.emit(DashboardEvent::RequestUpdated {
            request_id: request.id.clone(),
            status: request.status,
        });

        Ok(request)
    }

    /// Set a status given by its catalog value, e.g. `"firmado"`
    pub async fn update_status(&self, id: &RequestId, status: &str) -> Result<DelegationRequest> {
        let status: RequestStatus = status.parse()?;
        self.update(id, &RequestPatch::new().with_status(status)).await
    }

    pub async fn delete(&self, id: &RequestId) -> Result<DelegationRequest> {
        let removed = {
            let mut state = self.state.write().await;
            state.requests.delete(id)?
        };

        self.emit(DashboardEvent::RequestDeleted {
            request_id: removed.id.clone(),
        });

        Ok(removed)
    }

    pub async fn get(&self, id: &RequestId) -> Result<DelegationRequest> {
        let state = self.state.read().await;
        state.requests.get(id).cloned()
    }

    pub async fn list(&self, search: Option<&str>, sort: SortBy) -> Vec<DelegationRequest> {
        let state = self.state.read().await;
        state.requests.list(search, sort).into_iter().cloned().collect()
    }

    pub async fn overdue(&self, as_of: DateTime<Utc>) -> Vec<DelegationRequest> {
        let state = self.state.read().await;
        state.requests.overdue(as_of).into_iter().cloned().collect()
    }

    // Metrics

    pub async fn stats(&self) -> DashboardStats {
        self.stats_at(Utc::now()).await
    }

    pub async fn stats_at(&self, as_of: DateTime<Utc>) -> DashboardStats {
        let state = self.state.read().await;
        compute_stats(state.requests.requests(), state.registry.list_instances(), as_of)
    }

    pub async fn risk(&self) -> RiskAssessment {
        let state = self.state.read().await;
        compute_risk(state.requests.requests())
    }

    // Instances

    pub async fn list_instances(&self) -> Vec<Instance> {
        let state = self.state.read().await;
        state.registry.list_instances().to_vec()
    }

    pub async fn list_delegable(&self) -> Vec<Instance> {
        self.filter_instances(DelegabilityFilter::Delegable).await
    }

    pub async fn filter_instances(&self, filter: DelegabilityFilter) -> Vec<Instance> {
        let state = self.state.read().await;
        state.registry.filter(filter).into_iter().cloned().collect()
    }

    pub async fn get_instance(&self, id: u32) -> Result<Instance> {
        let state = self.state.read().await;
        state.registry.get_by_id(id).cloned()
    }

    /// Admin only
    pub async fn edit_instance(&self, id: u32, patch: InstancePatch) -> Result<Instance> {
        self.require_admin("Editing instances")?;

        let instance = {
            let mut state = self.state.write().await;
            state
                .registry
                .edit(id, patch, Utc::now().date_naive())?
                .clone()
        };

        tracing::info!(instance_id = id, "Edited instance");
        self.emit(DashboardEvent::InstanceEdited { instance_id: id });

        Ok(instance)
    }

    // Export

    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.read().await;
        snapshot(state.registry.list_instances(), state.requests.requests())
    }

    /// Export into the configured directory. Admin only.
    pub async fn export(&self) -> Result<PathBuf> {
        let dir = self.config.export_dir.clone();
        self.export_to(&dir).await
    }

    /// Admin only
    pub async fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        self.require_admin("Exporting data")?;

        let path = self.snapshot().await.write_to_dir(dir, Utc::now())?;
        self.emit(DashboardEvent::DataExported { path: path.clone() });
        Ok(path)
    }

    // Background work

    /// Start the overdue sweep with the configured interval. The sweep
    /// stops when the handle is stopped or this session is dropped.
    pub fn start_overdue_sweep(&self) -> SweepHandle {
        SweepHandle::spawn(
            Arc::downgrade(&self.state),
            self.event_tx.clone(),
            self.config.sweep_interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::time::Duration;

    fn candidate() -> RequestCandidate {
        RequestCandidate::new(
            "2",
            "Juan Perez",
            "Cobertura temporal por ausencia",
            "2025-01-10",
            "Normal",
        )
    }

    fn overdue_candidate() -> RequestCandidate {
        RequestCandidate::new(
            "2",
            "Ana Gómez",
            "Reemplazo durante comisión de servicios",
            "2020-01-01",
            "Alta",
        )
        .with_expiry_date("2020-02-01")
    }

    #[tokio::test]
    async fn test_submit_emits_created() {
        let session = DashboardSession::new(SessionConfig::default());
        let mut rx = session.subscribe();

        let request = session.submit(&candidate()).await.unwrap();
        assert_eq!(request.requested_by, "Administrador");

        match rx.recv().await.unwrap() {
            DashboardEvent::RequestCreated { request_id, instance_id } => {
                assert_eq!(request_id, request.id);
                assert_eq!(instance_id, 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_invalid_does_not_mutate() {
        let session = DashboardSession::new(SessionConfig::default());
        let mut bad = candidate();
        bad.instance_id = "1".to_string();

        let err = session.submit(&bad).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(session.list(None, SortBy::Date).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_unknown() {
        let session = DashboardSession::new(SessionConfig::default());
        let request = session.submit(&candidate()).await.unwrap();
        let err = session.update_status(&request.id, "archivado").await.unwrap_err();
        assert!(matches!(err, CoreError::UnknownStatus(_)));
        assert_eq!(session.get(&request.id).await.unwrap().trace().len(), 1);
    }

    #[tokio::test]
    async fn test_resubmit_validates_form() {
        let session = DashboardSession::new(SessionConfig::default());
        let request = session.submit(&candidate()).await.unwrap();

        let mut edited = candidate();
        edited.justification = "corto".to_string();
        let err = session.resubmit(&request.id, &edited, None).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let edited = candidate().with_expiry_date("2025-12-31");
        let updated = session
            .resubmit(&request.id, &edited, Some(RequestStatus::AuthorizedDg))
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::AuthorizedDg);
        assert_eq!(updated.trace().len(), 2);
        assert!(updated.expiry_date.is_some());
    }

    #[tokio::test]
    async fn test_resubmit_unknown_request() {
        let session = DashboardSession::new(SessionConfig::default());
        let err = session
            .resubmit(&RequestId::from("req-0"), &candidate(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RequestNotFound(_)));
    }

    #[tokio::test]
    async fn test_user_role_cannot_edit_or_export() {
        let config = SessionConfig::default().with_user("Consulta", Role::User);
        let session = DashboardSession::new(config);

        let err = session.edit_instance(1, InstancePatch::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotPermitted(_)));

        let dir = std::env::temp_dir();
        let err = session.export_to(&dir).await.unwrap_err();
        assert!(matches!(err, CoreError::NotPermitted(_)));
    }

    #[tokio::test]
    async fn test_edit_instance_changes_delegable_set() {
        let session = DashboardSession::new(SessionConfig::default());
        let patch = InstancePatch {
            delegable: Some(crate::models::Delegability::Delegable),
            ..Default::default()
        };
        session.edit_instance(1, patch).await.unwrap();
        assert_eq!(session.list_delegable().await.len(), 2);

        let mut c = candidate();
        c.instance_id = "1".to_string();
        assert!(session.submit(&c).await.is_ok());
    }

    #[tokio::test]
    async fn test_stats_and_risk() {
        let session = DashboardSession::new(SessionConfig::default());
        session.submit(&candidate()).await.unwrap();
        session.submit(&overdue_candidate()).await.unwrap();

        let stats = session.stats().await;
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.active_instances, 2);

        // 1 of 2 urgent is not above half
        assert_eq!(session.risk().await.bottleneck_risk.as_str(), "Bajo");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_reports_overdue() {
        let config = SessionConfig::default().with_sweep_interval(Duration::from_secs(60));
        let session = DashboardSession::new(config);
        let overdue = session.submit(&overdue_candidate()).await.unwrap();
        session.submit(&candidate()).await.unwrap();

        let mut rx = session.subscribe();
        let sweep = session.start_overdue_sweep();

        tokio::time::advance(Duration::from_secs(61)).await;
        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            DashboardEvent::RequestOverdue {
                request_id: overdue.id.clone(),
                expiry_date: overdue.expiry_date.unwrap(),
            }
        );

        sweep.stop().await;
        // Store untouched by the sweep
        assert_eq!(session.list(None, SortBy::Date).await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_does_not_fire_before_first_period() {
        let session = DashboardSession::new(SessionConfig::default());
        session.submit(&overdue_candidate()).await.unwrap();

        let mut rx = session.subscribe();
        let sweep = session.start_overdue_sweep();

        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));

        sweep.stop().await;
    }

    #[tokio::test]
    async fn test_sweep_stop_finishes_task() {
        let session = DashboardSession::new(SessionConfig::default());
        let sweep = session.start_overdue_sweep();
        assert!(!sweep.is_finished());
        tokio_test::assert_ok!(
            tokio::time::timeout(Duration::from_secs(1), sweep.stop()).await
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_ends_with_session() {
        let session = DashboardSession::new(SessionConfig::default());
        let mut rx = session.subscribe();
        let sweep = session.start_overdue_sweep();

        drop(session);
        tokio::time::advance(Duration::from_secs(61)).await;

        // The task held the last sender; it closes once the task exits
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(sweep.is_finished());
    }
}
