//! Periodic overdue sweep
//!
//! A background task that scans the store for overdue requests and raises a
//! `RequestOverdue` event for each one. It only reads; a skipped or late tick
//! loses nothing because the next tick rescans everything.

use std::sync::Weak;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::events::DashboardEvent;
use crate::session::DashboardState;

const MIN_PERIOD: Duration = Duration::from_millis(100);

/// Scan once and emit an event per overdue request. Returns how many were found.
pub async fn sweep_once(
    state: &RwLock<DashboardState>,
    events: &broadcast::Sender<DashboardEvent>,
    as_of: DateTime<Utc>,
) -> usize {
    let overdue: Vec<DashboardEvent> = {
        let state = state.read().await;
        state
            .requests
            .overdue(as_of)
            .into_iter()
            .filter_map(|r| {
                r.expiry_date.map(|expiry_date| DashboardEvent::RequestOverdue {
                    request_id: r.id.clone(),
                    expiry_date,
                })
            })
            .collect()
    };

    let count = overdue.len();
    for event in overdue {
        if let Some(id) = event.request_id() {
            tracing::warn!(request_id = %id, "Delegation request overdue");
        }
        let _ = events.send(event);
    }
    count
}

/// Owns the running sweep task. Dropping the handle aborts the task; the task
/// also ends on its next tick once the session state is gone.
pub struct SweepHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Start sweeping every `period`, first tick one period from now
    pub fn spawn(
        state: Weak<RwLock<DashboardState>>,
        events: broadcast::Sender<DashboardEvent>,
        period: Duration,
    ) -> Self {
        let period = period.max(MIN_PERIOD);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let Some(state) = state.upgrade() else { break };
                        let found = sweep_once(&state, &events, Utc::now()).await;
                        tracing::debug!(overdue = found, "Overdue sweep tick");
                    }
                }
            }

            tracing::debug!("Overdue sweep stopped");
        });

        tracing::info!(period_secs = period.as_secs_f64(), "Overdue sweep started");

        Self {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Signal the task and wait for it to finish
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Overdue sweep task failed: {}", e);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
