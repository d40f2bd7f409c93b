//! In-memory store of delegation requests
//!
//! The store exclusively owns the request collection. Every operation runs to
//! completion synchronously; callers sharing a store across tasks must
//! serialize access themselves.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::{DelegationRequest, RequestId, RequestIdGenerator, RequestPatch};
use super::validator::ValidatedRequest;
use crate::error::{CoreError, Result};

/// Ordering for request listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Newest first
    #[default]
    Date,
    /// Highest catalog priority first
    Status,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::Status => "status",
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortBy::Date),
            "status" => Ok(SortBy::Status),
            _ => Err(format!("Invalid sort key: {}", s)),
        }
    }
}

/// Collection of delegation requests in insertion order
#[derive(Debug, Default)]
pub struct RequestStore {
    requests: Vec<DelegationRequest>,
    ids: RequestIdGenerator,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing requests. New ids continue past the highest
    /// generated id already present.
    pub fn from_requests(requests: Vec<DelegationRequest>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(requests.len());
        let mut ids = RequestIdGenerator::new();
        for request in &requests {
            if !seen.insert(request.id.clone()) {
                return Err(CoreError::DuplicateRequest(request.id.clone()));
            }
            if let Some(seq) = request.id.sequence() {
                ids.observe(seq);
            }
        }
        Ok(Self { requests, ids })
    }

    pub fn requests(&self) -> &[DelegationRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn get(&self, id: &RequestId) -> Result<&DelegationRequest> {
        self.requests
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| CoreError::RequestNotFound(id.clone()))
    }

    pub fn create(&mut self, validated: ValidatedRequest, requested_by: &str) -> DelegationRequest {
        self.create_at(validated, requested_by, Utc::now())
    }

    /// Append a new request with status `solicitada` and one trail entry
    pub fn create_at(
        &mut self,
        validated: ValidatedRequest,
        requested_by: &str,
        now: DateTime<Utc>,
    ) -> DelegationRequest {
        let id = self.ids.next(now);
        let request = DelegationRequest::new(id, validated, requested_by, now);

        tracing::info!(
            request_id = %request.id,
            instance_id = request.instance_id,
            "Created delegation request"
        );

        self.requests.push(request.clone());
        request
    }

    pub fn update(&mut self, id: &RequestId, patch: &RequestPatch) -> Result<DelegationRequest> {
        self.update_at(id, patch, Utc::now())
    }

    /// Merge `patch` into the stored request. On error the store is unchanged.
    pub fn update_at(
        &mut self,
        id: &RequestId,
        patch: &RequestPatch,
        now: DateTime<Utc>,
    ) -> Result<DelegationRequest> {
        let slot = self
            .requests
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| CoreError::RequestNotFound(id.clone()))?;

        let next = slot.merged(patch, now)?;

        if next.status != slot.status {
            tracing::info!(
                request_id = %id,
                from = %slot.status,
                to = %next.status,
                "Delegation request status changed"
            );
        } else {
            tracing::info!(request_id = %id, "Updated delegation request");
        }

        *slot = next;
        Ok(slot.clone())
    }

    /// Remove a request permanently
    pub fn delete(&mut self, id: &RequestId) -> Result<DelegationRequest> {
        let index = self
            .requests
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| CoreError::RequestNotFound(id.clone()))?;

        let removed = self.requests.remove(index);
        tracing::info!(request_id = %id, "Deleted delegation request");
        Ok(removed)
    }

    /// Requests whose delegate matches `search` (case-insensitive substring),
    /// sorted by `sort`. The sort is stable.
    pub fn list(&self, search: Option<&str>, sort: SortBy) -> Vec<&DelegationRequest> {
        let needle = search.filter(|s| !s.is_empty()).map(str::to_lowercase);

        let mut result: Vec<&DelegationRequest> = self
            .requests
            .iter()
            .filter(|r| match &needle {
                Some(needle) => r.proposed_delegate.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();

        match sort {
            SortBy::Date => result.sort_by(|a, b| b.date.cmp(&a.date)),
            SortBy::Status => result.sort_by(|a, b| b.status.priority().cmp(&a.status.priority())),
        }

        tracing::debug!(count = result.len(), sort = sort.as_str(), "Listed delegation requests");
        result
    }

    /// Requests with an expiry date before `as_of`, in insertion order
    pub fn overdue(&self, as_of: DateTime<Utc>) -> Vec<&DelegationRequest> {
        self.requests.iter().filter(|r| r.is_overdue(as_of)).collect()
    }
}
