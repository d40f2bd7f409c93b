//! Delegation requests and their status trail
//!
//! A request records a proposed delegate for one delegable instance and keeps
//! an append-only trail (trazabilidad) of every status it has been given.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::status::RequestStatus;
use super::validator::{parse_date, ValidatedRequest};
use crate::error::{CoreError, Result};
use crate::models::Urgency;

const ID_PREFIX: &str = "req-";

/// Identifier of a delegation request, `req-<millis>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric part of a generated id, if the id has the generated shape
    pub fn sequence(&self) -> Option<i64> {
        self.0.strip_prefix(ID_PREFIX)?.parse().ok()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Hands out ids derived from the creation time in milliseconds.
///
/// Two ids generated in the same millisecond (or with a clock that moved
/// backwards) are bumped past the last one issued, so ids never repeat within
/// a process.
#[derive(Debug, Clone, Default)]
pub struct RequestIdGenerator {
    last: Option<i64>,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never issue a sequence at or below `seq`
    pub fn observe(&mut self, seq: i64) {
        self.last = Some(self.last.map_or(seq, |last| last.max(seq)));
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> RequestId {
        let millis = now.timestamp_millis();
        let seq = match self.last {
            Some(last) if millis <= last => match last.checked_add(1) {
                Some(seq) => seq,
                // Sequence space exhausted; these ids carry no sequence
                None => {
                    return RequestId(format!(
                        "{}{}-{}",
                        ID_PREFIX,
                        millis,
                        Uuid::new_v4().simple()
                    ))
                }
            },
            _ => millis,
        };
        self.last = Some(seq);
        RequestId(format!("{}{}", ID_PREFIX, seq))
    }
}

/// One entry of the status trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    #[serde(rename = "estado")]
    pub status: RequestStatus,
    #[serde(rename = "fecha")]
    pub timestamp: DateTime<Utc>,
}

/// A request to delegate authority for one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationRequest {
    pub id: RequestId,
    pub instance_id: u32,
    pub proposed_delegate: String,
    pub justification: String,
    #[serde(rename = "fechaDesignacion")]
    pub designation_date: NaiveDate,
    #[serde(
        rename = "fechaVencimiento",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_date"
    )]
    pub expiry_date: Option<NaiveDate>,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub requested_by: String,
    /// Creation timestamp
    pub date: DateTime<Utc>,
    #[serde(rename = "trazabilidad")]
    trace: Vec<TraceEntry>,
}

impl DelegationRequest {
    /// Build a freshly submitted request with its first trail entry
    pub fn new(
        id: RequestId,
        validated: ValidatedRequest,
        requested_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let status = RequestStatus::Requested;
        Self {
            id,
            instance_id: validated.instance_id,
            proposed_delegate: validated.proposed_delegate,
            justification: validated.justification,
            designation_date: validated.designation_date,
            expiry_date: validated.expiry_date,
            urgency: validated.urgency,
            status,
            requested_by: requested_by.into(),
            date: now,
            trace: vec![TraceEntry {
                status,
                timestamp: now,
            }],
        }
    }

    /// Status trail, oldest first
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    fn record_status(&mut self, status: RequestStatus, at: DateTime<Utc>) {
        self.status = status;
        self.trace.push(TraceEntry {
            status,
            timestamp: at,
        });
    }

    /// Midnight UTC of the expiry date is the cut-off.
    pub fn is_overdue(&self, as_of: DateTime<Utc>) -> bool {
        self.expiry_date
            .map(|expiry| expiry.and_time(chrono::NaiveTime::MIN).and_utc() < as_of)
            .unwrap_or(false)
    }

    /// Return a copy with `patch` merged in; `self` is left untouched.
    pub fn merged(&self, patch: &RequestPatch, now: DateTime<Utc>) -> Result<Self> {
        let mut next = self.clone();

        if let Some(instance_id) = patch.instance_id {
            next.instance_id = instance_id;
        }
        if let Some(delegate) = &patch.proposed_delegate {
            next.proposed_delegate = delegate.clone();
        }
        if let Some(justification) = &patch.justification {
            next.justification = justification.clone();
        }
        if let Some(designation) = patch.designation_date {
            next.designation_date = designation;
        }
        if let Some(expiry) = patch.expiry_date {
            next.expiry_date = expiry;
        }
        if let Some(urgency) = patch.urgency {
            next.urgency = urgency;
        }

        if patch.touches_dates() {
            if let Some(expiry) = next.expiry_date {
                if expiry < next.designation_date {
                    return Err(CoreError::DateOrderViolation {
                        designation: next.designation_date,
                        expiry,
                    });
                }
            }
        }

        // Re-affirming the current status is still recorded
        if let Some(status) = patch.status {
            next.record_status(status, now);
        }

        Ok(next)
    }
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date: {}", s))),
    }
}

/// Changes to apply to a stored request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPatch {
    pub instance_id: Option<u32>,
    pub proposed_delegate: Option<String>,
    pub justification: Option<String>,
    pub designation_date: Option<NaiveDate>,
    /// `Some(None)` clears the expiry date
    pub expiry_date: Option<Option<NaiveDate>>,
    pub urgency: Option<Urgency>,
    pub status: Option<RequestStatus>,
}

impl RequestPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_designation_date(mut self, date: NaiveDate) -> Self {
        self.designation_date = Some(date);
        self
    }

    pub fn with_expiry_date(mut self, date: Option<NaiveDate>) -> Self {
        self.expiry_date = Some(date);
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    pub fn with_proposed_delegate(mut self, delegate: impl Into<String>) -> Self {
        self.proposed_delegate = Some(delegate.into());
        self
    }

    pub fn touches_dates(&self) -> bool {
        self.designation_date.is_some() || self.expiry_date.is_some()
    }
}

/// A re-validated form replaces every editable field
impl From<ValidatedRequest> for RequestPatch {
    fn from(validated: ValidatedRequest) -> Self {
        Self {
            instance_id: Some(validated.instance_id),
            proposed_delegate: Some(validated.proposed_delegate),
            justification: Some(validated.justification),
            designation_date: Some(validated.designation_date),
            expiry_date: Some(validated.expiry_date),
            urgency: Some(validated.urgency),
            status: None,
        }
    }
}
