//! Dashboard statistics
//!
//! Pure functions over the current requests and instances. Nothing is cached;
//! callers that want memoization can wrap these themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delegation::{DelegationRequest, RequestStatus};
use crate::models::{Instance, Urgency};

/// Counts shown on the dashboard cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_requests: usize,
    /// Still `solicitada`
    pub pending: usize,
    /// `firmado` or `publicado`
    pub approved: usize,
    pub active_instances: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Alto")]
    High,
    #[serde(rename = "Bajo")]
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "Alto",
            RiskLevel::Low => "Bajo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub bottleneck_risk: RiskLevel,
    /// Share of `Alta` requests, 0 when there are none
    pub urgency_ratio: f64,
}

/// Above this share of urgent requests the bottleneck risk is high
pub const HIGH_RISK_RATIO: f64 = 0.5;

pub fn compute_stats(
    requests: &[DelegationRequest],
    instances: &[Instance],
    as_of: DateTime<Utc>,
) -> DashboardStats {
    DashboardStats {
        total_requests: requests.len(),
        pending: requests
            .iter()
            .filter(|r| r.status == RequestStatus::Requested)
            .count(),
        approved: requests.iter().filter(|r| r.status.is_approved()).count(),
        active_instances: instances.iter().filter(|i| i.is_active()).count(),
        overdue: requests.iter().filter(|r| r.is_overdue(as_of)).count(),
    }
}

pub fn compute_risk(requests: &[DelegationRequest]) -> RiskAssessment {
    let urgent = requests
        .iter()
        .filter(|r| r.urgency == Urgency::High)
        .count();
    let urgency_ratio = if requests.is_empty() {
        0.0
    } else {
        urgent as f64 / requests.len() as f64
    };

    let bottleneck_risk = if urgency_ratio > HIGH_RISK_RATIO {
        RiskLevel::High
    } else {
        RiskLevel::Low
    };

    RiskAssessment {
        bottleneck_risk,
        urgency_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::{RequestPatch, RequestStore, ValidatedRequest};
    use crate::models::InstanceStatus;
    use crate::registry::seed_instances;
    use chrono::{NaiveDate, TimeZone};

    fn validated(urgency: Urgency, expiry: Option<&str>) -> ValidatedRequest {
        ValidatedRequest {
            instance_id: 2,
            proposed_delegate: "Juan Perez".to_string(),
            justification: "Cobertura temporal por ausencia".to_string(),
            designation_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            expiry_date: expiry.map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()),
            urgency,
        }
    }

    fn noon(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_stats_empty() {
        let stats = compute_stats(&[], &[], noon(1, 1));
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn test_stats_counts() {
        let mut store = RequestStore::new();
        store.create(validated(Urgency::Normal, None), "Admin");
        let signed = store.create(validated(Urgency::Normal, Some("2025-02-01")), "Admin");
        let published = store.create(validated(Urgency::High, Some("2025-03-01")), "Admin");
        let rejected = store.create(validated(Urgency::Normal, None), "Admin");

        store
            .update(&signed.id, &RequestPatch::new().with_status(RequestStatus::Signed))
            .unwrap();
        store
            .update(&published.id, &RequestPatch::new().with_status(RequestStatus::Published))
            .unwrap();
        store
            .update(&rejected.id, &RequestPatch::new().with_status(RequestStatus::Rejected))
            .unwrap();

        let mut instances = seed_instances();
        instances[0].status = InstanceStatus::Inactive;

        let stats = compute_stats(store.requests(), &instances, noon(2, 15));
        assert_eq!(
            stats,
            DashboardStats {
                total_requests: 4,
                pending: 1,
                approved: 2,
                active_instances: 1,
                overdue: 1,
            }
        );
    }

    #[test]
    fn test_stats_overdue_is_monotonic_in_time() {
        let mut store = RequestStore::new();
        for expiry in ["2025-01-05", "2025-01-10", "2025-01-20"] {
            store.create(validated(Urgency::Normal, Some(expiry)), "Admin");
        }
        let instances = seed_instances();

        let mut last = 0;
        for day in 1..=31 {
            let stats = compute_stats(store.requests(), &instances, noon(1, day));
            assert!(stats.overdue >= last);
            last = stats.overdue;
        }
        assert_eq!(last, 3);
    }

    #[test]
    fn test_stats_is_pure() {
        let mut store = RequestStore::new();
        store.create(validated(Urgency::High, Some("2025-01-05")), "Admin");
        let instances = seed_instances();
        let as_of = noon(1, 10);
        assert_eq!(
            compute_stats(store.requests(), &instances, as_of),
            compute_stats(store.requests(), &instances, as_of)
        );
    }

    #[test]
    fn test_risk_empty_is_low() {
        let risk = compute_risk(&[]);
        assert_eq!(risk.bottleneck_risk, RiskLevel::Low);
        assert_eq!(risk.urgency_ratio, 0.0);
    }

    #[test]
    fn test_risk_high_above_half() {
        let mut store = RequestStore::new();
        for i in 0..10 {
            let urgency = if i < 6 { Urgency::High } else { Urgency::Normal };
            store.create(validated(urgency, None), "Admin");
        }
        let risk = compute_risk(store.requests());
        assert_eq!(risk.bottleneck_risk, RiskLevel::High);
        assert!((risk.urgency_ratio - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_risk_exactly_half_is_low() {
        let mut store = RequestStore::new();
        store.create(validated(Urgency::High, None), "Admin");
        store.create(validated(Urgency::Normal, None), "Admin");
        assert_eq!(compute_risk(store.requests()).bottleneck_risk, RiskLevel::Low);
    }

    #[test]
    fn test_risk_serialization() {
        let json = serde_json::to_value(compute_risk(&[])).unwrap();
        assert_eq!(json["bottleneckRisk"], "Bajo");
    }
}
