//! Delegation request lifecycle
//!
//! Statuses and their priorities, validation of submitted forms, the request
//! record with its status trail, and the in-memory store that owns them.

pub mod request;
pub mod status;
pub mod store;
pub mod validator;

pub use request::{DelegationRequest, RequestId, RequestPatch, TraceEntry};
pub use status::{RequestStatus, StatusDefinition};
pub use store::{RequestStore, SortBy};
pub use validator::{validate, RequestCandidate, ValidatedRequest};
