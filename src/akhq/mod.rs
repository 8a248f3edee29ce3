//! AKHQ claim provider
//!
//! AKHQ asks the control plane which resources an authenticated user may
//! see. The answer is built from the ACEs granted to the namespaces the
//! user's groups support, compiled into anchored regular expressions.
//!
//! Three response shapes are served from the same compilation:
//!
//! - legacy: roles plus an `attributes` map of filters
//! - v2: roles plus flat filter fields
//! - v3: role groups, each restricted to patterns and clusters

pub mod claim;
pub mod patterns;
pub mod types;

pub use claim::AkhqClaimProvider;
pub use patterns::{
    compute_allowed_patterns, ALLOW_ALL_PATTERN, ALL_CLUSTERS_PATTERN, DENY_ALL_PATTERN,
};
pub use types::{
    AkhqClaimRequest, AkhqClaimResponse, AkhqClaimResponseV2, AkhqClaimResponseV3, AkhqGroup,
};
