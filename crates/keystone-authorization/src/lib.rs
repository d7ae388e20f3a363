//! # Keystone Authorization - Grant Policy
//!
//! **Purpose**: Who may act on a grant, and which grants a caller may see.
//!
//! - `AuthorizationPolicy`: approver-or-admin for decisions, requesting agent
//!   for token issuance
//! - `VisibilityFilter`: caller-scoped grant listings
//!
//! # Architecture Constraints
//!
//! Policy never mutates grants. Both components read the grant ledger and the
//! identity collaborator only; state transitions belong to `keystone-grants`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod policy;
pub mod visibility;

pub use policy::{decide, AccessDecision, AuthorizationPolicy, GrantAction};
pub use visibility::{GrantVisibility, VisibilityFilter};
