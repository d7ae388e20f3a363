//! # Keystone Grants - Grant Lifecycle
//!
//! **Purpose**: Move grants through their lifecycle and turn approved grants
//! into credentials.
//!
//! - `state_machine`: pure transition rules
//! - `GrantService`: create, approve, deny, revoke, use, introspect, list,
//!   token issuance and credential verification
//!
//! # Architecture Constraints
//!
//! The service holds no state of its own. Ledgers and collaborators are
//! constructed once by the runtime and injected here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod service;
pub mod state_machine;

pub use credential::{authz_expiry, GrantCredential, VerificationOutcome};
pub use service::{GrantConfig, GrantService};
pub use state_machine::{Transition, TransitionOutcome};
