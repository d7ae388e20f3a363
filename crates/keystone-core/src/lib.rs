//! # Keystone Core - Foundation
//!
//! **Purpose**: Shared vocabulary for the grant broker.
//!
//! - Domain records: agents, grants, challenges, credential claims
//! - The unified `KeystoneError` type
//! - Effect traits for storage, time, randomness, signatures, credentials and
//!   the identity collaborator
//! - `KeystoneConfig` and structural request validation
//!
//! # Architecture Constraints
//!
//! This crate has no effect handlers and performs no I/O of its own (config
//! file loading aside). Handlers live in `keystone-effects`; ledgers in
//! `keystone-store`; policy in `keystone-authorization`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod effects;
pub mod errors;
pub mod time;
pub mod types;
pub mod validation;

pub use config::KeystoneConfig;
pub use errors::{KeystoneError, Result};
pub use time::PhysicalTime;
pub use types::{
    agent_identity, Agent, AgentEnrollment, AgentSession, AgentStatus, Challenge,
    CredentialClaims, CredentialKind, CredentialVerification, EnrolledAgent, Grant, GrantFilter,
    GrantRequest, GrantRequestInput, GrantStatus, GrantType, GrantUpdate, IdentityRef, Principal,
    PrincipalKind,
};
