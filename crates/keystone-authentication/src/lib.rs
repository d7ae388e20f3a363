//! # Keystone Authentication - Agents
//!
//! **Purpose**: Register agents and authenticate them without passwords.
//!
//! - `EnrollmentService`: admin-only enrollment and deactivation
//! - `AgentAuthenticator`: challenge issuance, challenge-response
//!   authentication, and bearer credential resolution
//!
//! # Architecture Constraints
//!
//! Agent records belong to the identity collaborator behind
//! `AgentDirectoryEffects`. Challenges belong to the `ChallengeLedger`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod challenge;
pub mod enrollment;

pub use challenge::{AgentAuthenticator, IssuedChallenge};
pub use enrollment::EnrollmentService;
