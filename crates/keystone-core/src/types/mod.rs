//! Domain records owned or read by the broker.

pub mod agent;
pub mod challenge;
pub mod credential;
pub mod grant;
pub mod identity;

pub use agent::{Agent, AgentEnrollment, AgentSession, AgentStatus, EnrolledAgent};
pub use challenge::Challenge;
pub use credential::{CredentialClaims, CredentialKind, CredentialVerification};
pub use grant::{
    Grant, GrantFilter, GrantRequest, GrantRequestInput, GrantStatus, GrantType, GrantUpdate,
};
pub use identity::{agent_identity, IdentityRef, Principal, PrincipalKind, AGENT_IDENTITY_PREFIX};
