//! Effect trait definitions
//!
//! Pure trait definitions for every side effect the broker performs. This
//! module defines **what** can be done; handlers in `keystone-effects` (and
//! the key-value directory in `keystone-store`) define **how**.
//!
//! # Effect Classification
//!
//! - **Infrastructure**: storage, time, random, signature verification,
//!   credential signing. Stateless handlers in `keystone-effects`.
//! - **Identity collaborator**: agent directory and admin standing. Owned by
//!   the identity system; the broker only reads (and enrolls through) it.
//!
//! All effect-using code is parameterized by these traits, so tests swap in
//! deterministic handlers from `keystone-testkit`.

pub mod credential;
pub mod crypto;
pub mod identity;
pub mod random;
pub mod storage;
pub mod time;

pub use credential::CredentialEffects;
pub use crypto::{CryptoError, SignatureEffects};
pub use identity::{AgentDirectoryEffects, IdentityEffects};
pub use random::RandomCoreEffects;
pub use storage::{StorageCoreEffects, StorageError};
pub use time::{PhysicalTimeEffects, TimeError};
