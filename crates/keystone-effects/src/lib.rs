//! # Keystone Effects - Infrastructure Handlers
//!
//! Stateless implementations of the effect traits defined in `keystone-core`:
//!
//! - Storage: in-memory and filesystem key-value handlers
//! - Time: system clock and a manually driven simulated clock
//! - Random: thread-local CSPRNG
//! - Crypto: `ssh-ed25519` signature verification
//! - Credentials: EdDSA compact JWS signing and verification
//! - Identity: static admin list
//!
//! Deterministic randomness for tests lives in `keystone-testkit`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod crypto;
pub mod identity;
pub mod random;
pub mod storage;
pub mod time;

pub use credential::Ed25519CredentialHandler;
pub use crypto::{encode_ssh_ed25519, parse_ssh_ed25519, Ed25519SignatureHandler};
pub use identity::StaticAdminHandler;
pub use random::RealRandomHandler;
pub use storage::{FilesystemStorageHandler, MemoryStorageHandler};
pub use time::{RealTimeHandler, SimulatedTimeHandler};
