//! # Keystone Store - Ledgers
//!
//! **Purpose**: Own grant and challenge records.
//!
//! - `GrantLedger`: grants keyed by id with status- and requester-scoped scans
//! - `ChallengeLedger`: single-use, expiring authentication nonces
//! - `StorageAgentDirectory`: a key-value agent registry for deployments that
//!   do not bring their own identity collaborator
//!
//! Every implementation here runs over `StorageCoreEffects`, so any backend
//! with per-key atomicity, prefix listing and an atomic `take` is
//! substitutable.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent_directory;
pub mod challenge_ledger;
pub mod grant_ledger;
mod records;

pub use agent_directory::{agent_key, StorageAgentDirectory};
pub use challenge_ledger::{
    challenge_key, is_well_formed_token, ChallengeLedger, StorageChallengeLedger,
    CHALLENGE_TOKEN_BYTES,
};
pub use grant_ledger::{grant_key, sort_newest_first, GrantLedger, StorageGrantLedger};
pub use records::{AGENT_PREFIX, CHALLENGE_PREFIX, GRANT_PREFIX};
