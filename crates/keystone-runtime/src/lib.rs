//! # Keystone Runtime - Assembly
//!
//! **Purpose**: Build the broker once from `KeystoneConfig` and hand out
//! references to its services.
//!
//! There is no global state: whoever owns the process (the CLI, a server, a
//! test) constructs a `Broker` and passes it to whatever needs it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod broker;

pub use broker::{load_or_create_signing_secret, Broker, BrokerEffects, SharedStorage, SIGNING_KEY_KEY};
