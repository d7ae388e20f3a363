//! Keystone Testing Infrastructure
//!
//! Deterministic fixtures shared by the integration tests of every crate.
//!
//! ```toml
//! [dev-dependencies]
//! keystone-testkit = { path = "../keystone-testkit" }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod agent;
pub mod broker;
pub mod random;

pub use agent::TestAgent;
pub use broker::{grant_input, TestBroker, TEST_ADMIN, TEST_EPOCH_MS};
pub use random::MockRandomHandler;

pub use keystone_effects::SimulatedTimeHandler;
