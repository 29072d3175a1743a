// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for PBS crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`access`] - Scriptable access check
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`fixture`] - Engine wired to every double, plus topology invariant checks
//! - [`node`] - Mutex-backed `PbsNode` and per-kind limits
//! - [`recorders`] - Recording broadcaster, audit log and orphan observer
//! - [`registry`] - `NodeDirectory` over a map of test nodes
//! - [`store`] - Fault-injecting connection store

pub mod access;
pub mod config;
pub mod fixture;
pub mod node;
pub mod recorders;
pub mod registry;
pub mod store;

// Re-export commonly used items at crate root for convenience
pub use access::ScriptedAccess;
pub use config::InMemoryConfigStore;
pub use fixture::{NetworkFixture, ACTOR};
pub use node::{standard_limits, TestNode};
pub use recorders::{RecordingAuditLog, RecordingBroadcaster, RecordingOrphanObserver};
pub use registry::NodeRegistry;
pub use store::{FlakyStore, StoreSwitches};
