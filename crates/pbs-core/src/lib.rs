// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! pbs-core: network topology and connection engine for player-built
//! structures.
//!
//! Structures ("nodes") are wired into directed graphs. A network is the set
//! of nodes reachable over edges in either direction; it holds at most one
//! docking base, and every member of a base-less network is flagged orphaned.
//! [`ConnectionEngine`] owns the per-node edge caches and implements connect,
//! break, reweight and force-remove on top of an injected
//! [`ConnectionStore`], [`NodeDirectory`] and [`AccessCheck`].
//!
//! Every mutation runs inside a [`UnitOfWork`]. Side effects visible to other
//! subsystems (broadcasts, audit entries, orphan events, reinforcement
//! alignment) are deferred until the store commits.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod config;
mod connection;
mod engine;
mod error;
mod handler;
mod ident;
mod network;
mod node;
mod orphan;
mod ports;
mod reinforcement;
mod store;
mod uow;
mod validator;

/// Engine tuning.
pub use config::{EngineConfig, DEFAULT_HUBLESS_BANDWIDTH_LIMIT};
/// Edge rows, per-node views and weight helpers.
pub use connection::{
    carries_throughput, clamp_weight, initial_weight, Connection, ConnectionRow, Direction,
    DEFAULT_THROUGHPUT_WEIGHT, MAX_WEIGHT, MIN_WEIGHT,
};
/// The topology engine.
pub use engine::ConnectionEngine;
/// Engine error type.
pub use error::PbsError;
/// Per-node edge cache.
pub use handler::ConnectionHandler;
/// Identifier newtypes.
pub use ident::{ActorId, EdgeId, Eid, OwnerId, ReinforcementOffset, ZoneId};
/// Derived reachable sets.
pub use network::{Network, NetworkSummary};
/// Node capability contract.
pub use node::{FacilityKind, NodeDirectory, NodeKind, PbsNode, Position, TypeLimits};
/// Orphan flag maintenance.
pub use orphan::{OrphanTracker, OrphanTransition};
/// Collaborator ports.
pub use ports::{
    AccessCheck, AccessDenied, AllowAll, AuditEntry, AuditEvent, AuditLog, Broadcaster, NullSink,
    OrphanObserver,
};
/// Post-merge reinforcement alignment.
pub use reinforcement::schedule_propagation;
/// Persistence boundary.
pub use store::{ConnectionStore, MemoryConnectionStore, StoreError};
/// Unit of work.
pub use uow::{TxId, UnitOfWork};
/// Type compatibility rules.
pub use validator::validate;
