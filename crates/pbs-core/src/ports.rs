// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Collaborator ports: access checks and post-commit outbound effects.
//!
//! Outbound ports are only ever called from `on_success` hooks of a
//! [`crate::UnitOfWork`], so a rolled-back operation never reaches them.
use thiserror::Error;

use crate::ident::{ActorId, Eid, ZoneId};
use crate::node::PbsNode;

/// Rejection from an [`AccessCheck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("access denied")]
pub struct AccessDenied;

/// Decides whether an actor may operate a node.
pub trait AccessCheck: Send + Sync {
    /// `Ok(())` when `actor` may operate `node`.
    fn check_access(&self, node: &dyn PbsNode, actor: ActorId) -> Result<(), AccessDenied>;
}

/// Pushes "node updated" notices to observers of a network.
pub trait Broadcaster: Send + Sync {
    /// The listed nodes changed (edges, owner or flags).
    fn node_updated(&self, nodes: &[Eid]);
}

/// Kind of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    /// An edge was created.
    Connected,
    /// An edge was removed.
    Disconnected,
    /// A node went online (joined a base) or offline (orphaned).
    OnlineStateChanged {
        /// `true` when the node is now reachable from a base.
        online: bool,
    },
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Who triggered the change; `None` for system-driven changes.
    pub actor: Option<ActorId>,
    /// What happened.
    pub event: AuditEvent,
    /// Affected nodes, initiating node first.
    pub nodes: Vec<Eid>,
    /// Zone of the initiating node.
    pub zone: ZoneId,
}

/// Sink for [`AuditEntry`] records.
pub trait AuditLog: Send + Sync {
    /// Appends one entry.
    fn append(&self, entry: AuditEntry);
}

/// Orphan-change subscription.
pub trait OrphanObserver: Send + Sync {
    /// `node` transitioned to `orphaned`. Called once per transition.
    fn orphan_changed(&self, node: Eid, orphaned: bool);
}

/// Port implementation that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Broadcaster for NullSink {
    fn node_updated(&self, _nodes: &[Eid]) {}
}

impl AuditLog for NullSink {
    fn append(&self, _entry: AuditEntry) {}
}

/// Access check that admits every actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessCheck for AllowAll {
    fn check_access(&self, _node: &dyn PbsNode, _actor: ActorId) -> Result<(), AccessDenied> {
        Ok(())
    }
}
