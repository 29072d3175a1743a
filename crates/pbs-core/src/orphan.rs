// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Orphan flag maintenance.
//!
//! A non-hub node is orphaned iff its network holds no hub. Flags are written
//! eagerly with a rollback compensation; observers hear about a change only
//! after commit and only when the flag actually flipped.
use std::sync::Arc;

use tracing::debug;

use crate::ident::Eid;
use crate::network::Network;
use crate::ports::OrphanObserver;
use crate::uow::UnitOfWork;

/// A flag flip produced by [`OrphanTracker::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrphanTransition {
    /// Node whose flag changed.
    pub node: Eid,
    /// New value.
    pub orphaned: bool,
}

/// Recomputes orphan flags and fans out change notifications.
#[derive(Default)]
pub struct OrphanTracker {
    observers: Vec<Arc<dyn OrphanObserver>>,
}

impl OrphanTracker {
    /// Creates a tracker with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an orphan-change observer.
    pub fn subscribe(&mut self, observer: Arc<dyn OrphanObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Brings every member's flag in line with the network's hub state.
    pub fn settle(&self, network: &Network, uow: &mut UnitOfWork) -> Vec<OrphanTransition> {
        let orphaned = network.is_orphaned();
        let mut transitions = Vec::new();
        for node in network.nodes() {
            let wanted = orphaned && !node.is_hub();
            let previous = node.is_orphaned();
            if previous == wanted {
                continue;
            }
            node.set_orphaned(wanted);
            let restore = Arc::clone(node);
            uow.compensate(move || restore.set_orphaned(previous));
            transitions.push(OrphanTransition {
                node: node.eid(),
                orphaned: wanted,
            });
        }
        debug!(
            members = network.len(),
            orphaned,
            flipped = transitions.len(),
            "settled orphan flags"
        );
        if !transitions.is_empty() && !self.observers.is_empty() {
            let observers = self.observers.clone();
            let pending = transitions.clone();
            uow.on_success(move || {
                for transition in &pending {
                    for observer in &observers {
                        observer.orphan_changed(transition.node, transition.orphaned);
                    }
                }
            });
        }
        transitions
    }
}

impl std::fmt::Debug for OrphanTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrphanTracker")
            .field("observers", &self.observers.len())
            .finish()
    }
}
