// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording implementations of the outbound ports.

use pbs_core::{AuditEntry, AuditEvent, AuditLog, Broadcaster, Eid, OrphanObserver};
use std::collections::BTreeSet;
use std::sync::Mutex;

fn locked<T: Clone>(cell: &Mutex<T>) -> T {
    cell.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Keeps every `node_updated` call.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    calls: Mutex<Vec<Vec<Eid>>>,
}

impl RecordingBroadcaster {
    /// Recorded calls in order.
    pub fn calls(&self) -> Vec<Vec<Eid>> {
        locked(&self.calls)
    }

    /// Every node mentioned by any call.
    pub fn updated(&self) -> BTreeSet<Eid> {
        self.calls().into_iter().flatten().collect()
    }

    /// Forgets recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn node_updated(&self, nodes: &[Eid]) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(nodes.to_vec());
    }
}

/// Keeps every appended audit entry.
#[derive(Debug, Default)]
pub struct RecordingAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditLog {
    /// Recorded entries in order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        locked(&self.entries)
    }

    /// Recorded events in order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.entries().into_iter().map(|e| e.event).collect()
    }

    /// Forgets recorded entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl AuditLog for RecordingAuditLog {
    fn append(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }
}

/// Keeps every orphan flag change notification.
#[derive(Debug, Default)]
pub struct RecordingOrphanObserver {
    changes: Mutex<Vec<(Eid, bool)>>,
}

impl RecordingOrphanObserver {
    /// Recorded `(node, orphaned)` pairs in order.
    pub fn changes(&self) -> Vec<(Eid, bool)> {
        locked(&self.changes)
    }

    /// Forgets recorded changes.
    pub fn clear(&self) {
        self.changes.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl OrphanObserver for RecordingOrphanObserver {
    fn orphan_changed(&self, node: Eid, orphaned: bool) {
        self.changes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((node, orphaned));
    }
}
