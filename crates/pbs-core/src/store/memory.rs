// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory connection store with an undo journal.

use std::collections::BTreeMap;

use tracing::debug;

use super::{ConnectionStore, StoreError};
use crate::connection::ConnectionRow;
use crate::ident::{EdgeId, Eid};

#[derive(Debug, Clone, Copy)]
enum JournalEntry {
    Inserted(EdgeId),
    Deleted(ConnectionRow),
    Reweighted { id: EdgeId, previous: f64 },
}

/// In-memory [`ConnectionStore`].
///
/// Writes apply immediately and are journaled until [`commit`] or
/// [`rollback`]. Rollback replays the journal in reverse. Edge ids are never
/// reused, including ids handed out by a rolled-back insert.
///
/// Enforces the row constraints a database schema would: no self edge and at
/// most one row per ordered `(source, target)` pair.
///
/// [`commit`]: ConnectionStore::commit
/// [`rollback`]: ConnectionStore::rollback
#[derive(Debug, Default)]
pub struct MemoryConnectionStore {
    rows: BTreeMap<EdgeId, ConnectionRow>,
    journal: Vec<JournalEntry>,
    next_id: u64,
}

impl MemoryConnectionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently visible.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no rows are visible.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of uncommitted writes.
    pub fn pending_writes(&self) -> usize {
        self.journal.len()
    }

    /// All visible rows in id order.
    pub fn rows(&self) -> impl Iterator<Item = &ConnectionRow> {
        self.rows.values()
    }

    /// Looks up the row for the ordered pair, if any.
    pub fn find(&self, source: Eid, target: Eid) -> Option<&ConnectionRow> {
        self.rows
            .values()
            .find(|row| row.source == source && row.target == target)
    }
}

impl ConnectionStore for MemoryConnectionStore {
    fn load_edges(&self, node: Eid) -> Result<Vec<ConnectionRow>, StoreError> {
        Ok(self
            .rows
            .values()
            .filter(|row| row.touches(node))
            .copied()
            .collect())
    }

    fn insert_edge(
        &mut self,
        source: Eid,
        target: Eid,
        weight: f64,
    ) -> Result<EdgeId, StoreError> {
        if source == target {
            return Err(StoreError::Constraint(format!("self edge on {source}")));
        }
        if self.find(source, target).is_some() {
            return Err(StoreError::Constraint(format!(
                "duplicate edge {source} -> {target}"
            )));
        }
        self.next_id += 1;
        let id = EdgeId(self.next_id);
        self.rows.insert(
            id,
            ConnectionRow {
                id,
                source,
                target,
                weight,
            },
        );
        self.journal.push(JournalEntry::Inserted(id));
        Ok(id)
    }

    fn delete_edge(&mut self, id: EdgeId) -> Result<(), StoreError> {
        let row = self.rows.remove(&id).ok_or(StoreError::MissingRow(id))?;
        self.journal.push(JournalEntry::Deleted(row));
        Ok(())
    }

    fn update_weight(&mut self, id: EdgeId, weight: f64) -> Result<(), StoreError> {
        let row = self.rows.get_mut(&id).ok_or(StoreError::MissingRow(id))?;
        let previous = row.weight;
        row.weight = weight;
        self.journal.push(JournalEntry::Reweighted { id, previous });
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        debug!(writes = self.journal.len(), "memory store commit");
        self.journal.clear();
        Ok(())
    }

    fn rollback(&mut self) {
        debug!(writes = self.journal.len(), "memory store rollback");
        while let Some(entry) = self.journal.pop() {
            match entry {
                JournalEntry::Inserted(id) => {
                    self.rows.remove(&id);
                }
                JournalEntry::Deleted(row) => {
                    self.rows.insert(row.id, row);
                }
                JournalEntry::Reweighted { id, previous } => {
                    if let Some(row) = self.rows.get_mut(&id) {
                        row.weight = previous;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn load_returns_both_directions() {
        let mut store = MemoryConnectionStore::new();
        store.insert_edge(Eid(1), Eid(2), 0.0).unwrap();
        store.insert_edge(Eid(3), Eid(1), 0.0).unwrap();
        store.insert_edge(Eid(3), Eid(2), 0.0).unwrap();
        let rows = store.load_edges(Eid(1)).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.touches(Eid(1))));
    }

    #[test]
    fn rejects_self_and_duplicate_edges() {
        let mut store = MemoryConnectionStore::new();
        assert!(matches!(
            store.insert_edge(Eid(1), Eid(1), 0.0),
            Err(StoreError::Constraint(_))
        ));
        store.insert_edge(Eid(1), Eid(2), 0.0).unwrap();
        assert!(matches!(
            store.insert_edge(Eid(1), Eid(2), 0.0),
            Err(StoreError::Constraint(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rollback_replays_journal_in_reverse() {
        let mut store = MemoryConnectionStore::new();
        let kept = store.insert_edge(Eid(1), Eid(2), 10.0).unwrap();
        store.commit().unwrap();

        let added = store.insert_edge(Eid(2), Eid(3), 0.0).unwrap();
        store.update_weight(kept, 90.0).unwrap();
        store.delete_edge(kept).unwrap();
        assert_eq!(store.pending_writes(), 3);

        store.rollback();
        assert_eq!(store.pending_writes(), 0);
        assert_eq!(store.len(), 1);
        let row = store.find(Eid(1), Eid(2)).unwrap();
        assert_eq!(row.id, kept);
        assert!((row.weight - 10.0).abs() < f64::EPSILON);
        assert!(store.rows().all(|r| r.id != added));
    }

    #[test]
    fn ids_are_not_reused_after_rollback() {
        let mut store = MemoryConnectionStore::new();
        let first = store.insert_edge(Eid(1), Eid(2), 0.0).unwrap();
        store.rollback();
        let second = store.insert_edge(Eid(1), Eid(2), 0.0).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn missing_rows_are_reported() {
        let mut store = MemoryConnectionStore::new();
        assert_eq!(
            store.delete_edge(EdgeId(9)),
            Err(StoreError::MissingRow(EdgeId(9)))
        );
        assert_eq!(
            store.update_weight(EdgeId(9), 1.0),
            Err(StoreError::MissingRow(EdgeId(9)))
        );
    }
}
