// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fault-injecting connection store.

use pbs_core::{ConnectionRow, ConnectionStore, EdgeId, Eid, MemoryConnectionStore, StoreError};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    load: bool,
    insert: bool,
    delete: bool,
    update: bool,
    commit: bool,
}

/// Handle for flipping a [`FlakyStore`]'s failure switches after the store
/// has been moved into an engine.
#[derive(Debug, Clone, Default)]
pub struct StoreSwitches {
    faults: Arc<Mutex<Faults>>,
}

impl StoreSwitches {
    fn update(&self, f: impl FnOnce(&mut Faults)) {
        f(&mut self.faults.lock().unwrap_or_else(|e| e.into_inner()));
    }

    fn read(&self) -> Faults {
        *self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail every `load_edges`.
    pub fn fail_load(&self, fail: bool) {
        self.update(|f| f.load = fail);
    }

    /// Fail every `insert_edge`.
    pub fn fail_insert(&self, fail: bool) {
        self.update(|f| f.insert = fail);
    }

    /// Fail every `delete_edge`.
    pub fn fail_delete(&self, fail: bool) {
        self.update(|f| f.delete = fail);
    }

    /// Fail every `update_weight`.
    pub fn fail_update(&self, fail: bool) {
        self.update(|f| f.update = fail);
    }

    /// Fail every `commit`.
    pub fn fail_commit(&self, fail: bool) {
        self.update(|f| f.commit = fail);
    }

    /// Clears every switch.
    pub fn heal(&self) {
        self.update(|f| *f = Faults::default());
    }
}

/// [`MemoryConnectionStore`] that fails on demand with
/// [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryConnectionStore,
    switches: StoreSwitches,
}

impl FlakyStore {
    /// Healthy empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the failure switches.
    pub fn switches(&self) -> StoreSwitches {
        self.switches.clone()
    }

    /// Wrapped store, for inspecting rows.
    pub fn inner(&self) -> &MemoryConnectionStore {
        &self.inner
    }

    /// Every stored row.
    pub fn rows(&self) -> Vec<ConnectionRow> {
        self.inner.rows().copied().collect()
    }

    fn check(fail: bool, op: &str) -> Result<(), StoreError> {
        if fail {
            Err(StoreError::Unavailable(format!("simulated {op} failure")))
        } else {
            Ok(())
        }
    }
}

impl ConnectionStore for FlakyStore {
    fn load_edges(&self, node: Eid) -> Result<Vec<ConnectionRow>, StoreError> {
        Self::check(self.switches.read().load, "load")?;
        self.inner.load_edges(node)
    }

    fn insert_edge(&mut self, source: Eid, target: Eid, weight: f64) -> Result<EdgeId, StoreError> {
        Self::check(self.switches.read().insert, "insert")?;
        self.inner.insert_edge(source, target, weight)
    }

    fn delete_edge(&mut self, id: EdgeId) -> Result<(), StoreError> {
        Self::check(self.switches.read().delete, "delete")?;
        self.inner.delete_edge(id)
    }

    fn update_weight(&mut self, id: EdgeId, weight: f64) -> Result<(), StoreError> {
        Self::check(self.switches.read().update, "update")?;
        self.inner.update_weight(id, weight)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        Self::check(self.switches.read().commit, "commit")?;
        self.inner.commit()
    }

    fn rollback(&mut self) {
        self.inner.rollback();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn switches_survive_a_move() {
        let store = FlakyStore::new();
        let switches = store.switches();
        let mut moved = store;
        moved.insert_edge(Eid(1), Eid(2), 0.0).unwrap();

        switches.fail_insert(true);
        assert!(matches!(
            moved.insert_edge(Eid(2), Eid(3), 0.0),
            Err(StoreError::Unavailable(_))
        ));
        switches.heal();
        moved.insert_edge(Eid(2), Eid(3), 0.0).unwrap();
        assert_eq!(moved.rows().len(), 2);
    }

    #[test]
    fn failed_commit_leaves_writes_pending() {
        let mut store = FlakyStore::new();
        store.switches().fail_commit(true);
        store.insert_edge(Eid(1), Eid(2), 0.0).unwrap();
        assert!(store.commit().is_err());
        assert_eq!(store.inner().pending_writes(), 1);
        store.rollback();
        assert!(store.rows().is_empty());
    }
}
