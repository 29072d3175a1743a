// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persistence boundary for connection rows.
//!
//! The engine reads and writes rows only through [`ConnectionStore`]. Writes
//! happen inside the caller's unit of work; [`ConnectionStore::commit`] and
//! [`ConnectionStore::rollback`] close it. Adapters backed by a database map
//! these onto their own transaction; [`MemoryConnectionStore`] keeps an undo
//! journal.

mod memory;
pub use memory::MemoryConnectionStore;

use thiserror::Error;

use crate::connection::ConnectionRow;
use crate::ident::{EdgeId, Eid};

/// Errors raised by a [`ConnectionStore`].
///
/// Any of these aborts the current operation. The engine never patches its
/// caches after a failed write, it drops them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("[PBS_STORE_UNAVAILABLE] {0}")]
    Unavailable(String),
    /// A write violated a row constraint (self edge, duplicate pair).
    #[error("[PBS_STORE_CONSTRAINT] {0}")]
    Constraint(String),
    /// The referenced row does not exist.
    #[error("[PBS_STORE_MISSING_ROW] {0}")]
    MissingRow(EdgeId),
}

/// Row storage for connections.
///
/// One row per edge, keyed by `(source, target)`. `load_edges` returns rows in
/// both directions touching the node.
pub trait ConnectionStore {
    /// Loads every row with `node` as source or target.
    fn load_edges(&self, node: Eid) -> Result<Vec<ConnectionRow>, StoreError>;

    /// Inserts a row and returns its new identity.
    fn insert_edge(&mut self, source: Eid, target: Eid, weight: f64)
        -> Result<EdgeId, StoreError>;

    /// Deletes a row.
    fn delete_edge(&mut self, id: EdgeId) -> Result<(), StoreError>;

    /// Overwrites a row's weight.
    fn update_weight(&mut self, id: EdgeId, weight: f64) -> Result<(), StoreError>;

    /// Makes the pending writes durable.
    fn commit(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Discards the pending writes.
    fn rollback(&mut self) {}
}
