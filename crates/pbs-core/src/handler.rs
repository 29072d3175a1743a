// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-node edge cache.
use crate::connection::Connection;
use crate::ident::Eid;
use crate::store::{ConnectionStore, StoreError};

/// Owns one node's view of its edges.
///
/// The view is loaded lazily from the store and dropped by every local
/// mutation, so the next read always reflects what the store holds.
#[derive(Debug)]
pub struct ConnectionHandler {
    eid: Eid,
    cache: Option<Vec<Connection>>,
}

impl ConnectionHandler {
    /// Creates an unloaded handler for `eid`.
    pub fn new(eid: Eid) -> Self {
        Self { eid, cache: None }
    }

    /// Node this handler belongs to.
    pub fn eid(&self) -> Eid {
        self.eid
    }

    /// `true` while a loaded view is cached.
    pub fn is_loaded(&self) -> bool {
        self.cache.is_some()
    }

    /// Drops the cached view.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Returns the node's edges, loading them on first use.
    pub fn connections<S>(&mut self, store: &S) -> Result<&[Connection], StoreError>
    where
        S: ConnectionStore + ?Sized,
    {
        if self.cache.is_none() {
            let eid = self.eid;
            let loaded = store
                .load_edges(eid)?
                .iter()
                .filter_map(|row| Connection::from_row(row, eid))
                .collect();
            self.cache = Some(loaded);
        }
        Ok(self.cache.as_deref().unwrap_or_default())
    }

    /// Edges owned by this node.
    pub fn out_connections<S>(&mut self, store: &S) -> Result<Vec<Connection>, StoreError>
    where
        S: ConnectionStore + ?Sized,
    {
        Ok(self
            .connections(store)?
            .iter()
            .filter(|c| c.is_outgoing())
            .copied()
            .collect())
    }

    /// Edges mirrored from other nodes.
    pub fn in_connections<S>(&mut self, store: &S) -> Result<Vec<Connection>, StoreError>
    where
        S: ConnectionStore + ?Sized,
    {
        Ok(self
            .connections(store)?
            .iter()
            .filter(|c| !c.is_outgoing())
            .copied()
            .collect())
    }

    /// The edge linking this node and `remote`, in either direction.
    pub fn connection_with<S>(
        &mut self,
        store: &S,
        remote: Eid,
    ) -> Result<Option<Connection>, StoreError>
    where
        S: ConnectionStore + ?Sized,
    {
        Ok(self
            .connections(store)?
            .iter()
            .find(|c| c.remote == remote)
            .copied())
    }
}
