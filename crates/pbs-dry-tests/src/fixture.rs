// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine wired to every double, plus topology invariant checks.

use crate::access::ScriptedAccess;
use crate::node::TestNode;
use crate::recorders::{RecordingAuditLog, RecordingBroadcaster, RecordingOrphanObserver};
use crate::registry::NodeRegistry;
use crate::store::{FlakyStore, StoreSwitches};
use pbs_core::{
    ActorId, ConnectionEngine, EdgeId, Eid, EngineConfig, PbsError,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Actor every fixture helper acts as.
pub const ACTOR: ActorId = ActorId(1);

/// A [`ConnectionEngine`] over a [`FlakyStore`], with recording ports and a
/// shared [`NodeRegistry`]. Every helper runs in its own unit of work.
pub struct NetworkFixture {
    /// Engine under test.
    pub engine: ConnectionEngine<FlakyStore>,
    /// Node directory the engine resolves against.
    pub registry: Arc<NodeRegistry>,
    /// Access check the engine consults.
    pub access: Arc<ScriptedAccess>,
    /// Post-commit broadcasts.
    pub broadcasts: Arc<RecordingBroadcaster>,
    /// Post-commit audit entries.
    pub audit: Arc<RecordingAuditLog>,
    /// Post-commit orphan flag changes.
    pub orphan_events: Arc<RecordingOrphanObserver>,
    /// Store failure switches.
    pub switches: StoreSwitches,
}

impl NetworkFixture {
    /// Fixture with the default [`EngineConfig`].
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Fixture with the given config.
    pub fn with_config(config: EngineConfig) -> Self {
        let registry = Arc::new(NodeRegistry::new());
        let access = Arc::new(ScriptedAccess::new());
        let broadcasts = Arc::new(RecordingBroadcaster::default());
        let audit = Arc::new(RecordingAuditLog::default());
        let orphan_events = Arc::new(RecordingOrphanObserver::default());
        let store = FlakyStore::new();
        let switches = store.switches();
        let mut engine = ConnectionEngine::new(
            store,
            Arc::clone(&registry) as _,
            Arc::clone(&access) as _,
        )
        .with_config(config)
        .with_broadcaster(Arc::clone(&broadcasts) as _)
        .with_audit_log(Arc::clone(&audit) as _);
        engine.subscribe_orphan_changes(Arc::clone(&orphan_events) as _);
        Self {
            engine,
            registry,
            access,
            broadcasts,
            audit,
            orphan_events,
            switches,
        }
    }

    /// Registers `node` and returns its handle.
    pub fn add(&self, node: TestNode) -> Arc<TestNode> {
        self.registry.insert(node)
    }

    /// Registered node, if any.
    pub fn node(&self, eid: u64) -> Option<Arc<TestNode>> {
        self.registry.get(Eid(eid))
    }

    /// Connects `source -> target` as [`ACTOR`] and commits.
    pub fn connect(&mut self, source: u64, target: u64) -> Result<EdgeId, PbsError> {
        self.engine
            .transact(|engine, uow| engine.make_connection(uow, Eid(source), Eid(target), ACTOR))
    }

    /// Breaks the edge between `initiator` and `target` as [`ACTOR`].
    pub fn disconnect(&mut self, initiator: u64, target: u64) -> Result<(), PbsError> {
        self.engine.transact(|engine, uow| {
            engine.break_connection(uow, Eid(initiator), Eid(target), ACTOR)
        })
    }

    /// Reweights `source -> target` as [`ACTOR`].
    pub fn set_weight(&mut self, source: u64, target: u64, weight: f64) -> Result<f64, PbsError> {
        self.engine.transact(|engine, uow| {
            engine.set_weight(uow, Eid(source), Eid(target), weight, ACTOR)
        })
    }

    /// Destroys `eid`: unregisters it, then removes every edge touching it.
    pub fn destroy(&mut self, eid: u64) -> Result<usize, PbsError> {
        self.registry.remove(Eid(eid));
        self.engine
            .transact(|engine, uow| engine.remove_all_connections(uow, Eid(eid)))
    }

    /// Stored edges as sorted `(source, target)` pairs.
    pub fn edges(&self) -> Vec<(u64, u64)> {
        let mut edges: Vec<(u64, u64)> = self
            .engine
            .store()
            .rows()
            .iter()
            .map(|row| (row.source.0, row.target.0))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Member ids of `eid`'s network.
    pub fn members(&mut self, eid: u64) -> Result<BTreeSet<u64>, PbsError> {
        Ok(self
            .engine
            .network_nodes(Eid(eid))?
            .eids()
            .map(|e| e.0)
            .collect())
    }

    /// Checks the topology invariants over every registered node:
    /// no self or duplicate edge, at most one hub per network, orphan flags
    /// matching hub presence, and hubbed networks within their budget.
    pub fn check_invariants(&mut self) -> Result<(), String> {
        let mut pairs = BTreeSet::new();
        for (source, target) in self.edges() {
            if source == target {
                return Err(format!("self edge on {source}"));
            }
            let key = (source.min(target), source.max(target));
            if !pairs.insert(key) {
                return Err(format!("duplicate edge between {} and {}", key.0, key.1));
            }
        }

        for eid in self.registry.eids() {
            let network = self
                .engine
                .network_nodes(eid)
                .map_err(|e| format!("traversal from {eid} failed: {e}"))?;
            let hubs = network.hubs().count();
            if hubs > 1 {
                return Err(format!("{eid} sits in a network with {hubs} hubs"));
            }
            for member in network.nodes() {
                let expected = hubs == 0 && !member.is_hub();
                if member.is_orphaned() != expected {
                    return Err(format!(
                        "{} orphaned={} but expected {expected}",
                        member.eid(),
                        member.is_orphaned()
                    ));
                }
            }
            let summary = network.summary();
            if let Some(capacity) = summary.bandwidth_capacity {
                if summary.bandwidth_used > capacity {
                    return Err(format!(
                        "network of {eid} uses {} of {capacity}",
                        summary.bandwidth_used
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for NetworkFixture {
    fn default() -> Self {
        Self::new()
    }
}
