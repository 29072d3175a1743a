// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Connection engine: connect, break, reweight and force-remove, plus the
//! merge arbitration that keeps one docking base per network.
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::connection::{carries_throughput, clamp_weight, initial_weight, Connection};
use crate::error::PbsError;
use crate::handler::ConnectionHandler;
use crate::ident::{ActorId, EdgeId, Eid, OwnerId};
use crate::network::{Network, NetworkSummary};
use crate::node::{NodeDirectory, NodeKind, PbsNode};
use crate::orphan::{OrphanTracker, OrphanTransition};
use crate::ports::{
    AccessCheck, AuditEntry, AuditEvent, AuditLog, Broadcaster, NullSink, OrphanObserver,
};
use crate::reinforcement::schedule_propagation;
use crate::store::ConnectionStore;
use crate::uow::{TxId, UnitOfWork};
use crate::validator::validate;

/// Outcome of merge arbitration, applied only after the edge is persisted.
struct MergePlan {
    new_owner: Option<OwnerId>,
    takeover: Vec<Arc<dyn PbsNode>>,
}

/// Topology engine for one store.
///
/// Holds a [`ConnectionHandler`] per node it has touched and the injected
/// collaborators. Every mutating call takes the caller's [`UnitOfWork`];
/// nothing outside the store and the node handles is touched until
/// [`ConnectionEngine::commit`] runs the deferred hooks.
///
/// Operations on one engine are serialized by `&mut self`. Engines sharing a
/// backing store are not coordinated: two merges racing over overlapping
/// networks can both pass validation.
pub struct ConnectionEngine<S> {
    store: S,
    directory: Arc<dyn NodeDirectory>,
    access: Arc<dyn AccessCheck>,
    broadcaster: Arc<dyn Broadcaster>,
    audit: Arc<dyn AuditLog>,
    orphans: OrphanTracker,
    config: EngineConfig,
    handlers: BTreeMap<Eid, ConnectionHandler>,
    tx_counter: u64,
    open: Option<TxId>,
}

impl<S> ConnectionEngine<S>
where
    S: ConnectionStore,
{
    /// Creates an engine with default config and discarding outbound ports.
    pub fn new(store: S, directory: Arc<dyn NodeDirectory>, access: Arc<dyn AccessCheck>) -> Self {
        Self {
            store,
            directory,
            access,
            broadcaster: Arc::new(NullSink),
            audit: Arc::new(NullSink),
            orphans: OrphanTracker::new(),
            config: EngineConfig::default(),
            handlers: BTreeMap::new(),
            tx_counter: 0,
            open: None,
        }
    }

    /// Replaces the config.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config.sanitized();
        self
    }

    /// Replaces the "node updated" broadcaster.
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn Broadcaster>) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    /// Replaces the audit log.
    pub fn with_audit_log(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Registers an orphan-change observer.
    pub fn subscribe_orphan_changes(&mut self, observer: Arc<dyn OrphanObserver>) {
        self.orphans.subscribe(observer);
    }

    /// Active config.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Unit of work ───────────────────────────────────────────────────

    /// Opens a unit of work. Ids increase monotonically and skip zero.
    ///
    /// The store journal is shared by every write the engine makes, so only
    /// one unit of work may be open at a time.
    pub fn begin(&mut self) -> Result<UnitOfWork, PbsError> {
        if let Some(open) = self.open {
            return Err(PbsError::TransactionInProgress(open));
        }
        self.tx_counter = self.tx_counter.wrapping_add(1);
        if self.tx_counter == 0 {
            self.tx_counter = 1;
        }
        let tx = TxId::from_raw(self.tx_counter);
        self.open = Some(tx);
        Ok(UnitOfWork::new(tx))
    }

    /// The currently open unit of work, if any.
    pub fn open_transaction(&self) -> Option<TxId> {
        self.open
    }

    /// Commits the store, then runs the deferred hooks.
    ///
    /// A failed store commit rolls the unit of work back and returns the
    /// storage error; no hook runs. A unit of work this engine did not open
    /// is abandoned without touching the store.
    pub fn commit(&mut self, uow: UnitOfWork) -> Result<(), PbsError> {
        let tx = uow.tx();
        if let Err(err) = self.ensure_open(&uow) {
            uow_abandon_foreign(uow);
            return Err(err);
        }
        if let Err(err) = self.store.commit() {
            warn!(%tx, error = %err, "store commit failed");
            self.rollback(uow);
            return Err(err.into());
        }
        self.open = None;
        debug!(%tx, hooks = uow.pending_hooks(), "committed");
        uow.complete();
        Ok(())
    }

    /// Discards the store's pending writes, drops every cached edge view and
    /// replays the unit of work's compensations. No hook runs.
    ///
    /// A unit of work this engine did not open only has its compensations
    /// replayed; the store and caches belong to the open one.
    pub fn rollback(&mut self, uow: UnitOfWork) {
        if self.open != Some(uow.tx()) {
            uow_abandon_foreign(uow);
            return;
        }
        warn!(
            tx = %uow.tx(),
            compensations = uow.pending_compensations(),
            "rolling back"
        );
        self.open = None;
        self.store.rollback();
        self.invalidate_all();
        uow.abandon();
    }

    /// Runs `op` in a fresh unit of work, committing on `Ok` and rolling back
    /// on `Err`.
    pub fn transact<T, F>(&mut self, op: F) -> Result<T, PbsError>
    where
        F: FnOnce(&mut Self, &mut UnitOfWork) -> Result<T, PbsError>,
    {
        let mut uow = self.begin()?;
        match op(self, &mut uow) {
            Ok(value) => {
                self.commit(uow)?;
                Ok(value)
            }
            Err(err) => {
                self.rollback(uow);
                Err(err)
            }
        }
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// Every edge touching `eid`.
    pub fn connections(&mut self, eid: Eid) -> Result<Vec<Connection>, PbsError> {
        Ok(self
            .handlers
            .entry(eid)
            .or_insert_with(|| ConnectionHandler::new(eid))
            .connections(&self.store)?
            .to_vec())
    }

    /// Edges owned by `eid`.
    pub fn out_connections(&mut self, eid: Eid) -> Result<Vec<Connection>, PbsError> {
        Ok(self
            .handlers
            .entry(eid)
            .or_insert_with(|| ConnectionHandler::new(eid))
            .out_connections(&self.store)?)
    }

    /// Edges mirrored onto `eid`.
    pub fn in_connections(&mut self, eid: Eid) -> Result<Vec<Connection>, PbsError> {
        Ok(self
            .handlers
            .entry(eid)
            .or_insert_with(|| ConnectionHandler::new(eid))
            .in_connections(&self.store)?)
    }

    /// Nodes reachable from `eid` in either direction, `eid` included.
    pub fn network_nodes(&mut self, eid: Eid) -> Result<Network, PbsError> {
        self.node(eid)?;
        self.traverse(eid)
    }

    /// Member count, hub and bandwidth figures of `eid`'s network.
    pub fn network_summary(&mut self, eid: Eid) -> Result<NetworkSummary, PbsError> {
        Ok(self.network_nodes(eid)?.summary())
    }

    /// `true` when the handler for `eid` currently holds a loaded view.
    pub fn is_cached(&self, eid: Eid) -> bool {
        self.handlers.get(&eid).is_some_and(ConnectionHandler::is_loaded)
    }

    /// Number of nodes the engine holds a handler for.
    pub fn tracked_nodes(&self) -> usize {
        self.handlers.len()
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Links `source` to `target` on behalf of `actor`.
    ///
    /// Checks, in order: access, self edge, construction, transmit radius,
    /// degree limits, type compatibility, existing edge. When the two nodes
    /// sit in different networks the merge is arbitrated before anything is
    /// written: at most one base, every member within the base's range, the
    /// combined bandwidth within budget, and for base-less merges a single
    /// owner. The base-less side of a merge is taken over by the base owner.
    #[instrument(skip(self, uow), fields(tx = %uow.tx()))]
    pub fn make_connection(
        &mut self,
        uow: &mut UnitOfWork,
        source: Eid,
        target: Eid,
        actor: ActorId,
    ) -> Result<EdgeId, PbsError> {
        self.ensure_open(uow)?;
        let source_node = self.node(source)?;
        self.check_access(source_node.as_ref(), actor)?;
        if source == target {
            return Err(PbsError::SelfConnection);
        }
        let target_node = self.node(target)?;
        for node in [&source_node, &target_node] {
            if !node.is_fully_constructed() {
                return Err(PbsError::ObjectNotFullyConstructed(node.eid()));
            }
        }

        let distance = source_node.position().distance(target_node.position());
        let radius = source_node.transmit_radius();
        if distance > radius {
            return Err(PbsError::TargetOutOfTransmitRadius { distance, radius });
        }

        let source_edges = self.connections(source)?;
        let target_edges = self.connections(target)?;
        let out_used = source_edges.iter().filter(|c| c.is_outgoing()).count();
        if out_used >= source_node.max_out() as usize {
            return Err(PbsError::SourceOutOfOutConnections(source));
        }
        let in_used = target_edges.iter().filter(|c| !c.is_outgoing()).count();
        if in_used >= target_node.max_in() as usize {
            return Err(PbsError::TargetOutOfInConnections(target));
        }

        let incoming_kinds: Vec<NodeKind> = target_edges
            .iter()
            .filter(|c| !c.is_outgoing())
            .filter_map(|c| self.directory.node(c.remote))
            .map(|n| n.kind())
            .collect();
        validate(source_node.kind(), target_node.kind(), incoming_kinds)?;

        if source_edges.iter().any(|c| c.remote == target) {
            return Err(PbsError::NodeAlreadyConnected);
        }

        let source_network = self.traverse(source)?;
        let plan = if source_network.contains(target) {
            debug!("same network, no arbitration");
            None
        } else {
            let target_network = self.traverse(target)?;
            Some(self.arbitrate_merge(&source_network, &target_network)?)
        };

        let weight = initial_weight(
            source_node.kind(),
            target_node.kind(),
            self.config.default_weight,
        );
        let edge = self.attach(source, target, weight)?;

        if let Some(plan) = plan {
            Self::apply_takeover(uow, plan);
        }

        let merged = self.traverse(source)?;
        let transitions = self.orphans.settle(&merged, uow);
        if self.config.propagate_reinforcement {
            schedule_propagation(&merged, uow);
        }
        self.defer_broadcast(uow, merged.eids().collect());
        self.defer_audit(
            uow,
            AuditEntry {
                actor: Some(actor),
                event: AuditEvent::Connected,
                nodes: vec![source, target],
                zone: source_node.zone(),
            },
        );
        self.defer_online_audit(uow, &transitions, Some(actor), source_node.as_ref());
        info!(%edge, %source, %target, members = merged.len(), "connected");
        Ok(edge)
    }

    /// Sets the weight of the edge `source -> target`, clamped to `0..=100`.
    /// Returns the stored weight.
    #[instrument(skip(self, uow), fields(tx = %uow.tx()))]
    pub fn set_weight(
        &mut self,
        uow: &mut UnitOfWork,
        source: Eid,
        target: Eid,
        weight: f64,
        actor: ActorId,
    ) -> Result<f64, PbsError> {
        self.ensure_open(uow)?;
        let source_node = self.node(source)?;
        self.check_access(source_node.as_ref(), actor)?;
        let connection = self
            .connection_between(source, target)?
            .ok_or(PbsError::ConnectionNotFound(source, target))?;
        if !connection.is_outgoing() {
            return Err(PbsError::ConnectionMustBeOutgoing);
        }
        let target_node = self.node(target)?;
        if !carries_throughput(source_node.kind(), target_node.kind()) {
            return Err(PbsError::OnlyConsumersHaveWeight);
        }

        let weight = clamp_weight(weight);
        self.invalidate(source);
        self.invalidate(target);
        self.store.update_weight(connection.id, weight)?;
        self.defer_broadcast(uow, vec![source, target]);
        debug!(edge = %connection.id, weight, "weight updated");
        Ok(weight)
    }

    /// Removes the edge between `initiator` and `target`, whichever side owns
    /// it, then re-settles orphan flags on both resulting networks.
    #[instrument(skip(self, uow), fields(tx = %uow.tx()))]
    pub fn break_connection(
        &mut self,
        uow: &mut UnitOfWork,
        initiator: Eid,
        target: Eid,
        actor: ActorId,
    ) -> Result<(), PbsError> {
        self.ensure_open(uow)?;
        let initiator_node = self.node(initiator)?;
        self.check_access(initiator_node.as_ref(), actor)?;
        let connection = self
            .connection_between(initiator, target)?
            .ok_or(PbsError::ConnectionNotFound(initiator, target))?;
        self.detach(&connection)?;

        let near = self.traverse(initiator)?;
        let mut transitions = self.orphans.settle(&near, uow);
        let mut touched: BTreeSet<Eid> = near.eids().collect();
        if near.contains(target) {
            debug!("edge was redundant, networks still joined");
        } else {
            let far = self.traverse(target)?;
            transitions.extend(self.orphans.settle(&far, uow));
            touched.extend(far.eids());
        }
        touched.insert(target);

        self.defer_broadcast(uow, touched.into_iter().collect());
        self.defer_audit(
            uow,
            AuditEntry {
                actor: Some(actor),
                event: AuditEvent::Disconnected,
                nodes: vec![initiator, target],
                zone: initiator_node.zone(),
            },
        );
        self.defer_online_audit(uow, &transitions, Some(actor), initiator_node.as_ref());
        info!(edge = %connection.id, %initiator, %target, "disconnected");
        Ok(())
    }

    /// Deletes every edge touching `eid`, used when the structure is
    /// destroyed. Every former network member is re-settled; `eid` itself is
    /// left alone. Returns the number of edges removed.
    ///
    /// `eid` need not resolve in the node directory anymore.
    #[instrument(skip(self, uow), fields(tx = %uow.tx()))]
    pub fn remove_all_connections(
        &mut self,
        uow: &mut UnitOfWork,
        eid: Eid,
    ) -> Result<usize, PbsError> {
        self.ensure_open(uow)?;
        let former = self.traverse(eid)?;
        let edges = self.connections(eid)?;
        for connection in &edges {
            self.detach(connection)?;
        }
        self.handlers.remove(&eid);

        let mut settled = BTreeSet::from([eid]);
        let mut transitions = Vec::new();
        let mut anchor = None;
        for member in former.nodes() {
            let member_eid = member.eid();
            if anchor.is_none() && member_eid != eid {
                anchor = Some(Arc::clone(member));
            }
            if settled.contains(&member_eid) {
                continue;
            }
            let component = self.traverse(member_eid)?;
            transitions.extend(self.orphans.settle(&component, uow));
            settled.extend(component.eids());
        }

        let mut nodes = vec![eid];
        nodes.extend(edges.iter().map(|c| c.remote));
        let zone = self
            .directory
            .node(eid)
            .or_else(|| anchor.clone())
            .map(|n| n.zone())
            .unwrap_or_default();
        self.defer_broadcast(uow, former.eids().filter(|e| *e != eid).collect());
        self.defer_audit(
            uow,
            AuditEntry {
                actor: None,
                event: AuditEvent::Disconnected,
                nodes,
                zone,
            },
        );
        if let Some(anchor) = anchor {
            self.defer_online_audit(uow, &transitions, None, anchor.as_ref());
        }
        info!(%eid, removed = edges.len(), former = former.len(), "removed all connections");
        Ok(edges.len())
    }

    /// Re-settles the orphan flags of `eid`'s network, e.g. right after the
    /// structure was deployed. Returns the node's resulting flag.
    #[instrument(skip(self, uow), fields(tx = %uow.tx()))]
    pub fn recompute_orphan_status(
        &mut self,
        uow: &mut UnitOfWork,
        eid: Eid,
    ) -> Result<bool, PbsError> {
        self.ensure_open(uow)?;
        let node = self.node(eid)?;
        let network = self.traverse(eid)?;
        let transitions = self.orphans.settle(&network, uow);
        self.defer_online_audit(uow, &transitions, None, node.as_ref());
        Ok(node.is_orphaned())
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn ensure_open(&self, uow: &UnitOfWork) -> Result<(), PbsError> {
        if self.open == Some(uow.tx()) {
            Ok(())
        } else {
            Err(PbsError::UnknownTransaction(uow.tx()))
        }
    }

    fn node(&self, eid: Eid) -> Result<Arc<dyn PbsNode>, PbsError> {
        self.directory.node(eid).ok_or(PbsError::NodeNotFound(eid))
    }

    fn check_access(&self, node: &dyn PbsNode, actor: ActorId) -> Result<(), PbsError> {
        self.access
            .check_access(node, actor)
            .map_err(|_| PbsError::AccessDenied {
                node: node.eid(),
                actor,
            })
    }

    fn invalidate(&mut self, eid: Eid) {
        if let Some(handler) = self.handlers.get_mut(&eid) {
            handler.invalidate();
        }
    }

    fn invalidate_all(&mut self) {
        for handler in self.handlers.values_mut() {
            handler.invalidate();
        }
    }

    fn connection_between(&mut self, local: Eid, remote: Eid) -> Result<Option<Connection>, PbsError> {
        Ok(self
            .handlers
            .entry(local)
            .or_insert_with(|| ConnectionHandler::new(local))
            .connection_with(&self.store, remote)?)
    }

    /// Breadth-first walk over every edge of every visited node. Nodes the
    /// directory cannot resolve are skipped, except the start node whose
    /// edges are still followed.
    fn traverse(&mut self, start: Eid) -> Result<Network, PbsError> {
        let mut network = Network::default();
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(eid) = queue.pop_front() {
            match self.directory.node(eid) {
                Some(node) => network.insert(node),
                None if eid == start => {}
                None => {
                    warn!(%eid, "edge points at an unknown node, skipping");
                    continue;
                }
            }
            for connection in self.connections(eid)? {
                if seen.insert(connection.remote) {
                    queue.push_back(connection.remote);
                }
            }
        }
        debug!(%start, members = network.len(), "traversed network");
        Ok(network)
    }

    fn arbitrate_merge(&self, source: &Network, target: &Network) -> Result<MergePlan, PbsError> {
        let (hub, hubless) = match (source.hub(), target.hub()) {
            (Some(_), Some(_)) => return Err(PbsError::BasesInBothNetworks),
            (Some(hub), None) => (Some(hub), target),
            (None, Some(hub)) => (Some(hub), source),
            (None, None) => (None, target),
        };
        let used = source.bandwidth_usage() + target.bandwidth_usage();

        let Some(hub) = hub else {
            let capacity = u64::from(self.config.hubless_bandwidth_limit);
            if used > capacity {
                return Err(PbsError::TooManyNodesOutOfCpu { used, capacity });
            }
            let owners: BTreeSet<OwnerId> =
                source.owners().into_iter().chain(target.owners()).collect();
            if owners.len() > 1 {
                return Err(PbsError::OwnerMismatch);
            }
            return Ok(MergePlan {
                new_owner: None,
                takeover: Vec::new(),
            });
        };

        let center = hub.position();
        let range = hub.network_node_range().unwrap_or(0.0);
        for member in source.nodes().chain(target.nodes()) {
            if member.is_hub() || member.placeable_outside_hub() {
                continue;
            }
            if member.position().distance(center) > range {
                return Err(PbsError::SomeNodeAreOutsideOfNetworkRange(member.eid()));
            }
        }

        let capacity = u64::from(hub.bandwidth_capacity().unwrap_or(0));
        if used > capacity {
            return Err(PbsError::TooManyNodesOutOfCpu { used, capacity });
        }

        let owner = hub.owner();
        Ok(MergePlan {
            new_owner: Some(owner),
            takeover: hubless
                .nodes()
                .filter(|n| n.owner() != owner)
                .cloned()
                .collect(),
        })
    }

    fn apply_takeover(uow: &mut UnitOfWork, plan: MergePlan) {
        let Some(owner) = plan.new_owner else {
            return;
        };
        for node in plan.takeover {
            let previous = node.owner();
            node.set_owner(owner);
            info!(eid = %node.eid(), from = %previous, to = %owner, "takeover");
            uow.compensate(move || node.set_owner(previous));
        }
    }

    /// Persists the row for `source -> target`. Both views are dropped before
    /// the write so a failed insert leaves nothing stale behind.
    fn attach(&mut self, source: Eid, target: Eid, weight: f64) -> Result<EdgeId, PbsError> {
        self.invalidate(source);
        self.invalidate(target);
        Ok(self.store.insert_edge(source, target, weight)?)
    }

    fn detach(&mut self, connection: &Connection) -> Result<(), PbsError> {
        self.invalidate(connection.local);
        self.invalidate(connection.remote);
        Ok(self.store.delete_edge(connection.id)?)
    }

    fn defer_broadcast(&self, uow: &mut UnitOfWork, nodes: Vec<Eid>) {
        if nodes.is_empty() {
            return;
        }
        let broadcaster = Arc::clone(&self.broadcaster);
        uow.on_success(move || broadcaster.node_updated(&nodes));
    }

    fn defer_audit(&self, uow: &mut UnitOfWork, entry: AuditEntry) {
        let audit = Arc::clone(&self.audit);
        uow.on_success(move || audit.append(entry));
    }

    fn defer_online_audit(
        &self,
        uow: &mut UnitOfWork,
        transitions: &[OrphanTransition],
        actor: Option<ActorId>,
        context: &dyn PbsNode,
    ) {
        for transition in transitions {
            self.defer_audit(
                uow,
                AuditEntry {
                    actor,
                    event: AuditEvent::OnlineStateChanged {
                        online: !transition.orphaned,
                    },
                    nodes: vec![transition.node],
                    zone: context.zone(),
                },
            );
        }
    }
}

fn uow_abandon_foreign(uow: UnitOfWork) {
    warn!(tx = %uow.tx(), "unit of work is not open on this engine, abandoning");
    uow.abandon();
}

impl<S> std::fmt::Debug for ConnectionEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionEngine")
            .field("config", &self.config)
            .field("handlers", &self.handlers.len())
            .field("orphan_observers", &self.orphans.observer_count())
            .field("tx_counter", &self.tx_counter)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}
