// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mutex-backed [`PbsNode`] for tests.

use pbs_core::{
    Eid, NodeKind, OwnerId, PbsNode, Position, ReinforcementOffset, TypeLimits, ZoneId,
};
use std::sync::Mutex;

/// Limits used by [`TestNode::new`] for each kind.
///
/// A docking base has capacity 10 and range 100. Consumers cost 1 unit of
/// bandwidth, facilities and reactors 2; walls and highways cost nothing and
/// may sit outside the base range.
pub fn standard_limits(kind: NodeKind) -> TypeLimits {
    let (max_out, max_in, bandwidth_usage, transmit_radius) = match kind {
        NodeKind::DockingBase => (8, 16, 0, 50.0),
        NodeKind::Facility(_) => (1, 4, 2, 30.0),
        NodeKind::FacilityUpgrade => (1, 0, 1, 20.0),
        NodeKind::CoreTransmitter => (4, 2, 1, 60.0),
        NodeKind::Reactor => (4, 0, 2, 40.0),
        NodeKind::EnergyWell | NodeKind::Capacitor => (2, 2, 1, 40.0),
        NodeKind::ControlTower | NodeKind::Turret | NodeKind::EffectEmitter => (2, 2, 1, 40.0),
        NodeKind::Wall => (2, 2, 0, 10.0),
        NodeKind::Highway => (2, 2, 0, 30.0),
    };
    TypeLimits {
        max_out,
        max_in,
        bandwidth_capacity: kind.is_hub().then_some(10),
        bandwidth_usage,
        transmit_radius,
        network_node_range: kind.is_hub().then_some(100.0),
        placeable_outside_hub: matches!(kind, NodeKind::Wall | NodeKind::Highway),
    }
}

#[derive(Debug)]
struct NodeState {
    owner: OwnerId,
    limits: Option<TypeLimits>,
    orphaned: bool,
    constructed: bool,
    offset: ReinforcementOffset,
    forced_offsets: usize,
}

/// Scriptable node. Identity, kind, position and zone are fixed at build
/// time; everything the engine writes is kept behind a mutex so tests can
/// read it back.
#[derive(Debug)]
pub struct TestNode {
    eid: Eid,
    kind: NodeKind,
    position: Position,
    zone: ZoneId,
    state: Mutex<NodeState>,
}

impl TestNode {
    /// Node at the origin owned by owner 1, with [`standard_limits`].
    ///
    /// Non-hub nodes start orphaned, as a freshly deployed structure is.
    pub fn new(eid: u64, kind: NodeKind) -> Self {
        Self {
            eid: Eid(eid),
            kind,
            position: Position::new(0.0, 0.0),
            zone: ZoneId::default(),
            state: Mutex::new(NodeState {
                owner: OwnerId(1),
                limits: Some(standard_limits(kind)),
                orphaned: !kind.is_hub(),
                constructed: true,
                offset: ReinforcementOffset::default(),
                forced_offsets: 0,
            }),
        }
    }

    /// Places the node at `(x, y)`.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Sets the zone.
    #[must_use]
    pub fn in_zone(mut self, zone: u32) -> Self {
        self.zone = ZoneId(zone);
        self
    }

    /// Sets the owner.
    #[must_use]
    pub fn owned_by(self, owner: u64) -> Self {
        self.lock().owner = OwnerId(owner);
        self
    }

    /// Rewrites the limits in place.
    #[must_use]
    pub fn tuned(self, f: impl FnOnce(&mut TypeLimits)) -> Self {
        {
            let mut state = self.lock();
            let mut limits = state.limits.unwrap_or_default();
            f(&mut limits);
            state.limits = Some(limits);
        }
        self
    }

    /// Sets the bandwidth this node costs.
    #[must_use]
    pub fn using(self, bandwidth: u32) -> Self {
        self.tuned(|l| l.bandwidth_usage = bandwidth)
    }

    /// Reports no limits at all.
    #[must_use]
    pub fn without_limits(self) -> Self {
        self.lock().limits = None;
        self
    }

    /// Marks the structure as still under construction.
    #[must_use]
    pub fn under_construction(self) -> Self {
        self.lock().constructed = false;
        self
    }

    /// Starts with the given reinforcement offset.
    #[must_use]
    pub fn with_offset(self, hours: u8) -> Self {
        self.lock().offset = ReinforcementOffset::from_hours(hours);
        self
    }

    /// Overrides the initial orphan flag.
    #[must_use]
    pub fn orphaned(self, orphaned: bool) -> Self {
        self.lock().orphaned = orphaned;
        self
    }

    /// Finishes or reopens construction.
    pub fn set_constructed(&self, constructed: bool) {
        self.lock().constructed = constructed;
    }

    /// Number of times the engine forced an offset onto this node.
    pub fn forced_offsets(&self) -> usize {
        self.lock().forced_offsets
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PbsNode for TestNode {
    fn eid(&self) -> Eid {
        self.eid
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn owner(&self) -> OwnerId {
        self.lock().owner
    }

    fn set_owner(&self, owner: OwnerId) {
        self.lock().owner = owner;
    }

    fn limits(&self) -> Option<TypeLimits> {
        self.lock().limits
    }

    fn position(&self) -> Position {
        self.position
    }

    fn zone(&self) -> ZoneId {
        self.zone
    }

    fn is_orphaned(&self) -> bool {
        self.lock().orphaned
    }

    fn set_orphaned(&self, orphaned: bool) {
        self.lock().orphaned = orphaned;
    }

    fn reinforcement_offset(&self) -> ReinforcementOffset {
        self.lock().offset
    }

    fn force_reinforcement_offset(&self, offset: ReinforcementOffset) {
        let mut state = self.lock();
        state.offset = offset;
        state.forced_offsets += 1;
    }

    fn is_fully_constructed(&self) -> bool {
        self.lock().constructed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hubs_get_budget_and_range() {
        let base = TestNode::new(1, NodeKind::DockingBase);
        assert_eq!(base.bandwidth_capacity(), Some(10));
        assert!(base
            .network_node_range()
            .is_some_and(|range| (range - 100.0).abs() < 1e-9));
        assert!(!base.is_orphaned());

        let turret = TestNode::new(2, NodeKind::Turret);
        assert_eq!(turret.bandwidth_capacity(), None);
        assert!(turret.is_orphaned());
    }

    #[test]
    fn builders_adjust_state() {
        let node = TestNode::new(3, NodeKind::Wall)
            .at(3.0, 4.0)
            .owned_by(7)
            .using(5)
            .under_construction();
        assert_eq!(node.owner(), OwnerId(7));
        assert_eq!(node.bandwidth_usage(), 5);
        assert!(!node.is_fully_constructed());
        assert!(node.placeable_outside_hub());
        assert!((node.position().distance(Position::new(0.0, 0.0)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn missing_limits_read_as_zero() {
        let node = TestNode::new(4, NodeKind::Reactor).without_limits();
        assert_eq!(node.max_out(), 0);
        assert_eq!(node.bandwidth_usage(), 0);
    }
}
