// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node capability contract.
//!
//! The engine never owns structures. The entity layer hands it
//! `Arc<dyn PbsNode>` handles through a [`NodeDirectory`]; everything the
//! topology rules need (owner, limits, orphan flag, reinforcement schedule,
//! placement) is read and written through this trait.
use std::sync::Arc;

use tracing::warn;

use crate::ident::{Eid, OwnerId, ReinforcementOffset, ZoneId};

/// Production facility subtypes. A docking base accepts at most one facility
/// of each subtype.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FacilityKind {
    /// Ore refining mill.
    Mill,
    /// Prototype manufacturing.
    Prototyper,
    /// Raw material refinery.
    Refinery,
    /// Item reprocessing.
    Reprocessor,
    /// Robot repair shop.
    RepairShop,
    /// Research laboratory.
    ResearchLab,
    /// CT calibration forge.
    CalibrationForge,
}

/// Closed set of node types the compatibility rules dispatch on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Network hub. A network holds at most one.
    DockingBase,
    /// Production facility bound to a docking base.
    Facility(FacilityKind),
    /// Upgrade module bound to a production facility.
    FacilityUpgrade,
    /// Relays core to consumers.
    CoreTransmitter,
    /// Generates core.
    Reactor,
    /// Harvests core from the terrain.
    EnergyWell,
    /// Buffers core and re-emits it.
    Capacitor,
    /// Area control structure.
    ControlTower,
    /// Defensive turret.
    Turret,
    /// Emits area effects.
    EffectEmitter,
    /// Wall segment.
    Wall,
    /// Highway segment; links only to other highway segments.
    Highway,
}

impl NodeKind {
    /// Returns `true` for the hub kind.
    #[must_use]
    pub const fn is_hub(self) -> bool {
        matches!(self, Self::DockingBase)
    }

    /// Returns `true` when the node emits core along its outgoing edges.
    #[must_use]
    pub const fn produces_throughput(self) -> bool {
        matches!(
            self,
            Self::Reactor | Self::EnergyWell | Self::Capacitor | Self::CoreTransmitter
        )
    }

    /// Returns `true` when the node can draw core from an incoming edge.
    #[must_use]
    pub const fn accepts_throughput(self) -> bool {
        matches!(
            self,
            Self::DockingBase
                | Self::Facility(_)
                | Self::Capacitor
                | Self::CoreTransmitter
                | Self::ControlTower
                | Self::Turret
                | Self::EffectEmitter
        )
    }
}

/// Per-type limits configured for a node.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeLimits {
    /// Maximum number of outgoing connections.
    pub max_out: u32,
    /// Maximum number of incoming connections.
    pub max_in: u32,
    /// Bandwidth budget of the network. Only set on hubs.
    pub bandwidth_capacity: Option<u32>,
    /// Bandwidth this node consumes from its hub.
    pub bandwidth_usage: u32,
    /// Maximum distance to a connection target.
    pub transmit_radius: f64,
    /// Maximum distance of any network member from the hub. Only set on hubs.
    pub network_node_range: Option<f64>,
    /// Exempts the node from the hub range check.
    pub placeable_outside_hub: bool,
}

/// Map position of a node.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// East-west coordinate.
    pub x: f64,
    /// North-south coordinate.
    pub y: f64,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Capability contract a structure satisfies to take part in a PBS network.
///
/// Setters take `&self`: implementations keep their state behind whatever
/// interior mutability the entity layer already uses. The limit accessors are
/// provided on top of [`PbsNode::limits`]; a node that reports no limits is
/// treated as unable to connect or host anything.
pub trait PbsNode: Send + Sync {
    /// Stable identifier.
    fn eid(&self) -> Eid;
    /// Type tag used by the compatibility rules.
    fn kind(&self) -> NodeKind;
    /// Controlling corporation.
    fn owner(&self) -> OwnerId;
    /// Reassigns the controlling corporation (takeover).
    fn set_owner(&self, owner: OwnerId);
    /// Configured per-type limits, `None` when the type has none.
    fn limits(&self) -> Option<TypeLimits>;
    /// Map position.
    fn position(&self) -> Position;
    /// Zone the node is deployed in.
    fn zone(&self) -> ZoneId;
    /// Current orphan flag.
    fn is_orphaned(&self) -> bool;
    /// Stores the orphan flag. Change notification is the engine's job.
    fn set_orphaned(&self, orphaned: bool);
    /// Current reinforcement window offset.
    fn reinforcement_offset(&self) -> ReinforcementOffset;
    /// Overwrites the reinforcement window offset.
    fn force_reinforcement_offset(&self, offset: ReinforcementOffset);

    /// `false` while the structure is still being built.
    fn is_fully_constructed(&self) -> bool {
        true
    }

    /// `true` for the network hub kind.
    fn is_hub(&self) -> bool {
        self.kind().is_hub()
    }

    /// Limits, or all-zero limits with a warning when none are configured.
    fn limits_or_conservative(&self) -> TypeLimits {
        self.limits().unwrap_or_else(|| {
            warn!(eid = %self.eid(), kind = ?self.kind(), "node has no configured limits");
            TypeLimits::default()
        })
    }

    /// Maximum outgoing connections.
    fn max_out(&self) -> u32 {
        self.limits_or_conservative().max_out
    }

    /// Maximum incoming connections.
    fn max_in(&self) -> u32 {
        self.limits_or_conservative().max_in
    }

    /// Bandwidth consumed from the hub.
    fn bandwidth_usage(&self) -> u32 {
        self.limits_or_conservative().bandwidth_usage
    }

    /// Bandwidth budget; `Some` only on hubs.
    fn bandwidth_capacity(&self) -> Option<u32> {
        if self.is_hub() {
            Some(self.limits_or_conservative().bandwidth_capacity.unwrap_or(0))
        } else {
            None
        }
    }

    /// Maximum distance to a connection target.
    fn transmit_radius(&self) -> f64 {
        self.limits_or_conservative().transmit_radius
    }

    /// Maximum distance of a member from the hub; `Some` only on hubs.
    fn network_node_range(&self) -> Option<f64> {
        if self.is_hub() {
            Some(self.limits_or_conservative().network_node_range.unwrap_or(0.0))
        } else {
            None
        }
    }

    /// Exempts the node from the hub range check.
    fn placeable_outside_hub(&self) -> bool {
        self.limits_or_conservative().placeable_outside_hub
    }
}

/// Resolves node ids to live node handles.
pub trait NodeDirectory: Send + Sync {
    /// Returns the node for `eid`, or `None` if it is not deployed.
    fn node(&self, eid: Eid) -> Option<Arc<dyn PbsNode>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_docking_base_is_hub() {
        assert!(NodeKind::DockingBase.is_hub());
        assert!(!NodeKind::Facility(FacilityKind::Mill).is_hub());
        assert!(!NodeKind::Highway.is_hub());
    }

    #[test]
    fn highways_neither_produce_nor_accept() {
        assert!(!NodeKind::Highway.produces_throughput());
        assert!(!NodeKind::Highway.accepts_throughput());
        assert!(!NodeKind::Wall.accepts_throughput());
    }

    #[test]
    fn capacitor_and_transmitter_relay() {
        for kind in [NodeKind::Capacitor, NodeKind::CoreTransmitter] {
            assert!(kind.produces_throughput());
            assert!(kind.accepts_throughput());
        }
        assert!(NodeKind::Reactor.produces_throughput());
        assert!(!NodeKind::Reactor.accepts_throughput());
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }
}
