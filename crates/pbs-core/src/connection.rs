// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Connection rows and the per-node views derived from them.
//!
//! An edge is persisted once, as a [`ConnectionRow`] keyed by source and
//! target. Each endpoint sees it as a [`Connection`]: outgoing on the source
//! side, a read-only incoming mirror on the target side.
use crate::ident::{EdgeId, Eid};
use crate::node::NodeKind;

/// Lowest accepted weight.
pub const MIN_WEIGHT: f64 = 0.0;
/// Highest accepted weight.
pub const MAX_WEIGHT: f64 = 100.0;
/// Weight given to new producer → consumer edges.
pub const DEFAULT_THROUGHPUT_WEIGHT: f64 = 50.0;

/// Clamps `weight` into `[MIN_WEIGHT, MAX_WEIGHT]`. NaN maps to `MIN_WEIGHT`.
#[must_use]
pub fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        return MIN_WEIGHT;
    }
    weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

/// Returns `true` when an edge from `source` to `target` carries throughput,
/// i.e. when its weight means anything.
#[must_use]
pub const fn carries_throughput(source: NodeKind, target: NodeKind) -> bool {
    source.produces_throughput() && target.accepts_throughput()
}

/// Initial weight of a new edge between the given kinds.
#[must_use]
pub fn initial_weight(source: NodeKind, target: NodeKind, default_weight: f64) -> f64 {
    if carries_throughput(source, target) {
        clamp_weight(default_weight)
    } else {
        MIN_WEIGHT
    }
}

/// Persisted edge row.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionRow {
    /// Row identity.
    pub id: EdgeId,
    /// Owning (emitting) side.
    pub source: Eid,
    /// Receiving side.
    pub target: Eid,
    /// Throughput share, `0..=100`.
    pub weight: f64,
}

impl ConnectionRow {
    /// Returns `true` if the row has `eid` at either end.
    #[must_use]
    pub fn touches(&self, eid: Eid) -> bool {
        self.source == eid || self.target == eid
    }

    /// Returns `true` if the row links `a` and `b` in either direction.
    #[must_use]
    pub fn links(&self, a: Eid, b: Eid) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Which side of a row a handler is looking from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    /// The local node is the source and owns the row.
    Outgoing,
    /// The local node is the target; read-only mirror.
    Incoming,
}

/// A row as seen from one endpoint.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Connection {
    /// Row identity.
    pub id: EdgeId,
    /// Node the view belongs to.
    pub local: Eid,
    /// Node at the other end.
    pub remote: Eid,
    /// Side of the row `local` is on.
    pub direction: Direction,
    /// Throughput share, `0..=100`.
    pub weight: f64,
}

impl Connection {
    /// Derives the view of `row` from `local`, or `None` when `local` is not
    /// an endpoint.
    #[must_use]
    pub fn from_row(row: &ConnectionRow, local: Eid) -> Option<Self> {
        let (remote, direction) = if row.source == local {
            (row.target, Direction::Outgoing)
        } else if row.target == local {
            (row.source, Direction::Incoming)
        } else {
            return None;
        };
        Some(Self {
            id: row.id,
            local,
            remote,
            direction,
            weight: row.weight,
        })
    }

    /// Emitting side of the underlying row.
    #[must_use]
    pub fn source(&self) -> Eid {
        match self.direction {
            Direction::Outgoing => self.local,
            Direction::Incoming => self.remote,
        }
    }

    /// Receiving side of the underlying row.
    #[must_use]
    pub fn target(&self) -> Eid {
        match self.direction {
            Direction::Outgoing => self.remote,
            Direction::Incoming => self.local,
        }
    }

    /// `true` for the owning side.
    #[must_use]
    pub fn is_outgoing(&self) -> bool {
        self.direction == Direction::Outgoing
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::node::FacilityKind;

    fn row() -> ConnectionRow {
        ConnectionRow {
            id: EdgeId(1),
            source: Eid(10),
            target: Eid(20),
            weight: 50.0,
        }
    }

    #[test]
    fn views_mirror_each_other() {
        let out = Connection::from_row(&row(), Eid(10)).unwrap();
        let inc = Connection::from_row(&row(), Eid(20)).unwrap();
        assert_eq!(out.direction, Direction::Outgoing);
        assert_eq!(inc.direction, Direction::Incoming);
        assert_eq!(out.remote, Eid(20));
        assert_eq!(inc.remote, Eid(10));
        assert_eq!((out.source(), out.target()), (inc.source(), inc.target()));
    }

    #[test]
    fn foreign_node_has_no_view() {
        assert!(Connection::from_row(&row(), Eid(30)).is_none());
    }

    #[test]
    fn weights_clamp_into_range() {
        assert!((clamp_weight(150.0) - MAX_WEIGHT).abs() < f64::EPSILON);
        assert!((clamp_weight(-3.0) - MIN_WEIGHT).abs() < f64::EPSILON);
        assert!((clamp_weight(f64::NAN) - MIN_WEIGHT).abs() < f64::EPSILON);
        assert!((clamp_weight(42.5) - 42.5).abs() < f64::EPSILON);
    }

    #[test]
    fn only_throughput_pairs_get_default_weight() {
        let w = initial_weight(NodeKind::Reactor, NodeKind::Turret, DEFAULT_THROUGHPUT_WEIGHT);
        assert!((w - DEFAULT_THROUGHPUT_WEIGHT).abs() < f64::EPSILON);
        let w = initial_weight(
            NodeKind::Facility(FacilityKind::Mill),
            NodeKind::DockingBase,
            DEFAULT_THROUGHPUT_WEIGHT,
        );
        assert!(w.abs() < f64::EPSILON);
    }

    #[test]
    fn links_is_direction_agnostic() {
        assert!(row().links(Eid(20), Eid(10)));
        assert!(row().links(Eid(10), Eid(20)));
        assert!(!row().links(Eid(10), Eid(30)));
    }
}
