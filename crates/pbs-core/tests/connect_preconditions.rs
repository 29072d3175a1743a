// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Connect preconditions: every rejection happens before any write.
#![allow(missing_docs, clippy::unwrap_used, clippy::panic)]

use pbs_core::{Eid, FacilityKind, NodeKind, PbsError, PbsNode};
use pbs_dry_tests::{NetworkFixture, TestNode, ACTOR};

const MILL: NodeKind = NodeKind::Facility(FacilityKind::Mill);

/// Asserts the fixture saw no committed effect at all.
fn assert_untouched(fx: &NetworkFixture, edges: &[(u64, u64)]) {
    assert_eq!(fx.edges(), edges);
    assert!(fx.broadcasts.calls().is_empty());
    assert!(fx.audit.entries().is_empty());
    assert!(fx.orphan_events.changes().is_empty());
}

#[test]
fn access_is_checked_first() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase));
    fx.add(TestNode::new(2, NodeKind::Turret));
    fx.access.deny(ACTOR, Eid(1));

    let err = fx.connect(1, 2).unwrap_err();
    assert_eq!(
        err,
        PbsError::AccessDenied {
            node: Eid(1),
            actor: ACTOR
        }
    );
    // Denied even for a self edge: access precedes every other rule.
    assert!(matches!(fx.connect(1, 1), Err(PbsError::AccessDenied { .. })));
    assert_untouched(&fx, &[]);
}

#[test]
fn self_edges_are_rejected() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase));
    assert_eq!(fx.connect(1, 1), Err(PbsError::SelfConnection));
    assert_untouched(&fx, &[]);
}

#[test]
fn unknown_nodes_are_reported() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase));
    assert_eq!(fx.connect(1, 99), Err(PbsError::NodeNotFound(Eid(99))));
    assert_eq!(fx.connect(98, 1), Err(PbsError::NodeNotFound(Eid(98))));
    assert_untouched(&fx, &[]);
}

#[test]
fn unfinished_structures_cannot_be_wired() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase));
    let turret = fx.add(TestNode::new(2, NodeKind::Turret).under_construction());

    assert_eq!(
        fx.connect(1, 2),
        Err(PbsError::ObjectNotFullyConstructed(Eid(2)))
    );
    assert_untouched(&fx, &[]);

    turret.set_constructed(true);
    fx.connect(1, 2).unwrap();
}

#[test]
fn target_must_sit_within_transmit_radius() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::Turret));
    fx.add(TestNode::new(2, NodeKind::Wall).at(45.0, 0.0));

    match fx.connect(1, 2) {
        Err(PbsError::TargetOutOfTransmitRadius { distance, radius }) => {
            assert!((distance - 45.0).abs() < 1e-9);
            assert!((radius - 40.0).abs() < 1e-9);
        }
        other => panic!("expected radius rejection, got {other:?}"),
    }
    assert_untouched(&fx, &[]);
}

#[test]
fn source_out_degree_is_bounded() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase).tuned(|l| l.max_out = 1));
    fx.add(TestNode::new(2, NodeKind::Turret));
    fx.add(TestNode::new(3, NodeKind::Turret));

    fx.connect(1, 2).unwrap();
    fx.broadcasts.clear();
    fx.audit.clear();
    fx.orphan_events.clear();

    assert_eq!(
        fx.connect(1, 3),
        Err(PbsError::SourceOutOfOutConnections(Eid(1)))
    );
    assert_untouched(&fx, &[(1, 2)]);
}

#[test]
fn target_in_degree_is_bounded() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase));
    fx.add(TestNode::new(2, NodeKind::Turret).tuned(|l| l.max_in = 1));
    fx.add(TestNode::new(3, NodeKind::Reactor));

    fx.connect(1, 2).unwrap();
    assert_eq!(
        fx.connect(3, 2),
        Err(PbsError::TargetOutOfInConnections(Eid(2)))
    );
    assert_eq!(fx.edges(), vec![(1, 2)]);
}

#[test]
fn missing_limits_mean_no_connections() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::Turret).without_limits());
    fx.add(TestNode::new(2, NodeKind::Wall));
    // Zero transmit radius still reaches a node at distance zero, but the
    // out-degree budget is empty.
    assert_eq!(
        fx.connect(1, 2),
        Err(PbsError::SourceOutOfOutConnections(Eid(1)))
    );
}

#[test]
fn incompatible_kinds_are_rejected() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::Reactor));
    fx.add(TestNode::new(2, NodeKind::Wall));
    fx.add(TestNode::new(3, NodeKind::Highway));

    assert_eq!(fx.connect(1, 2), Err(PbsError::TargetIsIncompatible));
    assert_eq!(fx.connect(2, 3), Err(PbsError::TargetIsIncompatible));
    assert_untouched(&fx, &[]);
}

#[test]
fn one_facility_per_subtype_per_base() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase));
    fx.add(TestNode::new(2, MILL));
    fx.add(TestNode::new(3, MILL));
    fx.add(TestNode::new(4, NodeKind::Facility(FacilityKind::ResearchLab)));

    fx.connect(2, 1).unwrap();
    assert_eq!(fx.connect(3, 1), Err(PbsError::FacilityTypeAlreadyConnected));
    fx.connect(4, 1).unwrap();
    assert_eq!(fx.edges(), vec![(2, 1), (4, 1)]);
}

#[test]
fn a_pair_holds_one_edge_in_either_direction() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase));
    fx.add(TestNode::new(2, NodeKind::Turret));

    fx.connect(1, 2).unwrap();
    assert_eq!(fx.connect(1, 2), Err(PbsError::NodeAlreadyConnected));
    assert_eq!(fx.connect(2, 1), Err(PbsError::NodeAlreadyConnected));
    assert_eq!(fx.edges(), vec![(1, 2)]);
}

#[test]
fn rejected_connect_leaves_flags_and_owners_alone() {
    let mut fx = NetworkFixture::new();
    let base = fx.add(TestNode::new(1, NodeKind::DockingBase).owned_by(5));
    let turret = fx.add(TestNode::new(2, NodeKind::Turret).owned_by(6).at(60.0, 0.0));

    assert!(fx.connect(1, 2).is_err());
    assert_eq!(base.owner().0, 5);
    assert_eq!(turret.owner().0, 6);
    assert!(turret.is_orphaned());
    assert_untouched(&fx, &[]);
}

#[test]
fn denied_actor_cannot_reweight_or_break() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase));
    let turret = fx.add(TestNode::new(2, NodeKind::Turret));
    fx.add(TestNode::new(3, NodeKind::Reactor));
    fx.connect(1, 2).unwrap();
    fx.connect(3, 2).unwrap();
    let weight_before = fx.engine.out_connections(Eid(3)).unwrap()[0].weight;
    fx.broadcasts.clear();
    fx.audit.clear();
    fx.orphan_events.clear();

    fx.access.deny(ACTOR, Eid(3));
    assert_eq!(
        fx.set_weight(3, 2, 90.0),
        Err(PbsError::AccessDenied {
            node: Eid(3),
            actor: ACTOR
        })
    );
    let weight_after = fx.engine.out_connections(Eid(3)).unwrap()[0].weight;
    assert!((weight_after - weight_before).abs() < 1e-9);

    fx.access.deny(ACTOR, Eid(1));
    assert_eq!(
        fx.disconnect(1, 2),
        Err(PbsError::AccessDenied {
            node: Eid(1),
            actor: ACTOR
        })
    );
    assert!(!turret.is_orphaned());
    assert_untouched(&fx, &[(1, 2), (3, 2)]);
}
