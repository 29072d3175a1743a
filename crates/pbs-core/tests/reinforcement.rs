// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reinforcement offset alignment after merges.
#![allow(missing_docs, clippy::unwrap_used)]

use pbs_core::{EngineConfig, Eid, NodeKind, PbsNode, ReinforcementOffset};
use pbs_dry_tests::{NetworkFixture, TestNode, ACTOR};

fn hours(h: u8) -> ReinforcementOffset {
    ReinforcementOffset::from_hours(h)
}

#[test]
fn members_adopt_the_base_offset_after_commit() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase).with_offset(5));
    let turret = fx.add(TestNode::new(2, NodeKind::Turret).with_offset(9));
    let wall = fx.add(TestNode::new(3, NodeKind::Wall).with_offset(5));
    fx.connect(3, 2).unwrap();

    let mut uow = fx.engine.begin().unwrap();
    fx.engine
        .make_connection(&mut uow, Eid(1), Eid(2), ACTOR)
        .unwrap();
    assert_eq!(turret.reinforcement_offset(), hours(9));

    fx.engine.commit(uow).unwrap();
    assert_eq!(turret.reinforcement_offset(), hours(5));
    assert_eq!(turret.forced_offsets(), 1);
    // Already aligned members are left alone.
    assert_eq!(wall.forced_offsets(), 0);
}

#[test]
fn rollback_skips_propagation() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::DockingBase).with_offset(5));
    let turret = fx.add(TestNode::new(2, NodeKind::Turret));

    let mut uow = fx.engine.begin().unwrap();
    fx.engine
        .make_connection(&mut uow, Eid(1), Eid(2), ACTOR)
        .unwrap();
    fx.engine.rollback(uow);
    assert_eq!(turret.forced_offsets(), 0);
}

#[test]
fn propagation_can_be_disabled() {
    let mut fx = NetworkFixture::with_config(EngineConfig {
        propagate_reinforcement: false,
        ..EngineConfig::default()
    });
    fx.add(TestNode::new(1, NodeKind::DockingBase).with_offset(5));
    let turret = fx.add(TestNode::new(2, NodeKind::Turret).with_offset(9));
    fx.connect(1, 2).unwrap();
    assert_eq!(turret.reinforcement_offset(), hours(9));
}

#[test]
fn baseless_merges_do_not_propagate() {
    let mut fx = NetworkFixture::new();
    fx.add(TestNode::new(1, NodeKind::Wall).with_offset(3));
    let wall = fx.add(TestNode::new(2, NodeKind::Wall).with_offset(7));
    fx.connect(1, 2).unwrap();
    assert_eq!(wall.forced_offsets(), 0);
}
