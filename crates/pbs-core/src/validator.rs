// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type compatibility rules for new connections.
use crate::error::PbsError;
use crate::node::NodeKind;

/// Checks whether a `source` kind may target a `target` kind.
///
/// `target_incoming` lists the kinds already feeding into the target; it is
/// only consulted for the one-facility-per-subtype rule on docking bases.
///
/// Rules:
/// - a facility targets only a docking base that has no facility of the same
///   subtype yet;
/// - a facility upgrade targets only a facility;
/// - core producers target only nodes that accept core;
/// - highways link only to highways, and nothing else may target a highway;
/// - every other kind may target any non-highway node.
pub fn validate<I>(source: NodeKind, target: NodeKind, target_incoming: I) -> Result<(), PbsError>
where
    I: IntoIterator<Item = NodeKind>,
{
    let compatible = match source {
        NodeKind::Facility(facility) => {
            if target != NodeKind::DockingBase {
                return Err(PbsError::TargetIsIncompatible);
            }
            if target_incoming
                .into_iter()
                .any(|kind| kind == NodeKind::Facility(facility))
            {
                return Err(PbsError::FacilityTypeAlreadyConnected);
            }
            true
        }
        NodeKind::FacilityUpgrade => matches!(target, NodeKind::Facility(_)),
        NodeKind::CoreTransmitter
        | NodeKind::Reactor
        | NodeKind::EnergyWell
        | NodeKind::Capacitor => target.accepts_throughput(),
        NodeKind::Highway => target == NodeKind::Highway,
        NodeKind::DockingBase
        | NodeKind::ControlTower
        | NodeKind::Turret
        | NodeKind::EffectEmitter
        | NodeKind::Wall => target != NodeKind::Highway,
    };
    if compatible {
        Ok(())
    } else {
        Err(PbsError::TargetIsIncompatible)
    }
}
