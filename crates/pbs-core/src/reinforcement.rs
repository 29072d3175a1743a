// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reinforcement window alignment after a merge.
use std::sync::Arc;

use tracing::debug;

use crate::network::Network;
use crate::node::PbsNode;
use crate::uow::UnitOfWork;

/// Schedules a post-commit copy of the hub's reinforcement offset onto every
/// other member. Returns the number of members scheduled, zero when the
/// network has no hub.
///
/// The offset is read from the hub when the hook runs, not when it is
/// scheduled. Best effort: members already on the hub's offset are skipped.
pub fn schedule_propagation(network: &Network, uow: &mut UnitOfWork) -> usize {
    let Some(hub) = network.hub() else {
        return 0;
    };
    let hub = Arc::clone(hub);
    let members: Vec<Arc<dyn PbsNode>> = network
        .nodes()
        .filter(|node| node.eid() != hub.eid())
        .cloned()
        .collect();
    let scheduled = members.len();
    if scheduled == 0 {
        return 0;
    }
    uow.on_success(move || {
        let offset = hub.reinforcement_offset();
        let mut forced = 0usize;
        for member in &members {
            if member.reinforcement_offset() != offset {
                member.force_reinforcement_offset(offset);
                forced += 1;
            }
        }
        debug!(hub = %hub.eid(), %offset, forced, "propagated reinforcement offset");
    });
    scheduled
}
