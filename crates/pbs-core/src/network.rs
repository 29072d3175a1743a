// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reachable node sets.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::ident::{Eid, OwnerId};
use crate::node::PbsNode;

/// Set of nodes reachable from a start node, following edges in either
/// direction. Derived on demand and never stored.
#[derive(Clone, Default)]
pub struct Network {
    members: BTreeMap<Eid, Arc<dyn PbsNode>>,
}

impl Network {
    pub(crate) fn insert(&mut self, node: Arc<dyn PbsNode>) {
        self.members.insert(node.eid(), node);
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// `true` if the network has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// `true` if `eid` is a member.
    pub fn contains(&self, eid: Eid) -> bool {
        self.members.contains_key(&eid)
    }

    /// Member ids in ascending order.
    pub fn eids(&self) -> impl Iterator<Item = Eid> + '_ {
        self.members.keys().copied()
    }

    /// Member handles in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<dyn PbsNode>> {
        self.members.values()
    }

    /// Every hub in the network. More than one means the topology is broken.
    pub fn hubs(&self) -> impl Iterator<Item = &Arc<dyn PbsNode>> {
        self.members.values().filter(|node| node.is_hub())
    }

    /// The network's hub, if any.
    pub fn hub(&self) -> Option<&Arc<dyn PbsNode>> {
        self.hubs().next()
    }

    /// `true` when no hub serves this network.
    pub fn is_orphaned(&self) -> bool {
        self.hub().is_none()
    }

    /// Bandwidth used by every non-hub member.
    pub fn bandwidth_usage(&self) -> u64 {
        self.members
            .values()
            .filter(|node| !node.is_hub())
            .map(|node| u64::from(node.bandwidth_usage()))
            .sum()
    }

    /// Distinct owners of the members.
    pub fn owners(&self) -> Vec<OwnerId> {
        let mut owners: Vec<OwnerId> = self.members.values().map(|n| n.owner()).collect();
        owners.sort_unstable();
        owners.dedup();
        owners
    }

    /// Condensed figures for info panels.
    pub fn summary(&self) -> NetworkSummary {
        let hub = self.hub();
        NetworkSummary {
            members: self.len(),
            hub: hub.map(|h| h.eid()),
            bandwidth_used: self.bandwidth_usage(),
            bandwidth_capacity: hub.and_then(|h| h.bandwidth_capacity()).map(u64::from),
        }
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.members.keys()).finish()
    }
}

/// Condensed view of a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSummary {
    /// Member count, hub included.
    pub members: usize,
    /// Hub id, if the network has one.
    pub hub: Option<Eid>,
    /// Bandwidth used by non-hub members.
    pub bandwidth_used: u64,
    /// Hub budget, if the network has a hub.
    pub bandwidth_capacity: Option<u64>,
}
