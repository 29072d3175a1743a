// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! [`NodeDirectory`] over a map of [`TestNode`]s.

use crate::node::TestNode;
use pbs_core::{Eid, NodeDirectory, PbsNode};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Shared registry of live test nodes. Removing a node simulates the
/// structure being destroyed while its edges still exist.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: RwLock<BTreeMap<Eid, Arc<TestNode>>>,
}

impl NodeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `node`, replacing any node with the same id.
    pub fn insert(&self, node: TestNode) -> Arc<TestNode> {
        let node = Arc::new(node);
        self.nodes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(node.eid(), Arc::clone(&node));
        node
    }

    /// Typed handle to a registered node.
    pub fn get(&self, eid: Eid) -> Option<Arc<TestNode>> {
        self.nodes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&eid)
            .cloned()
    }

    /// Unregisters `eid`, returning the handle it had.
    pub fn remove(&self, eid: Eid) -> Option<Arc<TestNode>> {
        self.nodes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&eid)
    }

    /// Registered ids in ascending order.
    pub fn eids(&self) -> Vec<Eid> {
        self.nodes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeDirectory for NodeRegistry {
    fn node(&self, eid: Eid) -> Option<Arc<dyn PbsNode>> {
        self.get(eid).map(|node| node as Arc<dyn PbsNode>)
    }
}
