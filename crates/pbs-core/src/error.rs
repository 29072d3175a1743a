// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine error type.

use thiserror::Error;

use crate::ident::{ActorId, Eid};
use crate::store::StoreError;
use crate::uow::TxId;

/// Errors returned by [`crate::ConnectionEngine`] operations.
///
/// Every variant except [`PbsError::Storage`] is a validation failure raised
/// before any write; none of them are worth retrying unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PbsError {
    /// The actor may not operate the node.
    #[error("[PBS_ACCESS_DENIED] {actor} may not operate {node}")]
    AccessDenied {
        /// Node the request targeted.
        node: Eid,
        /// Actor that issued it.
        actor: ActorId,
    },
    /// Source and target are the same node.
    #[error("[PBS_SELF_CONNECTION] a node cannot connect to itself")]
    SelfConnection,
    /// The pair is already linked in some direction.
    #[error("[PBS_NODE_ALREADY_CONNECTED] nodes are already connected")]
    NodeAlreadyConnected,
    /// Source reached its outgoing connection limit.
    #[error("[PBS_SOURCE_OUT_OF_OUT_CONNECTIONS] {0} has no free outgoing slot")]
    SourceOutOfOutConnections(Eid),
    /// Target reached its incoming connection limit.
    #[error("[PBS_TARGET_OUT_OF_IN_CONNECTIONS] {0} has no free incoming slot")]
    TargetOutOfInConnections(Eid),
    /// Target lies beyond the source's transmit radius.
    #[error("[PBS_TARGET_OUT_OF_TRANSMIT_RADIUS] distance {distance:.1} exceeds radius {radius:.1}")]
    TargetOutOfTransmitRadius {
        /// Source to target distance.
        distance: f64,
        /// Source transmit radius.
        radius: f64,
    },
    /// The compatibility rules reject this source/target kind pair.
    #[error("[PBS_TARGET_IS_INCOMPATIBLE] target type is incompatible with the source")]
    TargetIsIncompatible,
    /// The base already hosts a facility of the same subtype.
    #[error("[PBS_FACILITY_TYPE_ALREADY_CONNECTED] base already has this facility type")]
    FacilityTypeAlreadyConnected,
    /// Both networks already have a docking base.
    #[error("[PBS_BASES_IN_BOTH_NETWORKS] both networks contain a docking base")]
    BasesInBothNetworks,
    /// A member would end up beyond the base's network range.
    #[error("[PBS_NODE_OUTSIDE_NETWORK_RANGE] {0} is outside the base network range")]
    SomeNodeAreOutsideOfNetworkRange(Eid),
    /// Two base-less networks of different owners.
    #[error("[PBS_OWNER_MISMATCH] networks belong to different owners")]
    OwnerMismatch,
    /// The merged network would exceed its bandwidth budget.
    #[error("[PBS_TOO_MANY_NODES_OUT_OF_CPU] bandwidth {used} exceeds capacity {capacity}")]
    TooManyNodesOutOfCpu {
        /// Combined usage of the merged network.
        used: u64,
        /// Budget it would have to fit in.
        capacity: u64,
    },
    /// Only producer to consumer edges carry a weight.
    #[error("[PBS_ONLY_CONSUMERS_HAVE_WEIGHT] connection does not carry throughput")]
    OnlyConsumersHaveWeight,
    /// The edge exists but is owned by the other side.
    #[error("[PBS_CONNECTION_MUST_BE_OUTGOING] connection is not outgoing from this node")]
    ConnectionMustBeOutgoing,
    /// A participating structure is still under construction.
    #[error("[PBS_OBJECT_NOT_FULLY_CONSTRUCTED] {0} is not fully constructed")]
    ObjectNotFullyConstructed(Eid),
    /// The node directory does not know this id.
    #[error("[PBS_NODE_NOT_FOUND] {0}")]
    NodeNotFound(Eid),
    /// No edge links the two nodes.
    #[error("[PBS_CONNECTION_NOT_FOUND] {0} and {1} are not connected")]
    ConnectionNotFound(Eid, Eid),
    /// Another unit of work is still open on this engine.
    #[error("[PBS_TRANSACTION_IN_PROGRESS] unit of work {0} is still open")]
    TransactionInProgress(TxId),
    /// The unit of work was not opened by this engine, or was already closed.
    #[error("[PBS_UNKNOWN_TRANSACTION] unit of work {0} is not open on this engine")]
    UnknownTransaction(TxId),
    /// Persistence failed; the operation must be rolled back.
    #[error("[PBS_STORAGE] {0}")]
    Storage(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_stable_codes() {
        let err = PbsError::TooManyNodesOutOfCpu {
            used: 12,
            capacity: 10,
        };
        assert_eq!(
            err.to_string(),
            "[PBS_TOO_MANY_NODES_OUT_OF_CPU] bandwidth 12 exceeds capacity 10"
        );
        let err = PbsError::from(StoreError::Unavailable("db down".into()));
        assert_eq!(err.to_string(), "[PBS_STORAGE] [PBS_STORE_UNAVAILABLE] db down");
    }
}
