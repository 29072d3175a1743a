// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine tuning knobs.
use crate::connection::{clamp_weight, DEFAULT_THROUGHPUT_WEIGHT};

/// Bandwidth a base-less network may hold: a single minimal consumer.
pub const DEFAULT_HUBLESS_BANDWIDTH_LIMIT: u32 = 1;

/// Tuning for [`crate::ConnectionEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Bandwidth budget of a merge where neither side has a docking base.
    pub hubless_bandwidth_limit: u32,
    /// Weight of new producer to consumer edges.
    pub default_weight: f64,
    /// Copy the base's reinforcement offset onto members after a merge.
    pub propagate_reinforcement: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hubless_bandwidth_limit: DEFAULT_HUBLESS_BANDWIDTH_LIMIT,
            default_weight: DEFAULT_THROUGHPUT_WEIGHT,
            propagate_reinforcement: true,
        }
    }
}

impl EngineConfig {
    /// Returns a copy with out-of-range values pulled back into range.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            default_weight: clamp_weight(self.default_weight),
            ..self
        }
    }
}
