// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier newtypes shared by the engine and its collaborators.

use core::fmt;

/// Stable 64-bit identifier of a deployed structure.
///
/// Eids are assigned by the entity layer when a structure is deployed and stay
/// valid until it is destroyed. The engine never mints them.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eid(pub u64);

/// Identifier of the corporation controlling a node.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnerId(pub u64);

/// Identifier of the character issuing a request.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u64);

/// Persisted identity of a connection row.
///
/// Issued by [`crate::ConnectionStore::insert_edge`]; only meaningful while
/// the row exists.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub u64);

/// Zone a node is deployed in. Carried on audit entries only.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneId(pub u32);

/// Hour-of-day offset of a node's reinforcement window.
///
/// Values wrap into `0..24` on construction.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReinforcementOffset(u8);

impl ReinforcementOffset {
    /// Builds an offset from an hour value, wrapping past midnight.
    #[must_use]
    pub const fn from_hours(hours: u8) -> Self {
        Self(hours % 24)
    }

    /// Returns the offset in hours (`0..24`).
    #[must_use]
    pub const fn hours(self) -> u8 {
        self.0
    }
}

macro_rules! display_raw {
    ($($ty:ty => $prefix:literal),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!($prefix, "{}"), self.0)
                }
            }
        )*
    };
}

display_raw!(
    Eid => "eid:",
    OwnerId => "owner:",
    ActorId => "actor:",
    EdgeId => "edge:",
    ZoneId => "zone:",
    ReinforcementOffset => "+",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_wraps_past_midnight() {
        assert_eq!(ReinforcementOffset::from_hours(23).hours(), 23);
        assert_eq!(ReinforcementOffset::from_hours(24).hours(), 0);
        assert_eq!(ReinforcementOffset::from_hours(30).hours(), 6);
    }

    #[test]
    fn display_carries_prefix() {
        assert_eq!(Eid(7).to_string(), "eid:7");
        assert_eq!(EdgeId(3).to_string(), "edge:3");
        assert_eq!(ReinforcementOffset::from_hours(5).to_string(), "+5");
    }
}
