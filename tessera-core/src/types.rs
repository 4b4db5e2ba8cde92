//! Strongly-typed identifiers for routing entities.
//!
//! Following `TigerStyle`: explicit types prevent bugs from mixing up IDs.
//! Node IDs are 64-bit; partition IDs are 32-bit since partition counts are
//! bounded by [`PARTITIONS_MAX`](crate::PARTITIONS_MAX).

use std::fmt;

/// Macro to generate strongly-typed ID wrappers.
///
/// Each ID type wraps an unsigned integer and provides:
/// - Type safety (can't mix `NodeId` with `PartitionId`)
/// - Debug/Display formatting
/// - Zero-cost abstraction (same as the raw integer)
macro_rules! define_id {
    ($name:ident, $inner:ty, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Creates a new ID from a raw value.
            #[inline]
            #[must_use]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $prefix, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.get()
            }
        }
    };
}

define_id!(NodeId, u64, "node", "Unique identifier for a serving node in the cluster.");
define_id!(
    PartitionId,
    u32,
    "partition",
    "A partition of the keyspace, numbered `0..num_partitions`."
);

impl PartitionId {
    /// Returns the partition as a `usize` index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque capability bitmask advertised by a node.
///
/// A node is eligible for a request iff every bit of the requirement is set
/// in the node's mask. The core never interprets individual bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Capabilities(u64);

impl Capabilities {
    /// No capabilities. Only satisfies an empty requirement.
    pub const NONE: Self = Self(0);

    /// Every capability bit set.
    pub const ALL: Self = Self(u64::MAX);

    /// Creates a capability mask from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if this mask contains every bit of `required`.
    #[inline]
    #[must_use]
    pub const fn contains(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Returns true if this mask satisfies an optional requirement.
    ///
    /// `None` means the request has no capability filter.
    #[inline]
    #[must_use]
    pub const fn satisfies(self, required: Option<Self>) -> bool {
        match required {
            Some(required) => self.contains(required),
            None => true,
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "caps({:#x})", self.0)
    }
}

impl From<u64> for Capabilities {
    fn from(bits: u64) -> Self {
        Self::from_bits(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let node = NodeId::new(42);
        assert_eq!(format!("{node}"), "node-42");
        assert_eq!(format!("{node:?}"), "node(42)");

        let partition = PartitionId::new(7);
        assert_eq!(format!("{partition}"), "partition-7");
        assert_eq!(partition.index(), 7);
    }

    #[test]
    fn test_id_ordering() {
        let a = PartitionId::new(1);
        let b = PartitionId::new(2);

        assert!(a < b);
        assert_eq!(a, PartitionId::from(1));
        assert_eq!(u32::from(b), 2);
    }

    #[test]
    fn test_capabilities_contains() {
        let node = Capabilities::from_bits(0b1011);

        assert!(node.contains(Capabilities::from_bits(0b0001)));
        assert!(node.contains(Capabilities::from_bits(0b1010)));
        assert!(!node.contains(Capabilities::from_bits(0b0100)));
        assert!(node.contains(Capabilities::NONE));
        assert!(!Capabilities::NONE.contains(Capabilities::from_bits(1)));
    }

    #[test]
    fn test_capabilities_satisfies_optional_requirement() {
        let node = Capabilities::NONE;

        assert!(node.satisfies(None));
        assert!(node.satisfies(Some(Capabilities::NONE)));
        assert!(!node.satisfies(Some(Capabilities::from_bits(0b10))));
        assert!(Capabilities::ALL.satisfies(Some(Capabilities::from_bits(0b10))));
    }
}
