//! Partition hasher - maps identifiers to partitions.
//!
//! The hash function is supplied by the integrating application. The core
//! only requires that it is deterministic; `xxh3_hash` is provided for
//! byte-like identifiers.

use std::fmt;
use std::sync::Arc;

use tessera_core::{PartitionId, PARTITIONS_MAX};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::ConfigError;

/// Shared, thread-safe identifier hash function.
pub type HashFn<Id> = Arc<dyn Fn(&Id) -> i64 + Send + Sync>;

/// Maps identifiers to partitions with `|hash(id)| mod num_partitions`.
pub struct PartitionHasher<Id: ?Sized> {
    num_partitions: u32,
    hash: HashFn<Id>,
}

impl<Id: ?Sized> PartitionHasher<Id> {
    /// Creates a hasher over `num_partitions` partitions.
    ///
    /// # Errors
    /// Returns an error if `num_partitions` is zero or exceeds
    /// `PARTITIONS_MAX`.
    pub fn new<F>(num_partitions: u32, hash: F) -> Result<Self, ConfigError>
    where
        F: Fn(&Id) -> i64 + Send + Sync + 'static,
    {
        if num_partitions == 0 || num_partitions > PARTITIONS_MAX {
            return Err(ConfigError::InvalidPartitionCount {
                count: num_partitions,
                max: PARTITIONS_MAX,
            });
        }
        Ok(Self {
            num_partitions,
            hash: Arc::new(hash),
        })
    }

    /// Returns the partition count.
    #[must_use]
    pub const fn num_partitions(&self) -> u32 {
        self.num_partitions
    }

    /// Returns the raw hash of an identifier.
    #[must_use]
    pub fn hash(&self, id: &Id) -> i64 {
        (self.hash)(id)
    }

    /// Returns the partition owning `id`.
    #[must_use]
    pub fn partition_for_id(&self, id: &Id) -> PartitionId {
        partition_for_hash(self.hash(id), self.num_partitions)
    }
}

impl<Id: AsRef<[u8]> + ?Sized + 'static> PartitionHasher<Id> {
    /// Creates a hasher that hashes identifier bytes with xxHash3.
    ///
    /// # Errors
    /// Returns an error if `num_partitions` is out of range.
    pub fn xxh3(num_partitions: u32) -> Result<Self, ConfigError> {
        Self::new(num_partitions, |id: &Id| xxh3_hash(id.as_ref()))
    }
}

impl<Id: ?Sized> Clone for PartitionHasher<Id> {
    fn clone(&self) -> Self {
        Self {
            num_partitions: self.num_partitions,
            hash: Arc::clone(&self.hash),
        }
    }
}

impl<Id: ?Sized> fmt::Debug for PartitionHasher<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionHasher")
            .field("num_partitions", &self.num_partitions)
            .finish_non_exhaustive()
    }
}

/// Reduces a signed hash to a partition.
///
/// `i64::MIN` has no positive counterpart; `unsigned_abs` maps it to `2^63`
/// so the result stays in range.
///
/// # Panics
/// Panics if `num_partitions` is zero.
#[must_use]
pub fn partition_for_hash(hash: i64, num_partitions: u32) -> PartitionId {
    assert!(num_partitions > 0, "num_partitions must be positive");
    let partition = hash.unsigned_abs() % u64::from(num_partitions);
    // Safety: partition < num_partitions which fits in u32.
    #[allow(clippy::cast_possible_truncation)]
    PartitionId::new(partition as u32)
}

/// Hashes bytes with xxHash3, reinterpreted as a signed value.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn xxh3_hash(bytes: &[u8]) -> i64 {
    xxh3_64(bytes) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_in_range() {
        for hash in [0, 1, -1, 17, -17, i64::MAX, i64::MIN, i64::MIN + 1] {
            let partition = partition_for_hash(hash, 7);
            assert!(partition.get() < 7, "hash {hash} escaped range");
        }
    }

    #[test]
    fn test_min_hash_does_not_overflow() {
        // |i64::MIN| = 2^63, and 2^63 mod 10 = 8.
        assert_eq!(partition_for_hash(i64::MIN, 10), PartitionId::new(8));
        assert_eq!(partition_for_hash(i64::MIN, 1), PartitionId::new(0));
    }

    #[test]
    fn test_absolute_value_before_modulo() {
        assert_eq!(partition_for_hash(-7, 4), PartitionId::new(3));
        assert_eq!(partition_for_hash(7, 4), PartitionId::new(3));
        assert_eq!(partition_for_hash(12, 4), PartitionId::new(0));
    }

    #[test]
    fn test_congruent_hashes_share_partition() {
        let hasher = PartitionHasher::<u64>::new(16, |id| i64::try_from(*id).unwrap_or(i64::MAX))
            .unwrap();

        for base in 0..16_u64 {
            let expected = hasher.partition_for_id(&base);
            for k in 1..8 {
                assert_eq!(hasher.partition_for_id(&(base + 16 * k)), expected);
            }
        }
    }

    #[test]
    fn test_user_supplied_hash_is_used() {
        let hasher = PartitionHasher::<str>::new(4, |_| i64::MIN).unwrap();
        assert_eq!(hasher.hash("anything"), i64::MIN);
        assert_eq!(hasher.partition_for_id("anything"), PartitionId::new(0));
    }

    #[test]
    fn test_xxh3_hasher_is_deterministic() {
        let hasher = PartitionHasher::<[u8]>::xxh3(32).unwrap();
        let a = hasher.partition_for_id(b"user-1");
        let b = hasher.partition_for_id(b"user-1");

        assert_eq!(a, b);
        assert!(a.get() < 32);
        assert_eq!(hasher.hash(b"user-1"), xxh3_hash(b"user-1"));
    }

    #[test]
    fn test_invalid_partition_count() {
        let result = PartitionHasher::<str>::new(0, |_| 0);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidPartitionCount { count: 0, .. })
        ));
    }
}
