//! Load balancer configuration.

use tessera_core::PARTITIONS_MAX;

use crate::error::ConfigError;
use crate::policy::MissingPartitionPolicy;

/// Default partition count.
pub const NUM_PARTITIONS_DEFAULT: u32 = 1;

/// Configuration for a partitioned load balancer.
///
/// The partition count is fixed for the lifetime of a factory; every
/// snapshot built from that factory uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadBalancerConfig {
    /// Number of partitions in the keyspace.
    pub num_partitions: u32,
    /// Whether coverage selection continues when a partition has no
    /// eligible node (lenient) or fails (strict).
    pub allow_missing_partitions: bool,
}

impl LoadBalancerConfig {
    /// Creates a lenient configuration for the given partition count.
    #[must_use]
    pub const fn new(num_partitions: u32) -> Self {
        Self {
            num_partitions,
            allow_missing_partitions: true,
        }
    }

    /// Sets the partition count.
    #[must_use]
    pub const fn with_num_partitions(mut self, num_partitions: u32) -> Self {
        self.num_partitions = num_partitions;
        self
    }

    /// Sets whether missing partitions are tolerated during coverage selection.
    #[must_use]
    pub const fn with_allow_missing_partitions(mut self, allow: bool) -> Self {
        self.allow_missing_partitions = allow;
        self
    }

    /// Returns the degraded-service policy this configuration selects.
    #[must_use]
    pub const fn policy(&self) -> MissingPartitionPolicy {
        MissingPartitionPolicy::from_allow_missing(self.allow_missing_partitions)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the partition count is zero or exceeds
    /// `PARTITIONS_MAX`.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.num_partitions == 0 || self.num_partitions > PARTITIONS_MAX {
            return Err(ConfigError::InvalidPartitionCount {
                count: self.num_partitions,
                max: PARTITIONS_MAX,
            });
        }
        Ok(())
    }
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self::new(NUM_PARTITIONS_DEFAULT)
    }
}
