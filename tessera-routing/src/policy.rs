//! Degraded-service policy for partitions without an eligible node.
//!
//! Only coverage selection consults the policy. Single-node lookups return
//! `None` for a missing partition and leave the decision to the caller.

use tessera_core::PartitionId;
use tracing::warn;

use crate::error::{RoutingError, RoutingResult};

/// What coverage selection does when a partition has no eligible node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPartitionPolicy {
    /// Warn and continue with partial coverage.
    #[default]
    Lenient,
    /// Abort the whole coverage computation.
    Strict,
}

impl MissingPartitionPolicy {
    /// Maps the `allow_missing_partitions` flag to a policy.
    #[must_use]
    pub const fn from_allow_missing(allow_missing_partitions: bool) -> Self {
        if allow_missing_partitions {
            Self::Lenient
        } else {
            Self::Strict
        }
    }

    /// Returns true if missing partitions are tolerated.
    #[must_use]
    pub const fn allows_missing(self) -> bool {
        matches!(self, Self::Lenient)
    }

    /// Applies the policy to one unavailable partition.
    ///
    /// # Errors
    /// Returns `RoutingError::PartitionUnavailable` under the strict policy.
    pub fn on_missing(self, partition: PartitionId) -> RoutingResult<()> {
        match self {
            Self::Lenient => {
                warn!(
                    partition = %partition,
                    "partition is unavailable, continuing with the remaining partitions"
                );
                Ok(())
            }
            Self::Strict => Err(RoutingError::PartitionUnavailable { partition }),
        }
    }
}
