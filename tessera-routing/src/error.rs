//! Routing error types.

use tessera_core::PartitionId;

/// Errors from routing operations.
///
/// A node simply not being available is not an error: single-node lookups
/// return `None` and callers decide whether that is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// A partition has no eligible node and the strict policy is in effect.
    #[error("{partition} is unavailable, cannot serve requests")]
    PartitionUnavailable {
        /// The partition that could not be covered.
        partition: PartitionId,
    },

    /// An availability update named a candidate slot that does not exist.
    #[error("no candidate at index {index} for {partition}")]
    CandidateNotFound {
        /// The partition that was addressed.
        partition: PartitionId,
        /// The candidate index that was addressed.
        index: usize,
    },
}

/// Errors from validating load balancer configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The partition count is zero or exceeds the supported maximum.
    #[error("invalid partition count: {count} (must be in 1..={max})")]
    InvalidPartitionCount {
        /// The configured count.
        count: u32,
        /// Maximum allowed.
        max: u32,
    },
}

/// Result type for routing operations.
pub type RoutingResult<T> = Result<T, RoutingError>;
