//! Routing limits.
//!
//! Following TigerStyle: put limits on everything. Partition maps are sized
//! from these bounds at build time and never grow afterwards.

/// Maximum number of partitions a routing snapshot may describe.
pub const PARTITIONS_MAX: u32 = 1 << 20;

/// Maximum number of candidate endpoints kept for a single partition.
///
/// Endpoints beyond this bound are dropped by the map builder.
pub const CANDIDATES_PER_PARTITION_MAX: usize = 1024;
