//! Tessera Routing - Partition-aware client-side load balancing.
//!
//! This crate routes requests across a partitioned, replicated cluster
//! without a central router. Given an identifier it finds the owning
//! partition and a live node to serve it; for scatter-gather reads it picks
//! one node per partition so that every partition is covered exactly once.
//!
//! # Design (`TigerStyle`)
//!
//! - **Immutable snapshots**: Each endpoint snapshot builds a fresh
//!   `PartitionMap`; topology changes swap whole maps atomically
//! - **Lock-free hot path**: Round-robin cursors and availability flags are
//!   atomics scoped to one partition
//! - **Explicit degraded service**: Missing partitions either warn or fail,
//!   never pass silently
//!
//! # Example
//!
//! ```rust
//! use tessera_core::{NodeId, PartitionId};
//! use tessera_routing::{Endpoint, LoadBalancerConfig, LoadBalancerFactory};
//!
//! let config = LoadBalancerConfig::new(4).with_allow_missing_partitions(false);
//! let factory = LoadBalancerFactory::<str>::xxh3(config).unwrap();
//!
//! let all = || (0..4).map(PartitionId::new);
//! let lb = factory.new_load_balancer(vec![
//!     Endpoint::new(NodeId::new(1), all()),
//!     Endpoint::new(NodeId::new(2), all()),
//! ]);
//!
//! assert!(lb.node_for_id("user-42", None).is_some());
//! let coverage = lb.nodes_for_one_replica(None).unwrap();
//! assert_eq!(coverage.values().map(|p| p.len()).sum::<usize>(), 4);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod balancer;
mod config;
mod error;
mod hasher;
mod partition_map;
mod policy;
mod table;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use balancer::{LoadBalancerFactory, NodeAssignment, PartitionedLoadBalancer, INITIAL_VERSION};
pub use config::{LoadBalancerConfig, NUM_PARTITIONS_DEFAULT};
pub use error::{ConfigError, RoutingError, RoutingResult};
pub use hasher::{partition_for_hash, xxh3_hash, HashFn, PartitionHasher};
pub use partition_map::{Endpoint, PartitionEntry, PartitionMap};
pub use policy::MissingPartitionPolicy;
pub use table::RoutingTable;
