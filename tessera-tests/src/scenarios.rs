//! Reusable topologies for routing tests.
//!
//! Random topologies are generated from a seed so any failure can be
//! replayed exactly.

use rand::Rng;
use tessera_core::{Capabilities, NodeId, PartitionId};
use tessera_routing::Endpoint;

/// Seeds for reproducible testing.
pub mod seeds {
    /// Standard test seeds that have historically found bugs.
    pub const REGRESSION_SEEDS: &[u64] = &[
        42,
        12345,
        0xDEAD_BEEF,
        999,
        7777,
        0x1337,
        0xCAFE_BABE,
        1,
        u64::MAX,
        0,
    ];

    /// Number of random seeds to test in CI.
    pub const CI_SEED_COUNT: u32 = 100;
}

/// Shape of a randomly generated topology.
#[derive(Debug, Clone, Copy)]
pub struct TopologyConfig {
    /// Partitions in the keyspace.
    pub num_partitions: u32,
    /// Nodes in the snapshot.
    pub num_nodes: u64,
    /// Probability that a node serves any given partition.
    pub serve_probability: f64,
    /// Number of low capability bits nodes may advertise.
    pub capability_bits: u32,
    /// Probability that a candidate slot is marked unavailable.
    pub unavailable_probability: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            num_partitions: 32,
            num_nodes: 6,
            serve_probability: 0.3,
            capability_bits: 2,
            unavailable_probability: 0.2,
        }
    }
}

/// Generates an endpoint snapshot.
///
/// Some partitions may end up with no candidate at all, which exercises the
/// degraded-service policy.
pub fn random_endpoints(rng: &mut impl Rng, config: &TopologyConfig) -> Vec<Endpoint> {
    let capability_mask = (1_u64 << config.capability_bits) - 1;

    (0..config.num_nodes)
        .map(|node| {
            let partitions: Vec<PartitionId> = (0..config.num_partitions)
                .filter(|_| rng.gen_bool(config.serve_probability))
                .map(PartitionId::new)
                .collect();
            let capabilities = Capabilities::from_bits(rng.gen::<u64>() & capability_mask);
            Endpoint::new(NodeId::new(node), partitions).with_capabilities(capabilities)
        })
        .collect()
}

/// Picks a random capability requirement, or `None` for no filter.
pub fn random_capability(rng: &mut impl Rng, config: &TopologyConfig) -> Option<Capabilities> {
    if rng.gen_bool(0.5) {
        None
    } else {
        let mask = (1_u64 << config.capability_bits) - 1;
        Some(Capabilities::from_bits(rng.gen::<u64>() & mask))
    }
}

/// Endpoints where every node serves every partition.
#[must_use]
pub fn fully_replicated(num_partitions: u32, num_nodes: u64) -> Vec<Endpoint> {
    (0..num_nodes)
        .map(|node| Endpoint::new(NodeId::new(node), (0..num_partitions).map(PartitionId::new)))
        .collect()
}
