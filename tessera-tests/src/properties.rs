//! Property definitions and checkers for routing tests.
//!
//! Properties are invariants that must hold for every snapshot and every
//! selection. Checkers return the violations they find rather than panicking
//! so randomized tests can report the seed alongside every failure.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tessera_core::{Capabilities, NodeId, PartitionId};
use tessera_routing::{NodeAssignment, PartitionMap};

// ============================================================================
// Property Violation Types
// ============================================================================

/// A violation of a routing property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A partition was assigned to more than one node.
    PartitionCoveredTwice {
        /// The partition.
        partition: u32,
        /// The first node it was assigned to.
        first: u64,
        /// The second node it was assigned to.
        second: u64,
    },
    /// A node was assigned a partition it is not a candidate for.
    NodeCannotServe {
        /// The node.
        node: u64,
        /// The partition.
        partition: u32,
    },
    /// A node was selected although it is unavailable or lacks a capability.
    IneligibleNodeSelected {
        /// The node.
        node: u64,
        /// The partition.
        partition: u32,
    },
    /// Coverage included a partition nobody asked for.
    PartitionNotRequested {
        /// The partition.
        partition: u32,
    },
    /// A partition with an eligible candidate was left uncovered.
    ServablePartitionMissing {
        /// The partition.
        partition: u32,
    },
    /// Round-robin handed out an unequal share to a candidate.
    UnfairShare {
        /// The partition.
        partition: u32,
        /// The node.
        node: u64,
        /// Times the node was selected.
        actual: u64,
        /// Times it should have been selected.
        expected: u64,
    },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PartitionCoveredTwice {
                partition,
                first,
                second,
            } => write!(
                f,
                "Partition {partition} covered twice: by node {first} and node {second}"
            ),
            Self::NodeCannotServe { node, partition } => {
                write!(f, "Node {node} assigned partition {partition} it does not serve")
            }
            Self::IneligibleNodeSelected { node, partition } => {
                write!(f, "Ineligible node {node} selected for partition {partition}")
            }
            Self::PartitionNotRequested { partition } => {
                write!(f, "Partition {partition} covered but not requested")
            }
            Self::ServablePartitionMissing { partition } => {
                write!(f, "Partition {partition} has an eligible node but was not covered")
            }
            Self::UnfairShare {
                partition,
                node,
                actual,
                expected,
            } => write!(
                f,
                "Node {node} selected {actual} times for partition {partition}, \
                 expected {expected}"
            ),
        }
    }
}

// ============================================================================
// Property Checkers
// ============================================================================

/// Checks that `assignment` covers `requested` exactly once with eligible
/// nodes, leaving out only partitions that have no eligible node.
///
/// Must be called while availability flags are not being changed.
#[must_use]
pub fn check_coverage(
    map: &PartitionMap,
    requested: &BTreeSet<PartitionId>,
    capability: Option<Capabilities>,
    assignment: &NodeAssignment,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut owner: BTreeMap<PartitionId, NodeId> = BTreeMap::new();

    for (&node, partitions) in assignment {
        for &partition in partitions {
            if let Some(first) = owner.insert(partition, node) {
                violations.push(Violation::PartitionCoveredTwice {
                    partition: partition.get(),
                    first: first.get(),
                    second: node.get(),
                });
            }

            if !requested.contains(&partition) {
                violations.push(Violation::PartitionNotRequested {
                    partition: partition.get(),
                });
            }

            let is_candidate = map
                .candidates(partition)
                .is_some_and(|candidates| candidates.iter().any(|c| c.node() == node));
            if !is_candidate {
                violations.push(Violation::NodeCannotServe {
                    node: node.get(),
                    partition: partition.get(),
                });
            } else if !map.eligible_nodes(partition, capability).contains(&node) {
                violations.push(Violation::IneligibleNodeSelected {
                    node: node.get(),
                    partition: partition.get(),
                });
            }
        }
    }

    for &partition in requested {
        if !owner.contains_key(&partition) && !map.eligible_nodes(partition, capability).is_empty()
        {
            violations.push(Violation::ServablePartitionMissing {
                partition: partition.get(),
            });
        }
    }

    violations
}

/// Checks that `selections` for one partition split evenly across the
/// partition's eligible candidates.
///
/// Only meaningful when the number of selections is a multiple of the
/// number of eligible candidates and nothing was skipped.
#[must_use]
pub fn check_fair_share(
    map: &PartitionMap,
    partition: PartitionId,
    capability: Option<Capabilities>,
    selections: &[NodeId],
) -> Vec<Violation> {
    let eligible = map.eligible_nodes(partition, capability);
    if eligible.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<NodeId, u64> = HashMap::new();
    for &node in selections {
        *counts.entry(node).or_default() += 1;
    }

    let expected = selections.len() as u64 / eligible.len() as u64;
    let mut violations = Vec::new();
    for node in eligible {
        let actual = counts.remove(&node).unwrap_or(0);
        if actual != expected {
            violations.push(Violation::UnfairShare {
                partition: partition.get(),
                node: node.get(),
                actual,
                expected,
            });
        }
    }
    for node in counts.into_keys() {
        violations.push(Violation::IneligibleNodeSelected {
            node: node.get(),
            partition: partition.get(),
        });
    }
    violations
}
