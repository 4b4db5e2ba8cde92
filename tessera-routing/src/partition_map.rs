//! Partition map - immutable mapping of partitions to candidate nodes.
//!
//! A partition map is built once per endpoint snapshot and never mutated
//! afterwards. The only per-entry mutable state is the round-robin cursor and
//! the soft availability flags, both atomics, so any number of callers can
//! route through one map concurrently without locking.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tessera_core::{Capabilities, NodeId, PartitionId, CANDIDATES_PER_PARTITION_MAX};
use tracing::{debug, info, warn};

use crate::error::{RoutingError, RoutingResult};

/// A node together with the partitions it serves and its capabilities.
///
/// Endpoints are immutable once observed in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    node: NodeId,
    partitions: BTreeSet<PartitionId>,
    capabilities: Capabilities,
}

impl Endpoint {
    /// Creates an endpoint with no capabilities.
    #[must_use]
    pub fn new(node: NodeId, partitions: impl IntoIterator<Item = PartitionId>) -> Self {
        Self {
            node,
            partitions: partitions.into_iter().collect(),
            capabilities: Capabilities::NONE,
        }
    }

    /// Sets the capabilities advertised by the node.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns the serving node.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the partitions this endpoint serves.
    #[must_use]
    pub const fn partitions(&self) -> &BTreeSet<PartitionId> {
        &self.partitions
    }

    /// Returns the node's capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

/// Candidate nodes for one partition.
#[derive(Debug)]
pub struct PartitionEntry {
    /// Candidates in snapshot order. Never empty.
    candidates: Box<[Arc<Endpoint>]>,
    /// Round-robin position shared by every caller routing to this partition.
    cursor: AtomicUsize,
    /// Soft availability per candidate index.
    available: Box<[AtomicBool]>,
}

impl PartitionEntry {
    fn new(candidates: Vec<Arc<Endpoint>>) -> Self {
        debug_assert!(!candidates.is_empty());
        let available = candidates.iter().map(|_| AtomicBool::new(true)).collect();
        Self {
            candidates: candidates.into_boxed_slice(),
            cursor: AtomicUsize::new(0),
            available,
        }
    }

    /// Returns the candidates in snapshot order.
    #[must_use]
    pub fn candidates(&self) -> &[Arc<Endpoint>] {
        &self.candidates
    }

    /// Returns the number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false: empty partitions are omitted from the map.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Returns the current cursor value.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    /// Returns the availability flag of a candidate.
    #[must_use]
    pub fn is_available(&self, index: usize) -> Option<bool> {
        self.available.get(index).map(|flag| flag.load(Ordering::Acquire))
    }

    fn is_eligible(&self, index: usize, capability: Option<Capabilities>) -> bool {
        self.available[index].load(Ordering::Acquire)
            && self.candidates[index].capabilities().satisfies(capability)
    }

    /// Picks the next eligible candidate in round-robin order.
    ///
    /// The cursor is advanced exactly once per call, whatever the scan
    /// skips, so filtered and unfiltered callers never shift each other's
    /// starting positions.
    fn select(&self, capability: Option<Capabilities>) -> Option<NodeId> {
        let count = self.candidates.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);

        (0..count)
            .map(|offset| start.wrapping_add(offset) % count)
            .find(|&index| self.is_eligible(index, capability))
            .map(|index| self.candidates[index].node())
    }
}

/// Maps partitions to their candidate nodes.
///
/// Partitions that no endpoint serves are absent from the map.
#[derive(Debug)]
pub struct PartitionMap {
    /// Entries keyed by partition. Using `BTreeMap` keeps iteration ordered.
    entries: BTreeMap<PartitionId, PartitionEntry>,
    /// Total number of partitions in the keyspace.
    num_partitions: u32,
    /// Version of the snapshot this map was built from.
    version: u64,
}

impl PartitionMap {
    /// Builds a map from an endpoint snapshot.
    ///
    /// Each partition's candidates keep the order in which endpoints appear
    /// in the snapshot. A node listed twice for the same partition is kept
    /// once. Partitions outside `[0, num_partitions)` are ignored.
    #[must_use]
    pub fn build<I>(endpoints: I, num_partitions: u32, version: u64) -> Self
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let mut grouped: BTreeMap<PartitionId, Vec<Arc<Endpoint>>> = BTreeMap::new();
        let mut endpoint_count = 0_usize;

        for endpoint in endpoints {
            endpoint_count += 1;
            let endpoint = Arc::new(endpoint);
            for &partition in endpoint.partitions() {
                if partition.get() >= num_partitions {
                    debug!(
                        node = %endpoint.node(),
                        partition = %partition,
                        num_partitions,
                        "ignoring partition outside the keyspace"
                    );
                    continue;
                }

                let candidates = grouped.entry(partition).or_default();
                if candidates.iter().any(|c| c.node() == endpoint.node()) {
                    continue;
                }
                if candidates.len() >= CANDIDATES_PER_PARTITION_MAX {
                    warn!(
                        node = %endpoint.node(),
                        partition = %partition,
                        max = CANDIDATES_PER_PARTITION_MAX,
                        "too many candidates for partition, dropping endpoint"
                    );
                    continue;
                }
                candidates.push(Arc::clone(&endpoint));
            }
        }

        let entries: BTreeMap<_, _> = grouped
            .into_iter()
            .map(|(partition, candidates)| (partition, PartitionEntry::new(candidates)))
            .collect();

        debug!(
            version,
            endpoints = endpoint_count,
            served = entries.len(),
            num_partitions,
            "built partition map"
        );

        Self {
            entries,
            num_partitions,
            version,
        }
    }

    /// Returns the total number of partitions in the keyspace.
    #[must_use]
    pub const fn num_partitions(&self) -> u32 {
        self.num_partitions
    }

    /// Returns the snapshot version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the number of partitions with at least one candidate.
    #[must_use]
    pub fn served_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no partition has a candidate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry for a partition.
    #[must_use]
    pub fn entry(&self, partition: PartitionId) -> Option<&PartitionEntry> {
        self.entries.get(&partition)
    }

    /// Returns the candidates for a partition in snapshot order.
    #[must_use]
    pub fn candidates(&self, partition: PartitionId) -> Option<&[Arc<Endpoint>]> {
        self.entry(partition).map(PartitionEntry::candidates)
    }

    /// Returns an iterator over the partitions that have candidates.
    pub fn served_partitions(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.entries.keys().copied()
    }

    /// Returns every node that appears as a candidate, sorted and deduplicated.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<_> = self
            .entries
            .values()
            .flat_map(|entry| entry.candidates.iter().map(|c| c.node()))
            .collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }

    /// Selects the next eligible node for a partition in round-robin order.
    ///
    /// Returns `None` if the partition has no candidates or none of them is
    /// both available and capable.
    #[must_use]
    pub fn node_for_partition(
        &self,
        partition: PartitionId,
        capability: Option<Capabilities>,
    ) -> Option<NodeId> {
        self.entries.get(&partition)?.select(capability)
    }

    /// Returns every distinct available, capable node for a partition.
    ///
    /// Does not advance the cursor.
    #[must_use]
    pub fn eligible_nodes(
        &self,
        partition: PartitionId,
        capability: Option<Capabilities>,
    ) -> HashSet<NodeId> {
        self.entries
            .get(&partition)
            .map(|entry| {
                (0..entry.len())
                    .filter(|&index| entry.is_eligible(index, capability))
                    .map(|index| entry.candidates[index].node())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the availability flag of one candidate slot.
    #[must_use]
    pub fn is_available(&self, partition: PartitionId, index: usize) -> Option<bool> {
        self.entries.get(&partition)?.is_available(index)
    }

    /// Sets the availability flag of one candidate slot.
    ///
    /// # Errors
    /// Returns `RoutingError::CandidateNotFound` if the partition has no
    /// candidate at `index`.
    pub fn set_available(
        &self,
        partition: PartitionId,
        index: usize,
        available: bool,
    ) -> RoutingResult<()> {
        let flag = self
            .entries
            .get(&partition)
            .and_then(|entry| entry.available.get(index))
            .ok_or(RoutingError::CandidateNotFound { partition, index })?;
        flag.store(available, Ordering::Release);
        Ok(())
    }

    /// Marks unavailable every slot that was unavailable in `previous`.
    ///
    /// Slots are matched by partition and node, so a node marked down keeps
    /// its down flags across a rebuild even if its candidate index moved.
    /// Returns the number of slots carried over.
    pub fn carry_unavailable_from(&self, previous: &Self) -> usize {
        let mut carried = 0;
        for (partition, old_entry) in &previous.entries {
            let Some(entry) = self.entries.get(partition) else {
                continue;
            };
            let old_slots = old_entry.candidates.iter().zip(old_entry.available.iter());
            for (old_candidate, old_flag) in old_slots {
                if old_flag.load(Ordering::Acquire) {
                    continue;
                }
                let index = entry
                    .candidates
                    .iter()
                    .position(|c| c.node() == old_candidate.node());
                if let Some(index) = index {
                    entry.available[index].store(false, Ordering::Release);
                    carried += 1;
                }
            }
        }
        carried
    }

    /// Sets the availability of every candidate slot held by `node`.
    ///
    /// Returns the number of slots that changed state.
    pub fn set_node_available(&self, node: NodeId, available: bool) -> usize {
        let mut changed = 0;
        for entry in self.entries.values() {
            for (candidate, flag) in entry.candidates.iter().zip(entry.available.iter()) {
                if candidate.node() == node && flag.swap(available, Ordering::AcqRel) != available {
                    changed += 1;
                }
            }
        }

        if changed > 0 && available {
            info!(
                node = %node,
                slots = changed,
                version = self.version,
                "node available again"
            );
        } else if changed > 0 {
            warn!(
                node = %node,
                slots = changed,
                version = self.version,
                "node marked unavailable"
            );
        }
        changed
    }
}
