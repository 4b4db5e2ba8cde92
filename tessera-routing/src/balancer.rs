//! Partitioned load balancer - routes identifiers and partition sets to nodes.
//!
//! A [`LoadBalancerFactory`] holds the configuration and hash function. Each
//! call to [`LoadBalancerFactory::new_load_balancer`] binds them to one
//! endpoint snapshot and returns a [`PartitionedLoadBalancer`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tessera_core::{Capabilities, NodeId, PartitionId};
use tracing::trace;

use crate::config::LoadBalancerConfig;
use crate::error::{ConfigError, RoutingResult};
use crate::hasher::PartitionHasher;
use crate::partition_map::{Endpoint, PartitionMap};
use crate::policy::MissingPartitionPolicy;

/// Nodes chosen by coverage selection, each with the partitions it serves.
pub type NodeAssignment = HashMap<NodeId, BTreeSet<PartitionId>>;

/// Snapshot version assigned by [`LoadBalancerFactory::new_load_balancer`].
pub const INITIAL_VERSION: u64 = 1;

/// Builds load balancers bound to endpoint snapshots.
#[derive(Debug)]
pub struct LoadBalancerFactory<Id: ?Sized> {
    config: LoadBalancerConfig,
    hasher: PartitionHasher<Id>,
}

impl<Id: ?Sized> LoadBalancerFactory<Id> {
    /// Creates a factory with the given configuration and hash function.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new<F>(config: LoadBalancerConfig, hash: F) -> Result<Self, ConfigError>
    where
        F: Fn(&Id) -> i64 + Send + Sync + 'static,
    {
        config.validate()?;
        let hasher = PartitionHasher::new(config.num_partitions, hash)?;
        Ok(Self { config, hasher })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &LoadBalancerConfig {
        &self.config
    }

    /// Returns the hasher shared by every balancer this factory builds.
    #[must_use]
    pub const fn hasher(&self) -> &PartitionHasher<Id> {
        &self.hasher
    }

    /// Builds a load balancer over an endpoint snapshot.
    #[must_use]
    pub fn new_load_balancer<I>(&self, endpoints: I) -> PartitionedLoadBalancer<Id>
    where
        I: IntoIterator<Item = Endpoint>,
    {
        self.new_load_balancer_with_version(endpoints, INITIAL_VERSION)
    }

    /// Builds a load balancer over an endpoint snapshot with an explicit
    /// snapshot version.
    #[must_use]
    pub fn new_load_balancer_with_version<I>(
        &self,
        endpoints: I,
        version: u64,
    ) -> PartitionedLoadBalancer<Id>
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let map = PartitionMap::build(endpoints, self.config.num_partitions, version);
        PartitionedLoadBalancer {
            map: Arc::new(map),
            hasher: self.hasher.clone(),
            policy: self.config.policy(),
        }
    }
}

impl<Id: AsRef<[u8]> + ?Sized + 'static> LoadBalancerFactory<Id> {
    /// Creates a factory that hashes identifier bytes with xxHash3.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn xxh3(config: LoadBalancerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let hasher = PartitionHasher::xxh3(config.num_partitions)?;
        Ok(Self { config, hasher })
    }
}

/// Load balancer bound to one immutable partition map.
///
/// Cheap to share: the map sits behind an `Arc` and all selection state is
/// atomic.
#[derive(Debug)]
pub struct PartitionedLoadBalancer<Id: ?Sized> {
    map: Arc<PartitionMap>,
    hasher: PartitionHasher<Id>,
    policy: MissingPartitionPolicy,
}

impl<Id: ?Sized> PartitionedLoadBalancer<Id> {
    /// Returns the partition map.
    #[must_use]
    pub const fn map(&self) -> &Arc<PartitionMap> {
        &self.map
    }

    /// Returns the degraded-service policy used by coverage selection.
    #[must_use]
    pub const fn policy(&self) -> MissingPartitionPolicy {
        self.policy
    }

    /// Returns the snapshot version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.map.version()
    }

    /// Returns the number of partitions in the keyspace.
    #[must_use]
    pub fn num_partitions(&self) -> u32 {
        self.map.num_partitions()
    }

    /// Returns the partition owning `id`.
    #[must_use]
    pub fn partition_for_id(&self, id: &Id) -> PartitionId {
        self.hasher.partition_for_id(id)
    }

    /// Selects the next eligible node for a partition.
    #[must_use]
    pub fn node_for_partition(
        &self,
        partition: PartitionId,
        capability: Option<Capabilities>,
    ) -> Option<NodeId> {
        self.map.node_for_partition(partition, capability)
    }

    /// Selects one node to serve a request for `id`.
    ///
    /// Returns `None` if the id's partition has no eligible node.
    #[must_use]
    pub fn node_for_id(&self, id: &Id, capability: Option<Capabilities>) -> Option<NodeId> {
        self.node_for_partition(self.partition_for_id(id), capability)
    }

    /// Returns every distinct eligible node serving the id's partition.
    ///
    /// A missing partition yields an empty set; the degraded-service policy
    /// does not apply here.
    #[must_use]
    pub fn nodes_for_partitioned_id(
        &self,
        id: &Id,
        capability: Option<Capabilities>,
    ) -> HashSet<NodeId> {
        self.map
            .eligible_nodes(self.partition_for_id(id), capability)
    }

    /// Selects one node per partition across the whole keyspace.
    ///
    /// # Errors
    /// Returns `RoutingError::PartitionUnavailable` under the strict policy
    /// if any partition has no eligible node.
    pub fn nodes_for_one_replica(
        &self,
        capability: Option<Capabilities>,
    ) -> RoutingResult<NodeAssignment> {
        self.nodes_for_partitions((0..self.num_partitions()).map(PartitionId::new), capability)
    }

    /// Selects one node per requested partition, grouped by node.
    ///
    /// Each partition is assigned to exactly one node. Partitions without an
    /// eligible node are handed to the degraded-service policy and left out
    /// of the result. Duplicate partitions in the input are covered once.
    ///
    /// # Errors
    /// Returns `RoutingError::PartitionUnavailable` under the strict policy
    /// for the first partition without an eligible node.
    pub fn nodes_for_partitions<I>(
        &self,
        partitions: I,
        capability: Option<Capabilities>,
    ) -> RoutingResult<NodeAssignment>
    where
        I: IntoIterator<Item = PartitionId>,
    {
        let requested: BTreeSet<PartitionId> = partitions.into_iter().collect();
        let mut assignment = NodeAssignment::new();

        for partition in requested {
            match self.map.node_for_partition(partition, capability) {
                Some(node) => {
                    assignment.entry(node).or_default().insert(partition);
                }
                None => self.policy.on_missing(partition)?,
            }
        }

        trace!(
            version = self.map.version(),
            nodes = assignment.len(),
            "computed partition coverage"
        );
        Ok(assignment)
    }
}
