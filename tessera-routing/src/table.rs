//! Routing table - the current load balancer behind an atomic pointer.
//!
//! Readers load an `Arc` to the current balancer without locking and keep
//! routing against it for as long as they hold it. Topology changes build a
//! complete new balancer first and then swap it in, so a reader never sees a
//! partially rebuilt snapshot.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tessera_core::NodeId;
use tracing::info;

use crate::balancer::{LoadBalancerFactory, PartitionedLoadBalancer};
use crate::partition_map::Endpoint;

/// Holds the load balancer for the latest endpoint snapshot.
#[derive(Debug)]
pub struct RoutingTable<Id: ?Sized> {
    factory: LoadBalancerFactory<Id>,
    current: ArcSwap<PartitionedLoadBalancer<Id>>,
    /// Serializes snapshot swaps and availability changes.
    update_lock: Mutex<()>,
}

impl<Id: ?Sized> RoutingTable<Id> {
    /// Creates a routing table over an initial endpoint snapshot.
    pub fn new<I>(factory: LoadBalancerFactory<Id>, endpoints: I) -> Self
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let initial = factory.new_load_balancer(endpoints);
        Self {
            factory,
            current: ArcSwap::from_pointee(initial),
            update_lock: Mutex::new(()),
        }
    }

    /// Returns the current load balancer.
    #[must_use]
    pub fn load(&self) -> Arc<PartitionedLoadBalancer<Id>> {
        self.current.load_full()
    }

    /// Returns the version of the current snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    /// Returns the factory used to build snapshots.
    #[must_use]
    pub const fn factory(&self) -> &LoadBalancerFactory<Id> {
        &self.factory
    }

    /// Replaces the current snapshot with one built from `endpoints`.
    ///
    /// Slots marked unavailable in the outgoing snapshot stay unavailable in
    /// the new one when the same node still serves the same partition.
    ///
    /// Returns the new snapshot version.
    pub fn update<I>(&self, endpoints: I) -> u64
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let _guard = self.update_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = self.current.load_full();
        let old_version = previous.version();
        let version = old_version + 1;
        let balancer = self
            .factory
            .new_load_balancer_with_version(endpoints, version);
        let served = balancer.map().served_count();
        let carried_unavailable = balancer.map().carry_unavailable_from(previous.map());

        self.current.store(Arc::new(balancer));

        info!(
            old_version,
            version,
            served,
            carried_unavailable,
            num_partitions = self.factory.config().num_partitions,
            "routing table updated"
        );
        version
    }

    /// Sets a node's availability in the current snapshot.
    ///
    /// Serialized with [`RoutingTable::update`] so a change is never applied
    /// to a snapshot that is being replaced.
    ///
    /// Returns the number of candidate slots that changed state.
    pub fn set_node_available(&self, node: NodeId, available: bool) -> usize {
        let _guard = self.update_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.current.load().map().set_node_available(node, available)
    }
}
