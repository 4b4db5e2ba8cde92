//! Multi-threaded selection tests.
//!
//! Many threads route through one shared snapshot while availability flags
//! flip underneath them. Cursor increments must never hand the same rotation
//! slot to two callers, and candidate lists must never change.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tessera_core::{NodeId, PartitionId};
use tessera_routing::{LoadBalancerConfig, LoadBalancerFactory, PartitionedLoadBalancer};

use crate::properties::check_coverage;
use crate::scenarios::fully_replicated;

const THREADS: usize = 8;
const CALLS_PER_THREAD: usize = 3_000;

fn balancer(num_partitions: u32, num_nodes: u64) -> Arc<PartitionedLoadBalancer<u64>> {
    let config = LoadBalancerConfig::new(num_partitions).with_allow_missing_partitions(false);
    let factory = LoadBalancerFactory::new(config, |id: &u64| {
        i64::try_from(*id).unwrap_or(i64::MAX)
    })
    .unwrap();
    Arc::new(factory.new_load_balancer(fully_replicated(num_partitions, num_nodes)))
}

#[test]
fn test_concurrent_cursor_hands_out_every_slot_once() {
    let num_nodes = 4;
    let lb = balancer(1, num_nodes);

    let per_thread: Vec<HashMap<NodeId, usize>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let lb = Arc::clone(&lb);
                scope.spawn(move || {
                    let mut counts = HashMap::new();
                    for _ in 0..CALLS_PER_THREAD {
                        let node = lb.node_for_partition(PartitionId::new(0), None).unwrap();
                        *counts.entry(node).or_insert(0) += 1;
                    }
                    counts
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut totals: HashMap<NodeId, usize> = HashMap::new();
    for counts in per_thread {
        for (node, count) in counts {
            *totals.entry(node).or_insert(0) += count;
        }
    }

    // Every pre-increment value is unique, so with nothing skipped the
    // split is exact even under contention.
    let expected = THREADS * CALLS_PER_THREAD / 4;
    assert_eq!(totals.len(), 4);
    for (node, count) in totals {
        assert_eq!(count, expected, "{node} selected {count} times");
    }
    let entry = lb.map().entry(PartitionId::new(0)).unwrap();
    assert_eq!(entry.cursor(), THREADS * CALLS_PER_THREAD);
}

#[test]
fn test_concurrent_selection_never_returns_down_node() {
    let lb = balancer(8, 4);
    let down = NodeId::new(3);
    lb.map().set_node_available(down, false);

    let stop = AtomicBool::new(false);
    thread::scope(|scope| {
        // Flapping node 1 must not disturb node 3 staying down.
        scope.spawn(|| {
            let mut available = false;
            while !stop.load(Ordering::Relaxed) {
                lb.map().set_node_available(NodeId::new(1), available);
                available = !available;
                thread::yield_now();
            }
            lb.map().set_node_available(NodeId::new(1), true);
        });

        let readers: Vec<_> = (0..THREADS)
            .map(|t| {
                let lb = &lb;
                scope.spawn(move || {
                    for call in 0..CALLS_PER_THREAD {
                        let partition = PartitionId::new(((t + call) % 8) as u32);
                        let node = lb.node_for_partition(partition, None);
                        assert!(node.is_some(), "nodes 0 and 2 are always up");
                        assert_ne!(node, Some(down));
                    }
                })
            })
            .collect();
        let results: Vec<_> = readers.into_iter().map(|r| r.join()).collect();
        stop.store(true, Ordering::Relaxed);
        for result in results {
            result.unwrap();
        }
    });
}

#[test]
fn test_concurrent_coverage_is_complete() {
    let lb = balancer(64, 3);
    let requested = (0..64).map(PartitionId::new).collect();

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..100 {
                    let assignment = lb.nodes_for_one_replica(None).unwrap();
                    let violations = check_coverage(lb.map(), &requested, None, &assignment);
                    assert!(violations.is_empty(), "{violations:?}");
                }
            });
        }
    });
}

#[test]
fn test_candidate_lists_unchanged_under_load() {
    let lb = balancer(16, 5);
    let snapshot: Vec<Vec<NodeId>> = (0..16)
        .map(|p| {
            lb.map()
                .candidates(PartitionId::new(p))
                .unwrap()
                .iter()
                .map(|c| c.node())
                .collect()
        })
        .collect();

    thread::scope(|scope| {
        for t in 0..THREADS {
            let lb = &lb;
            scope.spawn(move || {
                for call in 0..CALLS_PER_THREAD {
                    let node = NodeId::new((call % 5) as u64);
                    lb.map().set_node_available(node, (call + t) % 3 != 0);
                    let _ = lb.node_for_partition(PartitionId::new((call % 16) as u32), None);
                }
            });
        }
    });

    for (p, expected) in snapshot.iter().enumerate() {
        let actual: Vec<NodeId> = lb
            .map()
            .candidates(PartitionId::new(p as u32))
            .unwrap()
            .iter()
            .map(|c| c.node())
            .collect();
        assert_eq!(&actual, expected);
    }
}
