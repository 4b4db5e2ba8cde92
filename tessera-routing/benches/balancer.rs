//! Load balancer benchmarks.
//!
//! Measures single-node selection and full coverage selection across
//! partition and replica counts.

#![allow(missing_docs)]

use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tessera_core::{NodeId, PartitionId};
use tessera_routing::{Endpoint, LoadBalancerConfig, LoadBalancerFactory, PartitionedLoadBalancer};

/// Builds a balancer where each partition is served by `replicas` nodes.
fn setup(num_partitions: u32, replicas: u32) -> PartitionedLoadBalancer<str> {
    let config = LoadBalancerConfig::new(num_partitions);
    let factory = LoadBalancerFactory::<str>::xxh3(config).expect("valid config");

    let endpoints = (0..replicas).map(|replica| {
        Endpoint::new(
            NodeId::new(u64::from(replica)),
            (0..num_partitions).map(PartitionId::new),
        )
    });
    factory.new_load_balancer(endpoints)
}

fn bench_node_for_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_for_id");
    group.throughput(Throughput::Elements(1));

    for &replicas in &[1_u32, 3, 8] {
        let lb = setup(1024, replicas);
        group.bench_with_input(BenchmarkId::new("replicas", replicas), &lb, |b, lb| {
            b.iter(|| lb.node_for_id(black_box("user-1234"), None));
        });
    }
    group.finish();
}

fn bench_nodes_for_one_replica(c: &mut Criterion) {
    let mut group = c.benchmark_group("nodes_for_one_replica");

    for &num_partitions in &[16_u32, 256, 4096] {
        let lb = setup(num_partitions, 3);
        group.throughput(Throughput::Elements(u64::from(num_partitions)));
        group.bench_with_input(
            BenchmarkId::new("partitions", num_partitions),
            &lb,
            |b, lb| {
                b.iter(|| lb.nodes_for_one_replica(None).expect("all partitions served"));
            },
        );
    }
    group.finish();
}

/// Selection under contention: several threads share one partition cursor.
fn bench_contended_cursor(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_cursor");
    let lb = Arc::new(setup(1, 3));
    let calls_per_thread = 1_000_u64;

    for &threads in &[1_u64, 4] {
        group.throughput(Throughput::Elements(threads * calls_per_thread));
        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, &threads| {
            b.iter(|| {
                thread::scope(|scope| {
                    for _ in 0..threads {
                        let lb = Arc::clone(&lb);
                        scope.spawn(move || {
                            for _ in 0..calls_per_thread {
                                black_box(lb.node_for_partition(PartitionId::new(0), None));
                            }
                        });
                    }
                });
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_node_for_id,
    bench_nodes_for_one_replica,
    bench_contended_cursor
);
criterion_main!(benches);
