/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dsi_progress_logger::no_logging;
use priograph::graphs::{Csr, PartitionedGraph};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn random_csr(rng: &mut SmallRng, num_nodes: usize, num_arcs: usize, max_weight: u32) -> Csr {
    Csr::from_arcs(
        num_nodes,
        (0..num_arcs).map(|_| {
            (
                rng.random_range(0..num_nodes) as u32,
                rng.random_range(0..num_nodes) as u32,
                rng.random_range(1..=max_weight),
            )
        }),
    )
}

/// The multiset of arcs of a graph, in canonical order.
fn sorted_arcs(arcs: impl Iterator<Item = (u32, u32, u32)>) -> Vec<(u32, u32, u32)> {
    let mut arcs = arcs.collect::<Vec<_>>();
    arcs.sort();
    arcs
}

fn partitioned_arcs(graph: &PartitionedGraph) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
    (0..graph.num_nodes() as u32)
        .flat_map(|src| graph.arcs(src).map(move |arc| (src, arc.dst, arc.weight)))
}

fn csr_arcs(graph: &Csr) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
    (0..graph.num_nodes() as u32)
        .flat_map(|src| graph.arcs(src).map(move |arc| (src, arc.dst, arc.weight)))
}

#[test]
fn test_round_trip_random() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0);
    for &(num_nodes, num_arcs) in &[(1, 0), (7, 20), (50, 400), (300, 2000)] {
        for &num_partitions in &[1, 2, 3, 8, 64] {
            let csr = random_csr(&mut rng, num_nodes, num_arcs, 100);
            let graph = PartitionedGraph::build(&csr, num_partitions, no_logging![])?;
            assert_eq!(graph.num_arcs(), csr.num_arcs());
            assert_eq!(
                sorted_arcs(partitioned_arcs(&graph)),
                sorted_arcs(csr_arcs(&csr)),
                "arc multiset mismatch for {num_nodes} nodes, {num_partitions} partitions"
            );
        }
    }
    Ok(())
}

#[test]
fn test_group_invariants() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(1);
    let csr = random_csr(&mut rng, 100, 1000, 50);
    for num_partitions in [1, 4, 13, 100] {
        let graph = PartitionedGraph::build(&csr, num_partitions, no_logging![])?;
        let mut total_arcs = 0;
        for node in 0..graph.num_nodes() as u32 {
            let mut last_partition = 0;
            for group in graph.groups(node) {
                assert!(
                    group.partition() >= last_partition,
                    "groups of node {node} are not sorted by partition"
                );
                last_partition = group.partition();
                for arc in group.iter() {
                    assert_eq!(graph.partition_of(arc.dst), group.partition());
                    total_arcs += 1;
                }
            }
        }
        assert_eq!(total_arcs, csr.num_arcs());
    }
    Ok(())
}

#[test]
fn test_rebuild_is_byte_identical() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(2);
    let csr = random_csr(&mut rng, 80, 600, 30);
    let first = PartitionedGraph::build(&csr, 8, no_logging![])?;
    // Rebuild the CSR from the partitioned form, then partition it again.
    let rebuilt = Csr::from_arcs(csr.num_nodes(), partitioned_arcs(&first).collect::<Vec<_>>());
    let second = PartitionedGraph::build(&rebuilt, 8, no_logging![])?;
    assert!(first == second);
    Ok(())
}

#[test]
fn test_more_than_seven_partition_groups_overflow() -> Result<()> {
    // A hub with one arc into each of 20 singleton partitions.
    let csr = Csr::from_arcs(20, (1..20).map(|dst| (0, dst, 1)));
    let graph = PartitionedGraph::build(&csr, 20, no_logging![])?;
    assert!(graph.num_overflow_pairs() > 0);
    assert_eq!(graph.arcs(0).count(), 19);
    assert_eq!(
        sorted_arcs(partitioned_arcs(&graph)),
        sorted_arcs(csr_arcs(&csr))
    );
    Ok(())
}

#[test]
fn test_two_arcs_to_one_partition_stay_inline() -> Result<()> {
    // Node 0 has exactly two arcs into partition 1.
    let csr = Csr::from_arcs(4, [(0, 2, 5), (0, 3, 6)]);
    let graph = PartitionedGraph::build(&csr, 2, no_logging![])?;
    assert!(graph.is_packed());
    assert_eq!(graph.num_high_arcs(), 0);
    let groups = graph.groups(0).collect::<Vec<_>>();
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.partition() == 1 && g.len() == 1));
    Ok(())
}

#[test]
fn test_three_arcs_to_one_partition_spill() -> Result<()> {
    let csr = Csr::from_arcs(4, [(0, 1, 1), (0, 2, 2), (0, 3, 3)]);
    let graph = PartitionedGraph::build(&csr, 1, no_logging![])?;
    assert!(graph.is_packed());
    assert_eq!(graph.num_high_arcs(), 3);
    assert_eq!(graph.groups(0).count(), 1);
    assert_eq!(graph.groups(0).next().unwrap().len(), 3);
    Ok(())
}

#[test]
fn test_nodes_without_arcs() -> Result<()> {
    let csr = Csr::from_arcs(3, [(1, 2, 5)]);
    let graph = PartitionedGraph::build(&csr, 2, no_logging![])?;
    assert_eq!(graph.arcs(0).count(), 0);
    assert_eq!(graph.arcs(1).count(), 1);
    assert_eq!(graph.arcs(2).count(), 0);
    Ok(())
}

#[test]
fn test_single_node_no_arcs() -> Result<()> {
    let csr = Csr::from_arcs(1, std::iter::empty());
    let graph = PartitionedGraph::build(&csr, 1, no_logging![])?;
    assert_eq!(graph.num_nodes(), 1);
    assert_eq!(graph.num_arcs(), 0);
    assert_eq!(graph.arcs(0).count(), 0);
    Ok(())
}

#[test]
fn test_partition_of_ranges() -> Result<()> {
    let csr = Csr::from_arcs(10, std::iter::empty());
    let graph = PartitionedGraph::build(&csr, 4, no_logging![])?;
    // part_size = ceil(10 / 4) = 3.
    assert_eq!(graph.part_size(), 3);
    assert_eq!(graph.partition_of(0), 0);
    assert_eq!(graph.partition_of(2), 0);
    assert_eq!(graph.partition_of(3), 1);
    assert_eq!(graph.partition_of(9), 3);
    Ok(())
}

#[test]
fn test_unpackable_graph_round_trips() -> Result<()> {
    // Weights beyond 18 bits force every group through the high-edge array.
    let mut rng = SmallRng::seed_from_u64(3);
    let csr = random_csr(&mut rng, 30, 200, 1 << 20);
    let graph = PartitionedGraph::build(&csr, 4, no_logging![])?;
    assert!(!graph.is_packed());
    assert_eq!(graph.num_high_arcs(), csr.num_arcs());
    assert_eq!(
        sorted_arcs(partitioned_arcs(&graph)),
        sorted_arcs(csr_arcs(&csr))
    );
    Ok(())
}
