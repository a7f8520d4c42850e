/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dsi_progress_logger::no_logging;
use priograph::ConfigError;
use priograph::exec::{EdgeMapOps, PriorityEdgeMap, StepIndexer};
use priograph::graphs::{Csr, PartitionedGraph};
use priograph::worklists::FrontierItem;
use std::sync::atomic::{AtomicU32, Ordering};

/// Hop-count reachability: a minimal capability set ignoring weights.
struct HopOps<'a> {
    hops: &'a [AtomicU32],
}

impl EdgeMapOps for HopOps<'_> {
    fn filter(&self, node: u32, dist: u32) -> bool {
        self.hops[node as usize].load(Ordering::Acquire) < dist
    }

    fn apply_weight(&self, _weight: u32, val: u32) -> u32 {
        val + 1
    }

    fn gather(&self, val: u32, node: u32) -> bool {
        self.hops[node as usize].fetch_min(val, Ordering::AcqRel) > val
    }
}

fn build(num_nodes: usize, arcs: &[(u32, u32, u32)]) -> Result<PartitionedGraph> {
    let csr = Csr::from_arcs(num_nodes, arcs.iter().copied());
    PartitionedGraph::build(&csr, 4, no_logging![])
}

#[test]
fn test_invalid_options_rejected() -> Result<()> {
    let graph = build(2, &[(0, 1, 1)])?;
    let hops = [AtomicU32::new(0), AtomicU32::new(u32::MAX)];
    let ops = HopOps { hops: &hops };
    let indexer = StepIndexer { shift: 0 };

    let mut edge_map = PriorityEdgeMap::new(&graph);
    edge_map.threads(0);
    let err = edge_map.run(std::iter::empty(), &ops, &indexer).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::ZeroThreads)
    ));

    let mut edge_map = PriorityEdgeMap::new(&graph);
    edge_map.threads(1).lane_size(0);
    let err = edge_map.run(std::iter::empty(), &ops, &indexer).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::ZeroLaneSize)
    ));

    let mut edge_map = PriorityEdgeMap::new(&graph);
    edge_map.threads(1).scatter_chunk(0);
    let err = edge_map.run(std::iter::empty(), &ops, &indexer).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::ZeroChunkCapacity)
    ));
    Ok(())
}

#[test]
fn test_empty_frontier_quiesces_immediately() -> Result<()> {
    let graph = build(3, &[(0, 1, 1), (1, 2, 1)])?;
    let hops = (0..3).map(|_| AtomicU32::new(u32::MAX)).collect::<Vec<_>>();
    let mut edge_map = PriorityEdgeMap::new(&graph);
    edge_map.threads(2);
    let stats = edge_map.run(
        std::iter::empty(),
        &HopOps { hops: &hops },
        &StepIndexer { shift: 0 },
    )?;
    assert_eq!(stats.rounds, 1);
    assert_eq!(stats.scattered, 0);
    assert_eq!(stats.gathered, 0);
    assert!(hops.iter().all(|h| h.load(Ordering::Relaxed) == u32::MAX));
    Ok(())
}

#[test]
fn test_hop_counts_with_tiny_lanes_and_chunks() -> Result<()> {
    // Degenerate lane and chunk sizes stress the suspend/resume and
    // publish-on-full paths without changing the result.
    let arcs = (0u32..9).map(|n| (n, n + 1, 1)).collect::<Vec<_>>();
    let graph = build(10, &arcs)?;
    let hops = std::iter::once(AtomicU32::new(0))
        .chain((1..10).map(|_| AtomicU32::new(u32::MAX)))
        .collect::<Vec<_>>();
    let mut edge_map = PriorityEdgeMap::new(&graph);
    edge_map
        .threads(3)
        .lane_size(1)
        .scatter_chunk(2)
        .gather_chunk(2);
    let stats = edge_map.run(
        [FrontierItem { node: 0, dist: 0 }],
        &HopOps { hops: &hops },
        &StepIndexer { shift: 1 },
    )?;
    for (node, hop) in hops.iter().enumerate() {
        assert_eq!(hop.load(Ordering::Relaxed) as usize, node);
    }
    assert!(stats.scattered >= 10);
    assert!(stats.prefetches > 0);
    Ok(())
}
