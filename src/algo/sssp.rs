/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Delta-stepping single-source shortest paths.
//!
//! Tentative distances are quantized by a shift: bucket *i* of the priority
//! queue holds items whose distance lies in `[i << shift, (i + 1) << shift)`.
//! A larger shift means wider buckets, hence more parallelism and more
//! wasted relaxations; the classic trade-off of delta-stepping.
//!
//! Distances are shared as a slice of [`AtomicU32`]; the only write is an
//! [atomic min](AtomicU32::fetch_min), so state is monotone and stale
//! frontier items are filtered out by comparing their distance against the
//! current one.

use anyhow::{Result, ensure};
use dsi_progress_logger::no_logging;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::exec::{EdgeMapOps, PriorityEdgeMap, StepIndexer};
use crate::graphs::{Csr, PartitionedGraph};
use crate::utils::prefetch_read;
use crate::worklists::FrontierItem;

/// The distance of unreached nodes.
pub const UNREACHABLE: u32 = u32::MAX;

/// The shortest-path capability set over a shared distance array.
pub struct SsspOps<'a> {
    dist: &'a [AtomicU32],
}

impl<'a> SsspOps<'a> {
    /// Creates the capability set over a distance array.
    pub fn new(dist: &'a [AtomicU32]) -> Self {
        Self { dist }
    }
}

impl EdgeMapOps for SsspOps<'_> {
    #[inline(always)]
    fn filter(&self, node: u32, dist: u32) -> bool {
        // A better distance has already been scattered.
        self.dist[node as usize].load(Ordering::Acquire) < dist
    }

    #[inline(always)]
    fn apply_weight(&self, weight: u32, val: u32) -> u32 {
        val.saturating_add(weight)
    }

    #[inline(always)]
    fn gather(&self, val: u32, node: u32) -> bool {
        self.dist[node as usize].fetch_min(val, Ordering::AcqRel) > val
    }

    #[inline(always)]
    fn prefetch_state(&self, node: u32) {
        prefetch_read(&self.dist[node as usize] as *const AtomicU32);
    }
}

/// Options for [`single_source`].
#[derive(Debug, Clone)]
pub struct SsspOptions {
    /// Number of worker threads.
    pub threads: usize,
    /// Priority quantum, as a shift amount.
    pub step_shift: u32,
    /// Number of partitions; by default, four per thread.
    pub num_partitions: Option<usize>,
    /// Prefetch lane size.
    pub lane_size: usize,
}

impl Default for SsspOptions {
    fn default() -> Self {
        Self {
            threads: rayon::current_num_threads(),
            step_shift: 13,
            num_partitions: None,
            lane_size: crate::exec::DEFAULT_LANE_SIZE,
        }
    }
}

/// Computes single-source shortest paths on a graph with non-negative
/// weights.
///
/// Returns the distance of every node from `source`; unreached nodes get
/// [`UNREACHABLE`]. Running twice on the same input produces identical
/// output, with any number of threads.
///
/// # Examples
///
/// ```
/// use priograph::algo::sssp::{self, SsspOptions};
/// use priograph::graphs::Csr;
///
/// let graph = Csr::from_arcs(3, [(0, 1, 3), (1, 2, 4), (0, 2, 10)]);
/// let dist = sssp::single_source(&graph, 0, &SsspOptions::default())?;
/// assert_eq!(&*dist, &[0, 3, 7]);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn single_source(graph: &Csr, source: u32, options: &SsspOptions) -> Result<Box<[u32]>> {
    ensure!(
        (source as usize) < graph.num_nodes(),
        "source {source} out of range"
    );
    let num_partitions = options
        .num_partitions
        .unwrap_or(4 * options.threads)
        .clamp(1, graph.num_nodes().max(1));

    let partitioned = PartitionedGraph::build(graph, num_partitions, no_logging![])?;

    let dist = (0..graph.num_nodes())
        .map(|_| AtomicU32::new(UNREACHABLE))
        .collect::<Vec<_>>();
    dist[source as usize].store(0, Ordering::Relaxed);

    let mut edge_map = PriorityEdgeMap::new(&partitioned);
    edge_map
        .threads(options.threads)
        .lane_size(options.lane_size);
    edge_map.run(
        [FrontierItem {
            node: source,
            dist: 0,
        }],
        &SsspOps::new(&dist),
        &StepIndexer {
            shift: options.step_shift,
        },
    )?;

    Ok(dist.into_iter().map(AtomicU32::into_inner).collect())
}
