/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The two-pass parallel build of a [`PartitionedGraph`].
//!
//! The first pass sizes the overflow and high-edge arrays by scanning the
//! arcs of every node in parallel; a prefix sum turns the per-node counts
//! into global offsets; the second pass re-scans the arcs and writes each
//! node's group pairs and high arcs into its reserved slices. Both passes
//! derive the group sequence of a node with the same procedure, so the
//! build is deterministic: the same input yields byte-identical arrays
//! regardless of the number of threads.

use anyhow::{Result, ensure};
use dsi_progress_logger::ProgressLog;
use rayon::prelude::*;
use sync_cell_slice::SyncSlice;

use super::partitioned::*;
use super::{Csr, PartitionedGraph, WeightedArc};
use crate::ConfigError;

/// Collects the arcs of a node tagged with their destination partition, in
/// non-decreasing partition order.
///
/// The sort is stable, so arcs targeting the same partition keep their CSR
/// order.
fn tagged_arcs(graph: &Csr, node: u32, part_size: usize) -> Vec<(u32, WeightedArc)> {
    let mut arcs = graph
        .arcs(node)
        .map(|arc| ((arc.dst as usize / part_size) as u32, arc))
        .collect::<Vec<_>>();
    arcs.sort_by_key(|&(part, _)| part);
    arcs
}

/// Calls `f(partition, arcs, inline)` for every group pair of a node, in
/// emission order.
///
/// Runs of at most [`MAX_INLINE_ARCS`] arcs of a packed graph are emitted as
/// single-arc inline pairs; all other runs are emitted as high-edge pairs,
/// split at [`MAX_GROUP_ARCS`] arcs. When the graph is packed, the split is
/// adjusted so that no high-edge pair is left with a count small enough to
/// be mistaken for an inline pair.
fn each_group(
    arcs: &[(u32, WeightedArc)],
    packed: bool,
    mut f: impl FnMut(u32, &[(u32, WeightedArc)], bool),
) {
    let mut i = 0;
    while i < arcs.len() {
        let part = arcs[i].0;
        let mut j = i + 1;
        while j < arcs.len() && arcs[j].0 == part {
            j += 1;
        }
        let run = &arcs[i..j];
        if packed && run.len() <= MAX_INLINE_ARCS as usize {
            for arc in run {
                f(part, std::slice::from_ref(arc), true);
            }
        } else {
            let mut rem = run;
            while !rem.is_empty() {
                let take = if rem.len() <= MAX_GROUP_ARCS as usize {
                    rem.len()
                } else if packed && rem.len() - MAX_GROUP_ARCS as usize <= MAX_INLINE_ARCS as usize
                {
                    MAX_GROUP_ARCS as usize - MAX_INLINE_ARCS as usize
                } else {
                    MAX_GROUP_ARCS as usize
                };
                f(part, &rem[..take], false);
                rem = &rem[take..];
            }
        }
        i = j;
    }
}

pub(crate) fn partition(
    graph: &Csr,
    num_partitions: usize,
    pl: &mut impl ProgressLog,
) -> Result<PartitionedGraph> {
    let num_nodes = graph.num_nodes();
    ensure!(num_nodes > 0, ConfigError::EmptyGraph);
    ensure!(num_partitions > 0, ConfigError::ZeroPartitions);
    ensure!(
        num_partitions <= MAX_PARTITIONS,
        ConfigError::TooManyPartitions(num_partitions)
    );

    let part_size = num_nodes.div_ceil(num_partitions);
    let packed = num_nodes <= MAX_INLINE_DST as usize + 1
        && graph.max_weight().unwrap_or(1) <= INLINE_WEIGHT_MASK;

    pl.item_name("node");
    pl.expected_updates(Some(num_nodes));
    pl.start("Sizing partition groups...");

    // Pass 1: per-node pair and high-arc counts.
    let counts = (0..num_nodes)
        .into_par_iter()
        .map(|node| {
            let arcs = tagged_arcs(graph, node as u32, part_size);
            let mut pairs = 0usize;
            let mut high = 0usize;
            each_group(&arcs, packed, |_, run, inline| {
                pairs += 1;
                if !inline {
                    high += run.len();
                }
            });
            (pairs, high)
        })
        .collect::<Vec<_>>();

    pl.done();

    // Prefix-sum the counts into global offsets.
    let mut overflow_offset = Vec::with_capacity(num_nodes);
    let mut high_offset = Vec::with_capacity(num_nodes);
    let mut total_spill = 0usize;
    let mut total_high = 0usize;
    for (node, &(pairs, high)) in counts.iter().enumerate() {
        ensure!(
            pairs <= INLINE_GROUPS + u16::MAX as usize,
            ConfigError::TooManyGroupPairs { node, pairs }
        );
        overflow_offset.push(total_spill);
        high_offset.push(total_high);
        total_spill += pairs.saturating_sub(INLINE_GROUPS);
        total_high += high;
    }
    ensure!(
        total_high <= u32::MAX as usize && total_spill <= u32::MAX as usize,
        ConfigError::OverflowAddressing
    );

    pl.info(format_args!(
        "{total_spill} overflow pairs, {total_high} high arcs, inline packing: {packed}"
    ));

    let mut vtx = vec![VertexRecord::default(); num_nodes];
    let mut overflow = vec![GroupPair::default(); total_spill];
    let mut highedge = vec![WeightedArc::default(); total_high];
    let vtx_sync = vtx.as_sync_slice();
    let overflow_sync = overflow.as_sync_slice();
    let highedge_sync = highedge.as_sync_slice();

    pl.start("Filling partition groups...");

    // Pass 2: write each node's record and its reserved slices.
    (0..num_nodes).into_par_iter().for_each(|node| {
        let arcs = tagged_arcs(graph, node as u32, part_size);
        let mut rec = VertexRecord {
            offset: overflow_offset[node] as u32,
            ..VertexRecord::default()
        };
        let mut pair_idx = 0usize;
        let mut spill_cursor = overflow_offset[node];
        let mut high_cursor = high_offset[node];
        each_group(&arcs, packed, |part, run, inline| {
            let pair = if inline {
                GroupPair::new(part, 1, pack_arc(run[0].1))
            } else {
                for (k, &(_, arc)) in run.iter().enumerate() {
                    // SAFETY: each node writes only its reserved slice.
                    unsafe { highedge_sync[high_cursor + k].set(arc) };
                }
                let pair = GroupPair::new(part, run.len() as u32, high_cursor as u32);
                high_cursor += run.len();
                pair
            };
            if pair_idx < INLINE_GROUPS {
                rec.pe[pair_idx] = pair;
            } else {
                // SAFETY: each node writes only its reserved slice.
                unsafe { overflow_sync[spill_cursor].set(pair) };
                spill_cursor += 1;
            }
            pair_idx += 1;
        });
        rec.deg1 = pair_idx.min(INLINE_GROUPS) as u16;
        rec.deg2 = (pair_idx - rec.deg1 as usize) as u16;
        // SAFETY: one writer per record.
        unsafe { vtx_sync[node].set(rec) };
    });

    pl.done();

    Ok(PartitionedGraph {
        vtx: vtx.into_boxed_slice(),
        overflow: overflow.into_boxed_slice(),
        highedge: highedge.into_boxed_slice(),
        num_arcs: graph.num_arcs(),
        num_partitions,
        part_size,
        packed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsi_progress_logger::no_logging;

    #[test]
    fn test_records_are_cache_aligned() -> Result<()> {
        let csr = Csr::from_arcs(5, [(0, 1, 1), (1, 2, 2), (4, 0, 3)]);
        let graph = partition(&csr, 2, no_logging![])?;
        assert_eq!(graph.vtx.as_ptr() as usize % 64, 0);
        Ok(())
    }

    #[test]
    fn test_invalid_configurations_rejected() {
        fn config_error(result: Result<PartitionedGraph>) -> ConfigError {
            result
                .unwrap_err()
                .downcast::<ConfigError>()
                .expect("expected a typed configuration error")
        }
        let csr = Csr::from_arcs(2, [(0, 1, 1)]);
        assert!(matches!(
            config_error(partition(&csr, 0, no_logging![])),
            ConfigError::ZeroPartitions
        ));
        assert!(matches!(
            config_error(partition(&csr, MAX_PARTITIONS + 1, no_logging![])),
            ConfigError::TooManyPartitions(_)
        ));
        assert!(matches!(
            config_error(partition(&Csr::default(), 1, no_logging![])),
            ConfigError::EmptyGraph
        ));
    }

    #[test]
    fn test_unpackable_weights_spill() -> Result<()> {
        let csr = Csr::from_arcs(3, [(0, 1, 1 << 20), (1, 2, 1)]);
        let graph = partition(&csr, 1, no_logging![])?;
        assert!(!graph.is_packed());
        assert_eq!(graph.num_high_arcs(), 2);
        Ok(())
    }
}
