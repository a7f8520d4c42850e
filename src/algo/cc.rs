/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Connected components by label propagation.
//!
//! Every node starts with its own id as label; rounds of parallel scans push
//! the label of each improved node to its successors with an atomic min,
//! until a round changes nothing. The `old` label lets a round skip nodes
//! whose label did not improve since their last push.
//!
//! On a symmetric graph the final label of a node is the smallest node id of
//! its component. The algorithm is synchronous, so it bypasses the priority
//! engine entirely.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::graphs::Csr;

/// Computes the connected components of a graph.
///
/// Returns a label per node; two nodes get the same label if and only if
/// they are in the same component (assuming a symmetric graph, or more
/// generally one where label minima can flow around every cycle of the
/// component).
///
/// # Examples
///
/// ```
/// use priograph::algo::cc;
/// use priograph::graphs::Csr;
///
/// // Two disjoint triangles.
/// let graph = Csr::from_unweighted_arcs(6, [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
/// assert_eq!(&*cc::connected_components(&graph), &[0, 0, 0, 3, 3, 3]);
/// ```
pub fn connected_components(graph: &Csr) -> Box<[u32]> {
    let num_nodes = graph.num_nodes();
    let current = (0..num_nodes)
        .map(|node| AtomicU32::new(node as u32))
        .collect::<Vec<_>>();
    let old = (0..num_nodes)
        .map(|_| AtomicU32::new(u32::MAX))
        .collect::<Vec<_>>();

    let mut rounds = 0;
    loop {
        rounds += 1;
        let changed = AtomicBool::new(false);
        (0..num_nodes).into_par_iter().for_each(|node| {
            let label = current[node].load(Ordering::Acquire);
            if old[node].load(Ordering::Relaxed) > label {
                old[node].store(label, Ordering::Relaxed);
                changed.store(true, Ordering::Relaxed);
                for &succ in graph.successors(node as u32) {
                    current[succ as usize].fetch_min(label, Ordering::AcqRel);
                }
            }
        });
        if !changed.load(Ordering::Relaxed) {
            break;
        }
    }
    log::debug!("Label propagation converged after {rounds} rounds");

    current.into_iter().map(AtomicU32::into_inner).collect()
}
