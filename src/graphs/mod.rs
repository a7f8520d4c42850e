/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Graph representations.
//!
//! The engine consumes a [compressed-sparse-row graph](Csr) built by an
//! external loader and transforms it, via a [two-pass parallel
//! build](PartitionedGraph::build), into the [partition-grouped
//! representation](PartitionedGraph) that the scatter phase iterates over.

mod csr;
pub use csr::*;

mod partitioned;
pub use partitioned::*;

mod partitioner;

/// A weighted arc: a destination node and a weight.
///
/// Unweighted graphs use a unit weight throughout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeightedArc {
    /// The destination node.
    pub dst: u32,
    /// The arc weight.
    pub weight: u32,
}
