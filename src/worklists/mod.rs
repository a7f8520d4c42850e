/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Work-item containers and the priority work queue.
//!
//! The engine moves two kinds of items: [frontier items](FrontierItem) on
//! the scatter side and per-partition [updates](Update) on the gather side.
//! Both travel in fixed-capacity [chunks](Chunk) through [lock-free chunked
//! queues](ChunkQueue), orchestrated by the [ordered-by-integer-metric
//! queue](Obim).

mod chunk;
pub use chunk::*;

mod queue;
pub use queue::*;

mod obim;
pub use obim::*;

/// A unit of scatter work: a node and the value it was pushed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierItem {
    /// The node to scatter.
    pub node: u32,
    /// The tentative value (e.g., distance) at push time.
    pub dist: u32,
}

/// A unit of gather work: a destination node and a candidate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Update {
    /// The destination node.
    pub node: u32,
    /// The candidate value for the destination.
    pub val: u32,
}
