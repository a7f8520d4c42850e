/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]

#[macro_use]
pub mod utils;

pub mod algo;
pub mod exec;
pub mod graphs;
pub mod worklists;

use crate::graphs::MAX_PARTITIONS;
use thiserror::Error;

/// An invalid configuration, rejected before any work starts.
///
/// This is the only typed failure the engine reports: past the entry-point
/// checks, exhaustion is treated as fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("the graph has no nodes")]
    EmptyGraph,
    #[error("the number of partitions must be positive")]
    ZeroPartitions,
    #[error("{0} partitions exceed the {max} the group header can address", max = MAX_PARTITIONS)]
    TooManyPartitions(usize),
    #[error("node {node} needs {pairs} group pairs, more than the record can index")]
    TooManyGroupPairs { node: usize, pairs: usize },
    #[error("the overflow arrays exceed 32-bit addressing")]
    OverflowAddressing,
    #[error("the number of threads must be positive")]
    ZeroThreads,
    #[error("the lane size must be positive")]
    ZeroLaneSize,
    #[error("chunk capacities must be positive")]
    ZeroChunkCapacity,
}

pub mod prelude {
    pub use crate::ConfigError;
    pub use crate::exec::{EdgeMapOps, EngineStats, Indexer, PriorityEdgeMap, StepIndexer};
    pub use crate::graphs::{Csr, PartitionedGraph, WeightedArc};
    pub use crate::thread_pool;
    pub use crate::worklists::{FrontierItem, Update};
}
