/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The three-phase executor.
//!
//! [`PriorityEdgeMap`] drives an algorithm supplied as an [`EdgeMapOps`]
//! implementation over a [`PartitionedGraph`](crate::graphs::PartitionedGraph),
//! repeating a **Scatter → Sync → Gather** round on every worker until the
//! distributed [termination detector](Terminator) reports global
//! quiescence:
//!
//! * **Scatter**: pop a chunk of frontier items from the [`Obim`] priority
//!   side and expand it, through a [prefetch-pipelined task](ScatterTask),
//!   into per-partition updates accumulated in a worker-local [facing
//!   buffer](Facing);
//! * **Sync**: drain the facing buffer into the partition queues,
//!   advertising the queues that become non-empty;
//! * **Gather**: claim a partition (stealing if the local gather queue is
//!   dry) and apply its updates through a [gather task](GatherTask); the
//!   improved destinations are pushed back to the priority side.
//!
//! The per-vertex state is mutated only through the algorithm's monotone
//! [`gather`](EdgeMapOps::gather), so racing workers at worst repeat work
//! that the [`filter`](EdgeMapOps::filter) then suppresses.

mod coro;
pub use coro::*;

mod terminator;
pub use terminator::*;

use anyhow::{Result, ensure};
use dsi_progress_logger::{ProgressLog, no_logging};
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ConfigError;
use crate::graphs::PartitionedGraph;
use crate::thread_pool;
use crate::worklists::{Chunk, ChunkPool, FrontierItem, Obim, Update};

/// Default prefetch lane: 64 records of 64 bytes, roughly an L1D-fill
/// window. A tunable knob, not a correctness parameter.
pub const DEFAULT_LANE_SIZE: usize = 64;
/// Default capacity of a frontier chunk.
pub const DEFAULT_SCATTER_CHUNK: usize = 512;
/// Default capacity of an update chunk.
pub const DEFAULT_GATHER_CHUNK: usize = 1024;

/// The capability set an algorithm supplies to the executor.
///
/// # Monotonicity
///
/// [`gather`](EdgeMapOps::gather) must move per-vertex state in a single
/// direction (e.g., non-increasing for shortest paths). The engine's
/// ordering is weak, and convergence rests entirely on this property;
/// violating it is not detected.
pub trait EdgeMapOps {
    /// Returns `true` if a frontier item is stale and should be skipped.
    fn filter(&self, node: u32, dist: u32) -> bool {
        let _ = (node, dist);
        false
    }

    /// Combines an arc weight with the source value into a candidate value
    /// for the destination.
    fn apply_weight(&self, weight: u32, val: u32) -> u32;

    /// Applies a candidate value to a destination if it improves its state,
    /// atomically; returns whether the state changed.
    fn gather(&self, val: u32, node: u32) -> bool;

    /// Prefetches the per-vertex state of a node.
    fn prefetch_state(&self, node: u32) {
        let _ = node;
    }
}

/// Maps a frontier item to its priority-bucket index.
///
/// The semantics of the index are entirely the algorithm's: shortest paths
/// quantize the tentative distance, other algorithms may use anything that
/// biases useful work first.
pub trait Indexer {
    /// Returns the bucket index of an item.
    fn index(&self, item: FrontierItem) -> u32;
}

/// The delta-stepping indexer: `dist >> shift`.
#[derive(Debug, Clone, Copy)]
pub struct StepIndexer {
    /// The priority quantum, as a shift amount.
    pub shift: u32,
}

impl Indexer for StepIndexer {
    #[inline(always)]
    fn index(&self, item: FrontierItem) -> u32 {
        item.dist >> self.shift
    }
}

/// Work counters aggregated over a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    /// Rounds until quiescence.
    pub rounds: u64,
    /// Frontier items processed by the scatter phase.
    pub scattered: u64,
    /// Updates processed by the gather phase.
    pub gathered: u64,
    /// Software prefetches issued.
    pub prefetches: u64,
    /// Partition claims obtained by stealing or sweeping.
    pub steals: u64,
}

#[derive(Default)]
struct SharedStats {
    rounds: AtomicU64,
    scattered: AtomicU64,
    gathered: AtomicU64,
    prefetches: AtomicU64,
    steals: AtomicU64,
}

impl SharedStats {
    fn snapshot(&self) -> EngineStats {
        EngineStats {
            rounds: self.rounds.load(Ordering::Relaxed),
            scattered: self.scattered.load(Ordering::Relaxed),
            gathered: self.gathered.load(Ordering::Relaxed),
            prefetches: self.prefetches.load(Ordering::Relaxed),
            steals: self.steals.load(Ordering::Relaxed),
        }
    }
}

/// The per-worker double-buffered staging area of outgoing updates, indexed
/// by destination partition.
///
/// The worker alternates between two of these: the scatter task fills one
/// while the sibling still stages the updates of the previous frontier
/// chunk, which are drained into the partition queues only after the fill.
/// A slot that fills up mid-scatter is published immediately and replaced
/// from the worker's chunk pool.
pub struct Facing {
    slots: Box<[Option<Chunk<Update>>]>,
    touched: Vec<u32>,
}

impl Facing {
    /// Creates a buffer with one slot per partition.
    pub fn new(num_partitions: usize) -> Self {
        Self {
            slots: (0..num_partitions).map(|_| None).collect(),
            touched: Vec::new(),
        }
    }

    /// Appends an update to the slot of a partition.
    pub fn push(
        &mut self,
        obim: &Obim,
        pool: &mut ChunkPool<Update>,
        wid: usize,
        part: u32,
        update: Update,
    ) {
        let slot = &mut self.slots[part as usize];
        let chunk = match slot {
            Some(chunk) => chunk,
            None => {
                self.touched.push(part);
                slot.insert(pool.take())
            }
        };
        if !chunk.push(update) {
            let full = mem::replace(chunk, pool.take());
            obim.scatter(wid, part, full);
            let pushed = chunk.push(update);
            debug_assert!(pushed);
        }
    }

    /// Drains every non-empty slot into its partition queue.
    pub fn flush(&mut self, obim: &Obim, wid: usize) {
        for part in self.touched.drain(..) {
            if let Some(chunk) = self.slots[part as usize].take() {
                if !chunk.is_empty() {
                    obim.scatter(wid, part, chunk);
                }
            }
        }
    }
}

/// A priority-ordered edge map over a partitioned graph.
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run), which drives the supplied [`EdgeMapOps`] to global
/// quiescence and returns the [work counters](EngineStats). The per-vertex
/// state belongs to the algorithm; the engine returns when no worker can
/// find any frontier item or pending update.
///
/// # Examples
///
/// A one-arc shortest path, spelled out (the `sssp` module wraps all of
/// this):
///
/// ```
/// use dsi_progress_logger::no_logging;
/// use priograph::algo::sssp::SsspOps;
/// use priograph::exec::{PriorityEdgeMap, StepIndexer};
/// use priograph::graphs::{Csr, PartitionedGraph};
/// use priograph::worklists::FrontierItem;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let csr = Csr::from_arcs(2, [(0, 1, 7)]);
/// let graph = PartitionedGraph::build(&csr, 2, no_logging![])?;
/// let dist = [AtomicU32::new(0), AtomicU32::new(u32::MAX)];
/// let mut edge_map = PriorityEdgeMap::new(&graph);
/// edge_map.threads(2);
/// edge_map.run(
///     [FrontierItem { node: 0, dist: 0 }],
///     &SsspOps::new(&dist),
///     &StepIndexer { shift: 2 },
/// )?;
/// assert_eq!(dist[1].load(Ordering::Relaxed), 7);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct PriorityEdgeMap<'a> {
    graph: &'a PartitionedGraph,
    threads: usize,
    lane_size: usize,
    scatter_chunk: usize,
    gather_chunk: usize,
}

impl<'a> PriorityEdgeMap<'a> {
    /// Creates an edge map over a partitioned graph with default options.
    ///
    /// The default number of workers is the number of threads of the global
    /// rayon pool.
    pub fn new(graph: &'a PartitionedGraph) -> Self {
        Self {
            graph,
            threads: rayon::current_num_threads(),
            lane_size: DEFAULT_LANE_SIZE,
            scatter_chunk: DEFAULT_SCATTER_CHUNK,
            gather_chunk: DEFAULT_GATHER_CHUNK,
        }
    }

    /// Sets the number of worker threads.
    pub fn threads(&mut self, threads: usize) -> &mut Self {
        self.threads = threads;
        self
    }

    /// Sets the prefetch lane size.
    pub fn lane_size(&mut self, lane_size: usize) -> &mut Self {
        self.lane_size = lane_size;
        self
    }

    /// Sets the capacity of frontier chunks.
    pub fn scatter_chunk(&mut self, capacity: usize) -> &mut Self {
        self.scatter_chunk = capacity;
        self
    }

    /// Sets the capacity of update chunks.
    pub fn gather_chunk(&mut self, capacity: usize) -> &mut Self {
        self.gather_chunk = capacity;
        self
    }

    /// Runs the edge map to global quiescence.
    pub fn run<O: EdgeMapOps + Sync, I: Indexer + Sync>(
        &self,
        frontier: impl IntoIterator<Item = FrontierItem>,
        ops: &O,
        indexer: &I,
    ) -> Result<EngineStats> {
        self.run_with_logging(frontier, ops, indexer, no_logging![])
    }

    /// Runs the edge map to global quiescence, logging progress.
    pub fn run_with_logging<O: EdgeMapOps + Sync, I: Indexer + Sync>(
        &self,
        frontier: impl IntoIterator<Item = FrontierItem>,
        ops: &O,
        indexer: &I,
        pl: &mut impl ProgressLog,
    ) -> Result<EngineStats> {
        ensure!(self.threads > 0, ConfigError::ZeroThreads);
        ensure!(self.lane_size > 0, ConfigError::ZeroLaneSize);
        ensure!(
            self.scatter_chunk > 0 && self.gather_chunk > 0,
            ConfigError::ZeroChunkCapacity
        );

        log::info!(
            "Priority edge map: {} threads, {} partitions, lane {}, chunks {}/{}",
            self.threads,
            self.graph.num_partitions(),
            self.lane_size,
            self.scatter_chunk,
            self.gather_chunk
        );

        let obim = Obim::new(self.threads, self.graph.num_partitions());

        // Seed the priority side before the workers start.
        {
            let mut local = obim.local(0);
            let mut pool = ChunkPool::new(self.scatter_chunk);
            obim.push_batch(&mut local, frontier, |item| indexer.index(item), &mut pool);
        }

        let terminator = Terminator::new(self.threads);
        let shared = SharedStats::default();
        let pool = thread_pool![self.threads];

        pl.start("Running priority edge map...");
        pool.broadcast(|ctx| {
            self.worker(ctx.index(), &obim, ops, indexer, &terminator, &shared)
        });
        pl.done();

        let stats = shared.snapshot();
        log::info!(
            "Quiescent after {} rounds: {} scattered, {} gathered, {} prefetches, {} steals",
            stats.rounds,
            stats.scattered,
            stats.gathered,
            stats.prefetches,
            stats.steals
        );
        Ok(stats)
    }

    /// The per-worker Scatter → Sync → Gather loop.
    fn worker<O: EdgeMapOps + Sync, I: Indexer + Sync>(
        &self,
        wid: usize,
        obim: &Obim,
        ops: &O,
        indexer: &I,
        terminator: &Terminator,
        shared: &SharedStats,
    ) {
        let graph = self.graph;
        let mut local = obim.local(wid);
        let mut frontier_pool = ChunkPool::new(self.scatter_chunk);
        let mut update_pool = ChunkPool::new(self.gather_chunk);
        let mut facing = Facing::new(graph.num_partitions());
        let mut facing_prev = Facing::new(graph.num_partitions());
        let mut items: Vec<FrontierItem> = Vec::with_capacity(self.scatter_chunk);
        let mut updates: Vec<Update> = Vec::with_capacity(self.gather_chunk);
        let mut new_frontier: Vec<FrontierItem> = Vec::new();

        let mut rounds = 0u64;
        let mut scattered = 0u64;
        let mut gathered = 0u64;
        let mut prefetches = 0u64;
        let mut steals = 0u64;

        loop {
            let mut did_work = false;

            // Scatter: expand frontier chunks into the facing buffer;
            // Sync: drain the sibling buffer, which still stages the
            // updates of the previous chunk.
            while let Some(chunk) = obim.pop(&mut local) {
                did_work = true;
                items.clear();
                items.extend_from_slice(chunk.as_slice());
                frontier_pool.put(chunk);
                let mut task = ScatterTask::new(
                    graph,
                    ops,
                    obim,
                    &items,
                    &mut facing,
                    &mut update_pool,
                    wid,
                    self.lane_size,
                );
                while !task.resume() {}
                prefetches += task.prefetches();
                scattered += items.len() as u64;
                facing_prev.flush(obim, wid);
                mem::swap(&mut facing, &mut facing_prev);
            }
            // The last chunk's updates are still staged; drain them before
            // gathering.
            facing_prev.flush(obim, wid);

            // Gather: claim partitions and apply their updates, feeding the
            // improved destinations back to the priority side.
            while let Some((part, stolen)) = obim.pop_part(wid) {
                steals += stolen as u64;
                let queue = obim.part_queue(part);
                while let Some(chunk) = queue.pop_chunk() {
                    did_work = true;
                    updates.clear();
                    updates.extend_from_slice(chunk.as_slice());
                    update_pool.put(chunk);
                    new_frontier.clear();
                    let mut task =
                        GatherTask::new(ops, &updates, &mut new_frontier, self.lane_size);
                    while !task.resume() {}
                    prefetches += task.prefetches();
                    gathered += updates.len() as u64;
                    obim.push_batch(
                        &mut local,
                        new_frontier.drain(..),
                        |item| indexer.index(item),
                        &mut frontier_pool,
                    );
                }
            }

            let quiescent = terminator.round(rounds as usize & 1, did_work);
            rounds += 1;
            if quiescent {
                break;
            }
        }

        shared.rounds.store(rounds, Ordering::Relaxed);
        shared.scattered.fetch_add(scattered, Ordering::Relaxed);
        shared.gathered.fetch_add(gathered, Ordering::Relaxed);
        shared.prefetches.fetch_add(prefetches, Ordering::Relaxed);
        shared.steals.fetch_add(steals, Ordering::Relaxed);
    }
}
