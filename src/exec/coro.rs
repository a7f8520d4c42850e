/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The cooperative prefetch-pipelined task primitive.
//!
//! A [`Coro`] is a tiny stackless task that alternates between two phases:
//! it issues software prefetches for a *lane* of work items and suspends;
//! when resumed (the prefetched lines have had time to arrive) it consumes
//! the lane and moves to the next one. Suspension is a plain return, so a
//! yield costs a handful of cycles; the latency of a lane of cache misses
//! overlaps with whatever the driving worker does between steps.
//!
//! Tasks never migrate between threads and are never preempted: the
//! executor steps each task on its own worker until the final yield, which
//! is the only one returning `true`.

use super::{EdgeMapOps, Facing};
use crate::graphs::PartitionedGraph;
use crate::worklists::{ChunkPool, FrontierItem, Obim, Update};

/// A stackless cooperative task.
pub trait Coro {
    /// Runs the task to its next suspension point.
    ///
    /// Returns `false` if the task has more work to do and `true` on the
    /// final yield.
    fn resume(&mut self) -> bool;
}

#[derive(Clone, Copy)]
enum Phase {
    Prefetch,
    Consume,
}

/// The scatter task: prefetches a lane of vertex records, suspends, then
/// expands the records into per-partition updates.
pub struct ScatterTask<'a, O> {
    graph: &'a PartitionedGraph,
    ops: &'a O,
    obim: &'a Obim,
    items: &'a [FrontierItem],
    facing: &'a mut Facing,
    pool: &'a mut ChunkPool<Update>,
    wid: usize,
    lane: usize,
    pos: usize,
    phase: Phase,
    prefetches: u64,
}

impl<'a, O: EdgeMapOps> ScatterTask<'a, O> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &'a PartitionedGraph,
        ops: &'a O,
        obim: &'a Obim,
        items: &'a [FrontierItem],
        facing: &'a mut Facing,
        pool: &'a mut ChunkPool<Update>,
        wid: usize,
        lane: usize,
    ) -> Self {
        Self {
            graph,
            ops,
            obim,
            items,
            facing,
            pool,
            wid,
            lane,
            pos: 0,
            phase: Phase::Prefetch,
            prefetches: 0,
        }
    }

    /// Number of prefetches issued so far.
    pub fn prefetches(&self) -> u64 {
        self.prefetches
    }
}

impl<O: EdgeMapOps> Coro for ScatterTask<'_, O> {
    fn resume(&mut self) -> bool {
        let end = (self.pos + self.lane).min(self.items.len());
        match self.phase {
            Phase::Prefetch => {
                for item in &self.items[self.pos..end] {
                    self.graph.prefetch_record(item.node);
                }
                self.prefetches += (end - self.pos) as u64;
                self.phase = Phase::Consume;
                self.pos >= self.items.len()
            }
            Phase::Consume => {
                for item in &self.items[self.pos..end] {
                    if self.ops.filter(item.node, item.dist) {
                        continue;
                    }
                    for group in self.graph.groups(item.node) {
                        let part = group.partition();
                        for arc in group.iter() {
                            let update = Update {
                                node: arc.dst,
                                val: self.ops.apply_weight(arc.weight, item.dist),
                            };
                            self.facing
                                .push(self.obim, self.pool, self.wid, part, update);
                        }
                    }
                }
                self.pos = end;
                self.phase = Phase::Prefetch;
                self.pos >= self.items.len()
            }
        }
    }
}

/// The gather task: prefetches a lane of destination state, suspends, then
/// applies the updates, collecting the improved ones into the new frontier.
pub struct GatherTask<'a, O> {
    ops: &'a O,
    items: &'a [Update],
    new_frontier: &'a mut Vec<FrontierItem>,
    lane: usize,
    pos: usize,
    phase: Phase,
    prefetches: u64,
}

impl<'a, O: EdgeMapOps> GatherTask<'a, O> {
    pub fn new(
        ops: &'a O,
        items: &'a [Update],
        new_frontier: &'a mut Vec<FrontierItem>,
        lane: usize,
    ) -> Self {
        Self {
            ops,
            items,
            new_frontier,
            lane,
            pos: 0,
            phase: Phase::Prefetch,
            prefetches: 0,
        }
    }

    /// Number of prefetches issued so far.
    pub fn prefetches(&self) -> u64 {
        self.prefetches
    }
}

impl<O: EdgeMapOps> Coro for GatherTask<'_, O> {
    fn resume(&mut self) -> bool {
        let end = (self.pos + self.lane).min(self.items.len());
        match self.phase {
            Phase::Prefetch => {
                for update in &self.items[self.pos..end] {
                    self.ops.prefetch_state(update.node);
                }
                self.prefetches += (end - self.pos) as u64;
                self.phase = Phase::Consume;
                self.pos >= self.items.len()
            }
            Phase::Consume => {
                for update in &self.items[self.pos..end] {
                    if self.ops.gather(update.val, update.node) {
                        self.new_frontier.push(FrontierItem {
                            node: update.node,
                            dist: update.val,
                        });
                    }
                }
                self.pos = end;
                self.phase = Phase::Prefetch;
                self.pos >= self.items.len()
            }
        }
    }
}
