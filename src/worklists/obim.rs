/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The ordered-by-integer-metric work queue.
//!
//! [`Obim`] stores two logically separate queue systems.
//!
//! On the **scatter side**, frontier items live in priority buckets keyed by
//! an integer index computed by the algorithm's indexer. Buckets are created
//! lazily and shared through an append-only *master log*: a worker that
//! needs a bucket it has never seen replays the log entries it missed into
//! its private, sorted mirror of the bucket map, taking the master lock only
//! when it must create a bucket. Each worker drains one bucket at a time
//! ([`pop`](Obim::pop)) and, when its current bucket runs dry, rescans its
//! mirror from the lowest index any worker ever published to.
//!
//! The ordering guarantee is intentionally weak: workers are only biased
//! toward lower indices. Delta-stepping-style algorithms converge anyway
//! because stale items are suppressed by the algorithm's monotone filter.
//!
//! On the **gather side**, one [chunked queue](ChunkQueue) per partition
//! accumulates updates. When a partition queue goes from empty to non-empty
//! the pushing worker advertises it on its own *gather queue*; gather
//! workers consume their own gather queue first, then steal from the other
//! workers' queues, and finally fall back to a direct sweep of the
//! partition queues, which also makes the termination check exact.

use crossbeam_queue::SegQueue;
use crossbeam_utils::CachePadded;
use std::collections::BTreeMap;
use std::mem;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{Chunk, ChunkPool, ChunkQueue, FrontierItem, Update};

/// A priority bucket.
type Bucket = ChunkQueue<FrontierItem>;

/// The ordered-by-integer-metric work queue.
pub struct Obim {
    /// Append-only log of all buckets ever created, in creation order.
    master_log: Mutex<Vec<(u32, Arc<Bucket>)>>,
    /// Length of the master log, readable without the lock.
    master_version: AtomicUsize,
    /// Per-worker lowest index ever published to.
    scan_start: Vec<CachePadded<AtomicU32>>,
    /// One update queue per partition.
    parts: Box<[ChunkQueue<Update>]>,
    /// Per-worker queues of advertised partition ids.
    gather_q: Vec<CachePadded<SegQueue<u32>>>,
}

/// The per-worker view of the scatter side of an [`Obim`].
///
/// Workers never share their view; all cross-worker traffic goes through
/// the master log and the queues themselves.
pub struct ObimLocal {
    wid: usize,
    /// Private mirror of the bucket map, sorted by index.
    buckets: BTreeMap<u32, Arc<Bucket>>,
    /// Master-log entries already replayed into the mirror.
    last_version: usize,
    /// The bucket currently being drained.
    cur: Option<(u32, Arc<Bucket>)>,
}

impl Obim {
    /// Creates a queue for the given number of workers and partitions.
    pub fn new(num_workers: usize, num_partitions: usize) -> Self {
        Self {
            master_log: Mutex::new(Vec::new()),
            master_version: AtomicUsize::new(0),
            scan_start: (0..num_workers)
                .map(|_| CachePadded::new(AtomicU32::new(u32::MAX)))
                .collect(),
            parts: (0..num_partitions).map(|_| ChunkQueue::new()).collect(),
            gather_q: (0..num_workers)
                .map(|_| CachePadded::new(SegQueue::new()))
                .collect(),
        }
    }

    /// Creates the view of a worker.
    pub fn local(&self, wid: usize) -> ObimLocal {
        ObimLocal {
            wid,
            buckets: BTreeMap::new(),
            last_version: 0,
            cur: None,
        }
    }

    /// Replays the master-log entries the worker has not seen yet into its
    /// mirror.
    fn sync(&self, local: &mut ObimLocal) {
        if self.master_version.load(Ordering::Acquire) == local.last_version {
            return;
        }
        let log = self.master_log.lock().unwrap();
        for (index, bucket) in &log[local.last_version..] {
            local.buckets.insert(*index, bucket.clone());
        }
        local.last_version = log.len();
    }

    /// Returns the bucket for an index, creating and logging it if no worker
    /// has created it yet.
    fn bucket(&self, local: &mut ObimLocal, index: u32) -> Arc<Bucket> {
        if let Some(bucket) = local.buckets.get(&index) {
            return bucket.clone();
        }
        self.sync(local);
        if let Some(bucket) = local.buckets.get(&index) {
            return bucket.clone();
        }
        let mut log = self.master_log.lock().unwrap();
        // Another worker may have appended the bucket while we waited for
        // the lock: replay before creating.
        for (idx, bucket) in &log[local.last_version..] {
            local.buckets.insert(*idx, bucket.clone());
        }
        if let Some(bucket) = local.buckets.get(&index) {
            local.last_version = log.len();
            return bucket.clone();
        }
        let bucket = Arc::new(Bucket::new());
        log.push((index, bucket.clone()));
        local.last_version = log.len();
        self.master_version.store(log.len(), Ordering::Release);
        local.buckets.insert(index, bucket.clone());
        bucket
    }

    /// Publishes a chunk of frontier items into the bucket of an index.
    fn push_chunk(&self, local: &mut ObimLocal, index: u32, chunk: Chunk<FrontierItem>) {
        let scan_start = &self.scan_start[local.wid];
        if index < scan_start.load(Ordering::Relaxed) {
            scan_start.store(index, Ordering::Relaxed);
        }
        self.bucket(local, index).push_chunk(chunk);
    }

    /// Pushes a batch of frontier items, chunking them per index.
    ///
    /// Full chunks are published immediately; the remainders are published
    /// at the end of the batch.
    pub fn push_batch(
        &self,
        local: &mut ObimLocal,
        items: impl IntoIterator<Item = FrontierItem>,
        index_of: impl Fn(FrontierItem) -> u32,
        pool: &mut ChunkPool<FrontierItem>,
    ) {
        let mut staged: BTreeMap<u32, Chunk<FrontierItem>> = BTreeMap::new();
        for item in items {
            let index = index_of(item);
            let chunk = staged.entry(index).or_insert_with(|| pool.take());
            if !chunk.push(item) {
                let full = mem::replace(chunk, pool.take());
                self.push_chunk(local, index, full);
                let pushed = chunk.push(item);
                debug_assert!(pushed);
            }
        }
        for (index, chunk) in staged {
            self.push_chunk(local, index, chunk);
        }
    }

    /// The lowest index any worker ever published to.
    fn global_scan_start(&self) -> u32 {
        self.scan_start
            .iter()
            .map(|s| s.load(Ordering::Relaxed))
            .min()
            .unwrap_or(u32::MAX)
    }

    /// Pops a chunk of frontier items.
    ///
    /// The worker keeps draining its current bucket; once that is empty it
    /// synchronizes its mirror with the master log and rescans upward from
    /// the global scan start for the lowest non-empty bucket. Returns `None`
    /// when the worker sees no scatter work anywhere.
    pub fn pop(&self, local: &mut ObimLocal) -> Option<Chunk<FrontierItem>> {
        if let Some((_, bucket)) = &local.cur {
            if let Some(chunk) = bucket.pop_chunk() {
                return Some(chunk);
            }
            local.cur = None;
        }
        self.sync(local);
        let start = self.global_scan_start();
        let found = local
            .buckets
            .range(start..)
            .find_map(|(&index, bucket)| bucket.pop_chunk().map(|chunk| (index, bucket.clone(), chunk)));
        let (index, bucket, chunk) = found?;
        local.cur = Some((index, bucket));
        Some(chunk)
    }

    /// Publishes a chunk of updates for a partition, advertising the
    /// partition on the worker's gather queue if its queue was empty.
    pub fn scatter(&self, wid: usize, part: u32, chunk: Chunk<Update>) {
        if self.parts[part as usize].push_chunk(chunk) {
            self.gather_q[wid].push(part);
        }
    }

    /// Returns the update queue of a partition.
    pub fn part_queue(&self, part: u32) -> &ChunkQueue<Update> {
        &self.parts[part as usize]
    }

    /// Claims an advertised partition.
    ///
    /// The worker's own gather queue is consulted first; then the other
    /// workers' queues, scanning from the worker's id and wrapping; as a
    /// last resort, the partition queues themselves are swept, so no
    /// published update can be missed. Returns the partition id and whether
    /// it was obtained by stealing.
    pub fn pop_part(&self, wid: usize) -> Option<(u32, bool)> {
        if let Some(part) = self.gather_q[wid].pop() {
            return Some((part, false));
        }
        let num_workers = self.gather_q.len();
        for i in 1..num_workers {
            if let Some(part) = self.gather_q[(wid + i) % num_workers].pop() {
                return Some((part, true));
            }
        }
        let num_parts = self.parts.len();
        let start = wid * num_parts / num_workers;
        (0..num_parts)
            .map(|i| ((start + i) % num_parts) as u32)
            .find(|&part| !self.parts[part as usize].is_empty())
            .map(|part| (part, true))
    }

    /// Returns whether any partition queue still holds updates.
    pub fn has_updates(&self) -> bool {
        self.parts.iter().any(|q| !q.is_empty())
    }
}
