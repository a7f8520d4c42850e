/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crossbeam_queue::SegQueue;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Chunk;

/// A lock-free multi-producer queue of [chunks](Chunk).
///
/// This is the backbone of both priority buckets and partition queues. On
/// top of the lock-free linked queue, an explicit chunk count implements the
/// one contract consumers rely on: [`push_chunk`](ChunkQueue::push_chunk)
/// reports whether the queue was empty before the push, so that exactly one
/// producer observes each empty→non-empty transition and can advertise the
/// queue.
///
/// The count is updated after the corresponding queue operation, so a
/// transition is never reported before its chunk is visible.
pub struct ChunkQueue<T> {
    chunks: SegQueue<Chunk<T>>,
    len: AtomicUsize,
}

impl<T> Default for ChunkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChunkQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            chunks: SegQueue::new(),
            len: AtomicUsize::new(0),
        }
    }

    /// Publishes a chunk, returning whether the queue was empty before the
    /// push.
    pub fn push_chunk(&self, chunk: Chunk<T>) -> bool {
        self.chunks.push(chunk);
        self.len.fetch_add(1, Ordering::AcqRel) == 0
    }

    /// Pops a whole chunk.
    pub fn pop_chunk(&self) -> Option<Chunk<T>> {
        let chunk = self.chunks.pop()?;
        self.len.fetch_sub(1, Ordering::AcqRel);
        Some(chunk)
    }

    /// Returns whether the queue is empty.
    ///
    /// The answer is advisory under concurrent pushes, but an empty answer
    /// is exact once all producers have quiesced.
    pub fn is_empty(&self) -> bool {
        self.len.load(Ordering::Acquire) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_was_empty_transition() {
        let queue = ChunkQueue::new();
        let mut chunk = Chunk::new(4);
        chunk.push(1u32);
        assert!(queue.push_chunk(chunk));
        let mut chunk = Chunk::new(4);
        chunk.push(2u32);
        assert!(!queue.push_chunk(chunk));
        assert_eq!(queue.pop_chunk().unwrap().as_slice(), &[1]);
        assert_eq!(queue.pop_chunk().unwrap().as_slice(), &[2]);
        assert!(queue.pop_chunk().is_none());
        assert!(queue.is_empty());
    }
}
