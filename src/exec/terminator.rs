/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};

/// Distributed termination detection over a reusable two-phase barrier.
///
/// Once per round every worker reports whether it found any work; the
/// workers then agree, at a barrier, on whether the whole system is
/// quiescent. The busy flag is indexed by round parity so that a worker
/// racing ahead into the next round cannot clobber the flag its peers are
/// still reading: flags for round *r* + 1 are reset before the first wait of
/// round *r*, and read strictly between the two waits of round *r* + 1.
///
/// All workers obtain the same verdict in the same round, so they leave the
/// loop together.
pub struct Terminator {
    barrier: Barrier,
    busy: [AtomicBool; 2],
}

impl Terminator {
    /// Creates a detector for the given number of workers.
    pub fn new(num_workers: usize) -> Self {
        Self {
            barrier: Barrier::new(num_workers),
            busy: [AtomicBool::new(false), AtomicBool::new(false)],
        }
    }

    /// Ends a round, reporting whether this worker did any work; returns
    /// whether the system is globally quiescent.
    ///
    /// `parity` must be the round number modulo 2, counted identically by
    /// all workers.
    pub fn round(&self, parity: usize, did_work: bool) -> bool {
        self.busy[parity ^ 1].store(false, Ordering::Relaxed);
        if did_work {
            self.busy[parity].store(true, Ordering::Release);
        }
        self.barrier.wait();
        let quiescent = !self.busy[parity].load(Ordering::Acquire);
        self.barrier.wait();
        quiescent
    }
}
