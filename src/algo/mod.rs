/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Graph algorithms.
//!
//! [`sssp`] is the representative priority-ordered algorithm, exercising the
//! full prefetch-pipelined engine; [`cc`] is a synchronous label
//! propagation, which does not need the priority machinery at all.

pub mod cc;
pub mod sssp;
