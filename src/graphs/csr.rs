/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::WeightedArc;

/// A compressed sparse row graph with optional arc weights.
///
/// The representation stores the degree-cumulative function (DCF) and the
/// successors of each node; weights, when present, are parallel to the
/// successors. The DCF is a sequence of offsets that indicates the start of
/// the neighbors for each node in the graph.
///
/// This is the upstream interface of the engine: a loader builds a `Csr`
/// once, and it is read-only thereafter. Node identifiers are 32-bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csr {
    dcf: Vec<usize>,
    successors: Vec<u32>,
    weights: Option<Vec<u32>>,
}

impl core::default::Default for Csr {
    fn default() -> Self {
        Self {
            dcf: vec![0],
            successors: vec![],
            weights: None,
        }
    }
}

impl Csr {
    /// Creates a new CSR graph from the given degree-cumulative function,
    /// successors, and optional weights.
    ///
    /// # Safety
    /// The degree-cumulative function must be monotone and coherent with the
    /// successors; the weights, if present, must be parallel to the
    /// successors.
    pub unsafe fn from_parts(
        dcf: Vec<usize>,
        successors: Vec<u32>,
        weights: Option<Vec<u32>>,
    ) -> Self {
        debug_assert_eq!(*dcf.last().unwrap(), successors.len());
        debug_assert!(
            weights
                .as_ref()
                .map_or(true, |w| w.len() == successors.len())
        );
        Self {
            dcf,
            successors,
            weights,
        }
    }

    /// Creates a new graph from a list of weighted arcs `(src, dst, weight)`.
    ///
    /// The arcs need not be sorted; their relative order within a source is
    /// preserved. Parallel arcs and self-loops are kept.
    pub fn from_arcs(num_nodes: usize, arcs: impl IntoIterator<Item = (u32, u32, u32)>) -> Self {
        let mut arcs = arcs.into_iter().collect::<Vec<_>>();
        arcs.sort_by_key(|&(src, _, _)| src);
        let mut dcf = Vec::with_capacity(num_nodes + 1);
        let mut successors = Vec::with_capacity(arcs.len());
        let mut weights = Vec::with_capacity(arcs.len());
        dcf.push(0);
        let mut last_src = 0;
        for (src, dst, weight) in arcs {
            assert!((src as usize) < num_nodes, "source {src} out of range");
            assert!((dst as usize) < num_nodes, "destination {dst} out of range");
            while last_src < src {
                dcf.push(successors.len());
                last_src += 1;
            }
            successors.push(dst);
            weights.push(weight);
        }
        for _ in last_src as usize..num_nodes {
            dcf.push(successors.len());
        }
        unsafe { Self::from_parts(dcf, successors, Some(weights)) }
    }

    /// Creates a new unweighted graph from a list of arcs `(src, dst)`.
    ///
    /// All arcs get a unit weight.
    pub fn from_unweighted_arcs(
        num_nodes: usize,
        arcs: impl IntoIterator<Item = (u32, u32)>,
    ) -> Self {
        let mut graph =
            Self::from_arcs(num_nodes, arcs.into_iter().map(|(src, dst)| (src, dst, 1)));
        graph.weights = None;
        graph
    }

    /// Returns the number of nodes of the graph.
    pub fn num_nodes(&self) -> usize {
        self.dcf.len() - 1
    }

    /// Returns the number of arcs of the graph.
    pub fn num_arcs(&self) -> usize {
        self.successors.len()
    }

    /// Returns the outdegree of a node.
    pub fn outdegree(&self, node: u32) -> usize {
        self.dcf[node as usize + 1] - self.dcf[node as usize]
    }

    /// Returns the successors of a node.
    pub fn successors(&self, node: u32) -> &[u32] {
        &self.successors[self.dcf[node as usize]..self.dcf[node as usize + 1]]
    }

    /// Returns the weights of the arcs of a node, if the graph is weighted.
    pub fn arc_weights(&self, node: u32) -> Option<&[u32]> {
        self.weights
            .as_ref()
            .map(|w| &w[self.dcf[node as usize]..self.dcf[node as usize + 1]])
    }

    /// Returns the largest arc weight, or `None` if the graph is unweighted.
    pub fn max_weight(&self) -> Option<u32> {
        self.weights
            .as_ref()
            .map(|w| w.iter().copied().max().unwrap_or(0))
    }

    /// Iterates over the weighted arcs of a node.
    ///
    /// Unweighted graphs yield unit weights.
    pub fn arcs(&self, node: u32) -> impl Iterator<Item = WeightedArc> + '_ {
        let range = self.dcf[node as usize]..self.dcf[node as usize + 1];
        let weights = self.weights.as_deref();
        range.map(move |i| WeightedArc {
            dst: self.successors[i],
            weight: weights.map_or(1, |w| w[i]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_arcs() {
        let g = Csr::from_arcs(4, [(2, 0, 5), (0, 1, 3), (0, 2, 10), (2, 3, 1)]);
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_arcs(), 4);
        assert_eq!(g.successors(0), &[1, 2]);
        assert_eq!(g.arc_weights(0), Some(&[3, 10][..]));
        assert_eq!(g.successors(1), &[]);
        assert_eq!(g.successors(2), &[0, 3]);
        assert_eq!(g.outdegree(3), 0);
    }

    #[test]
    fn test_unweighted_unit_arcs() {
        let g = Csr::from_unweighted_arcs(2, [(0, 1)]);
        assert_eq!(
            g.arcs(0).collect::<Vec<_>>(),
            vec![WeightedArc { dst: 1, weight: 1 }]
        );
        assert_eq!(g.max_weight(), None);
    }
}
