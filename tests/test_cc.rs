/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use priograph::algo::cc;
use priograph::graphs::Csr;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Reference labeling: breadth-first sweep assigning to every node the
/// smallest node id of its (undirected) component.
fn reference_labels(num_nodes: usize, arcs: &[(u32, u32)]) -> Vec<u32> {
    let mut adj = vec![Vec::new(); num_nodes];
    for &(src, dst) in arcs {
        adj[src as usize].push(dst);
        adj[dst as usize].push(src);
    }
    let mut labels = vec![u32::MAX; num_nodes];
    for root in 0..num_nodes {
        if labels[root] != u32::MAX {
            continue;
        }
        let mut queue = vec![root as u32];
        labels[root] = root as u32;
        while let Some(node) = queue.pop() {
            for &succ in &adj[node as usize] {
                if labels[succ as usize] == u32::MAX {
                    labels[succ as usize] = root as u32;
                    queue.push(succ);
                }
            }
        }
    }
    labels
}

#[test]
fn test_two_triangles() {
    let graph =
        Csr::from_unweighted_arcs(6, [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
    assert_eq!(&*cc::connected_components(&graph), &[0, 0, 0, 3, 3, 3]);
}

#[test]
fn test_isolated_nodes() {
    let graph = Csr::from_unweighted_arcs(4, [(1, 2), (2, 1)]);
    assert_eq!(&*cc::connected_components(&graph), &[0, 1, 1, 3]);
}

#[test]
fn test_single_component_chain() {
    let mut arcs = Vec::new();
    for node in 0u32..9 {
        arcs.push((node, node + 1));
        arcs.push((node + 1, node));
    }
    let graph = Csr::from_unweighted_arcs(10, arcs);
    assert_eq!(&*cc::connected_components(&graph), &[0; 10]);
}

#[test]
fn test_random_symmetric_graphs() {
    let mut rng = SmallRng::seed_from_u64(0xCC);
    for &(num_nodes, num_arcs) in &[(20, 15), (100, 80), (300, 500)] {
        let arcs = (0..num_arcs)
            .map(|_| {
                (
                    rng.random_range(0..num_nodes) as u32,
                    rng.random_range(0..num_nodes) as u32,
                )
            })
            .collect::<Vec<_>>();
        let graph = Csr::from_unweighted_arcs(
            num_nodes,
            arcs.iter()
                .flat_map(|&(src, dst)| [(src, dst), (dst, src)]),
        );
        assert_eq!(
            &*cc::connected_components(&graph),
            &reference_labels(num_nodes, &arcs)[..]
        );
    }
}

#[test]
fn test_empty_graph() {
    let graph = Csr::default();
    assert!(cc::connected_components(&graph).is_empty());
}
