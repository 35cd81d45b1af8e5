//! Resolution of node paths into concrete edge sequences.
//!
//! A node path `[a, b, c]` is realised by any choice of one parallel edge per
//! hop.  All choices of all node paths compete in one bounded max-heap of
//! size `k`, so only the `k` cheapest concrete sequences survive.

use std::collections::BinaryHeap;

use cp_core::{EdgeId, EdgeWeight, NodeId};
use cp_topology::TopologyGraph;

use crate::yen::edge_weight;

/// The `k` cheapest edge sequences realising any of `node_paths`, sorted by
/// non-decreasing weight, ties broken by edge sequence.
pub fn resolve_edges(
    graph:      &TopologyGraph,
    node_paths: &[Vec<NodeId>],
    weight:     EdgeWeight,
    k:          usize,
) -> Vec<(u64, Vec<EdgeId>)> {
    if k == 0 {
        return Vec::new();
    }
    // Max-heap: the root is the worst retained sequence.
    let mut best: BinaryHeap<(u64, Vec<EdgeId>)> = BinaryHeap::with_capacity(k + 1);

    for path in node_paths {
        let options: Vec<Vec<(EdgeId, u64)>> = path
            .windows(2)
            .map(|w| {
                graph
                    .edges_between(w[0], w[1])
                    .map(|e| (e, edge_weight(graph.edge(e), weight)))
                    .collect()
            })
            .collect();
        if options.iter().any(Vec::is_empty) {
            continue;
        }

        // Odometer over the per-hop choices.
        let mut choice = vec![0usize; options.len()];
        loop {
            let total: u64 = choice.iter().zip(&options).map(|(&c, o)| o[c].1).sum();
            let worst = best.peek().map(|(w, _)| *w);
            if best.len() < k || worst.is_some_and(|w| total <= w) {
                let edges: Vec<EdgeId> = choice.iter().zip(&options).map(|(&c, o)| o[c].0).collect();
                best.push((total, edges));
                if best.len() > k {
                    best.pop();
                }
            }

            let mut hop = 0;
            while hop < choice.len() {
                choice[hop] += 1;
                if choice[hop] < options[hop].len() {
                    break;
                }
                choice[hop] = 0;
                hop += 1;
            }
            if hop == choice.len() {
                break;
            }
        }
    }

    best.into_sorted_vec()
}
