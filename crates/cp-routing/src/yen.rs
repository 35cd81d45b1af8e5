//! Yen's k-shortest loopless paths over a weight-collapsed view of the
//! multigraph.
//!
//! Parallel edges between one ordered node pair collapse to a single arc
//! whose weight is the minimum (or maximum, per [`WeightGoal`]) of theirs.
//! Concrete edges are chosen afterwards by [`resolve_edges`](crate::resolve_edges).
//!
//! All searches break ties on `NodeId`, so results are deterministic for a
//! given graph.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use cp_core::{EdgeWeight, NodeId, WeightGoal};
use cp_topology::{Edge, TopologyGraph};

/// Search weight of a single edge.
#[inline]
pub fn edge_weight(edge: &Edge, weight: EdgeWeight) -> u64 {
    match weight {
        EdgeWeight::Length => edge.length as u64,
        EdgeWeight::Unit => 1,
    }
}

// ── CollapsedGraph ────────────────────────────────────────────────────────────

/// Simple directed graph with one arc per connected ordered node pair.
#[derive(Clone, Debug)]
pub struct CollapsedGraph {
    /// `adjacency[u]` = `(v, weight)` sorted by `v`.
    adjacency: Vec<Vec<(NodeId, u64)>>,
}

impl CollapsedGraph {
    pub fn new(graph: &TopologyGraph, weight: EdgeWeight, goal: WeightGoal) -> Self {
        let mut adjacency = vec![Vec::new(); graph.node_count()];
        for (u, arcs) in adjacency.iter_mut().enumerate() {
            let u = NodeId(u as u32);
            let mut out: Vec<(NodeId, u64)> = graph
                .out_edges(u)
                .map(|e| {
                    let edge = graph.edge(e);
                    (edge.to, edge_weight(edge, weight))
                })
                .collect();
            out.sort_unstable();
            // After sorting, the first entry per target is the minimum and
            // the last is the maximum.
            match goal {
                WeightGoal::Min => out.dedup_by_key(|a| a.0),
                WeightGoal::Max => {
                    out.reverse();
                    out.dedup_by_key(|a| a.0);
                    out.reverse();
                }
            }
            *arcs = out;
        }
        Self { adjacency }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Arc weight `u → v`, if connected.
    pub fn weight(&self, u: NodeId, v: NodeId) -> Option<u64> {
        let arcs = &self.adjacency[u.index()];
        arcs.binary_search_by_key(&v, |a| a.0).ok().map(|i| arcs[i].1)
    }

    /// Total weight of a node path; `None` if any hop is disconnected.
    pub fn path_weight(&self, path: &[NodeId]) -> Option<u64> {
        path.windows(2).try_fold(0u64, |acc, w| Some(acc + self.weight(w[0], w[1])?))
    }

    fn arcs(&self, u: NodeId) -> &[(NodeId, u64)] {
        &self.adjacency[u.index()]
    }
}

// ── Dijkstra ──────────────────────────────────────────────────────────────────

/// Nodes and arcs temporarily removed during a spur search.
#[derive(Default)]
struct Blocked {
    nodes: FxHashSet<NodeId>,
    arcs:  FxHashSet<(NodeId, NodeId)>,
}

/// Cheapest node path `from → to`, with its weight.
pub fn shortest_path(graph: &CollapsedGraph, from: NodeId, to: NodeId) -> Option<(u64, Vec<NodeId>)> {
    dijkstra(graph, from, to, &Blocked::default())
}

fn dijkstra(
    graph:   &CollapsedGraph,
    from:    NodeId,
    to:      NodeId,
    blocked: &Blocked,
) -> Option<(u64, Vec<NodeId>)> {
    if blocked.nodes.contains(&from) {
        return None;
    }
    if from == to {
        return Some((0, vec![from]));
    }

    let n = graph.node_count();
    let mut dist = vec![u64::MAX; n];
    let mut prev = vec![NodeId::INVALID; n];
    dist[from.index()] = 0;

    // Secondary key NodeId keeps pop order deterministic on equal cost.
    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return Some((cost, reconstruct(&prev, from, to)));
        }
        if cost > dist[node.index()] {
            continue;
        }
        for &(next, w) in graph.arcs(node) {
            if blocked.nodes.contains(&next) || blocked.arcs.contains(&(node, next)) {
                continue;
            }
            let new_cost = cost.saturating_add(w);
            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev[next.index()] = node;
                heap.push(Reverse((new_cost, next)));
            }
        }
    }
    None
}

fn reconstruct(prev: &[NodeId], from: NodeId, to: NodeId) -> Vec<NodeId> {
    let mut path = vec![to];
    let mut cur = to;
    while cur != from {
        cur = prev[cur.index()];
        path.push(cur);
    }
    path.reverse();
    path
}

// ── Yen ───────────────────────────────────────────────────────────────────────

/// Up to `k` loopless node paths `from → to` in non-decreasing weight order.
///
/// Equal-weight candidates are taken in lexicographic node-sequence order.
/// Returns an empty list when `to` is unreachable or `k == 0`.
pub fn k_shortest_paths(
    graph: &CollapsedGraph,
    from:  NodeId,
    to:    NodeId,
    k:     usize,
) -> Vec<(u64, Vec<NodeId>)> {
    if k == 0 {
        return Vec::new();
    }
    let Some(first) = shortest_path(graph, from, to) else {
        return Vec::new();
    };

    let mut seen: FxHashSet<Vec<NodeId>> = FxHashSet::default();
    seen.insert(first.1.clone());
    let mut accepted = vec![first];
    let mut candidates: BinaryHeap<Reverse<(u64, Vec<NodeId>)>> = BinaryHeap::new();

    while accepted.len() < k {
        let prev = accepted[accepted.len() - 1].1.clone();

        for i in 0..prev.len().saturating_sub(1) {
            let spur = prev[i];
            let root = &prev[..=i];

            let mut blocked = Blocked::default();
            for (_, path) in &accepted {
                if path.len() > i + 1 && &path[..=i] == root {
                    blocked.arcs.insert((path[i], path[i + 1]));
                }
            }
            blocked.nodes.extend(root[..i].iter().copied());

            let Some((spur_cost, spur_path)) = dijkstra(graph, spur, to, &blocked) else {
                continue;
            };
            let Some(root_cost) = graph.path_weight(root) else {
                continue;
            };

            let mut full = root[..i].to_vec();
            full.extend(spur_path);
            if seen.insert(full.clone()) {
                candidates.push(Reverse((root_cost + spur_cost, full)));
            }
        }

        match candidates.pop() {
            Some(Reverse(next)) => accepted.push(next),
            None => break,
        }
    }

    accepted
}
