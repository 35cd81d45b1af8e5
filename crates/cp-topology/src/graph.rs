//! Decision-point multigraph.
//!
//! # Data layout
//!
//! Outgoing edges are stored in **Compressed Sparse Row (CSR)** form.  Given a
//! `NodeId n`, its outgoing edges are the `EdgeId`s
//!
//! ```text
//! node_out_start[n] .. node_out_start[n+1]
//! ```
//!
//! Edges are sorted by `(from, key)`, so the parallel edges between one node
//! pair appear in N, E, S, W order of their exit direction.  Nodes are also
//! reachable by grid position through a hash index.

use rustc_hash::FxHashMap;

use cp_core::{Direction, EdgeId, NodeId, Position};

// ── Node / Edge ───────────────────────────────────────────────────────────────

/// A decision point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub position: Position,
    /// Station id when the node coincides with a registered station.
    pub station: Option<u32>,
}

/// A directed, keyed run of track between two nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to:   NodeId,

    /// Exit direction from `from`.  Disambiguates parallel edges.
    pub key: Direction,

    /// Cells occupied in order, with the heading held in each: the source
    /// node cell (exit heading), every through cell, then the target node
    /// cell (arrival heading).  Never empty.
    pub resources: Vec<(Position, Direction)>,

    /// Cells advanced, `resources.len() - 1`.  Always ≥ 1.
    pub length: u32,

    /// Physical track id, shared with the mirror edge driven the other way.
    pub rail_id: u32,
}

impl Edge {
    /// Heading on arrival at `to`.
    pub fn arrival_heading(&self) -> Direction {
        self.resources.last().map_or(self.key, |&(_, h)| h)
    }
}

/// Where a grid position lies within the graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Node(NodeId),
    Edge(EdgeId),
}

// ── TopologyGraph ─────────────────────────────────────────────────────────────

/// Immutable decision-point multigraph.  Build with
/// [`TopologyBuilder`](crate::TopologyBuilder) or [`build_graph`](crate::build_graph).
#[derive(Clone, Debug)]
pub struct TopologyGraph {
    /// Indexed by `NodeId`, in discovery order.
    pub nodes: Vec<Node>,

    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    /// Indexed by `EdgeId`, sorted by `(from, key)`.
    pub edges: Vec<Edge>,

    node_index: FxHashMap<Position, NodeId>,
}

impl TopologyGraph {
    pub(crate) fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let node_count = nodes.len();
        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &edges {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edges.len());
        debug_assert!(edges.windows(2).all(|w| (w[0].from, w[0].key) < (w[1].from, w[1].key)));

        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.position, NodeId(i as u32)))
            .collect();

        Self { nodes, node_out_start, edges, node_index }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    #[inline]
    pub fn position(&self, id: NodeId) -> Position {
        self.nodes[id.index()].position
    }

    /// The node at `pos`, if `pos` is a decision point.
    pub fn node_at(&self, pos: Position) -> Option<NodeId> {
        self.node_index.get(&pos).copied()
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Outgoing edges of `node`; a contiguous index range.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()];
        let end   = self.node_out_start[node.index() + 1];
        (start..end).map(EdgeId)
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        (self.node_out_start[node.index() + 1] - self.node_out_start[node.index()]) as usize
    }

    /// Parallel edges from `u` to `v`, in key order.
    pub fn edges_between(&self, u: NodeId, v: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.out_edges(u).filter(move |e| self.edges[e.index()].to == v)
    }

    /// Nodes carrying a station id, in `NodeId` order.
    pub fn station_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.station.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Match a grid position to a node, or else to the first edge whose
    /// resources contain it.  `None` means the position is not on the network.
    pub fn locate(&self, pos: Position) -> Option<Location> {
        if let Some(node) = self.node_at(pos) {
            return Some(Location::Node(node));
        }
        self.edges
            .iter()
            .position(|e| e.resources.iter().any(|&(p, _)| p == pos))
            .map(|i| Location::Edge(EdgeId(i as u32)))
    }
}
