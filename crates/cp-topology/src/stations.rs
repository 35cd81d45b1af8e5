//! Station registry and station-node snapping.
//!
//! The registry is the environment's list of named stations.  Passing it to
//! the [`TopologyBuilder`](crate::TopologyBuilder) forces every station cell
//! to become a graph node, so routes always start and end on nodes.
//!
//! [`StationIndex`] answers "which station node does this cell belong to?"
//! under a [`StationSnap`] policy.  The nearest-station lookup uses an R-tree
//! (via `rstar`) over station node positions.

use std::collections::BTreeMap;

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;

use cp_core::{NodeId, Position, StationSnap};

use crate::TopologyGraph;

// ── StationRegistry ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Station {
    pub id:   u32,
    pub name: String,
}

/// Stations keyed by grid position.
#[derive(Clone, Debug, Default)]
pub struct StationRegistry {
    stations: BTreeMap<Position, Station>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a station, replacing any previous one at `pos`.
    pub fn insert(&mut self, pos: Position, id: u32, name: impl Into<String>) -> Option<Station> {
        self.stations.insert(pos, Station { id, name: name.into() })
    }

    pub fn get(&self, pos: Position) -> Option<&Station> {
        self.stations.get(&pos)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.stations.contains_key(&pos)
    }

    /// Stations in position order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Station)> {
        self.stations.iter().map(|(p, s)| (*p, s))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct StationEntry {
    point: [f32; 2], // [row, col]
    node:  NodeId,
}

impl RTreeObject for StationEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StationEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dr = self.point[0] - point[0];
        let dc = self.point[1] - point[1];
        dr * dr + dc * dc
    }
}

// ── StationIndex ──────────────────────────────────────────────────────────────

/// Resolves cells to station nodes of one graph.
pub struct StationIndex {
    snap:  StationSnap,
    exact: FxHashMap<Position, NodeId>,
    tree:  RTree<StationEntry>,
}

impl StationIndex {
    /// Index the station nodes of `graph`.
    pub fn new(graph: &TopologyGraph, snap: StationSnap) -> Self {
        let exact: FxHashMap<Position, NodeId> = graph
            .station_nodes()
            .map(|n| (graph.position(n), n))
            .collect();
        let entries = exact
            .iter()
            .map(|(p, &node)| StationEntry { point: [p.row as f32, p.col as f32], node })
            .collect();
        Self { snap, exact, tree: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// The station node `pos` resolves to under the snap policy, if any.
    pub fn resolve(&self, pos: Position) -> Option<NodeId> {
        if let Some(&node) = self.exact.get(&pos) {
            return Some(node);
        }
        match self.snap {
            StationSnap::Exact => None,
            StationSnap::Nearest { max_distance } => {
                let query = [pos.row as f32, pos.col as f32];
                self.tree
                    .nearest_neighbor(&query)
                    .filter(|e| e.distance_2(&query) <= max_distance * max_distance)
                    .map(|e| e.node)
            }
        }
    }
}
