//! Station-pair path table.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use cp_core::{EdgeId, NodeId, PlannerConfig, Position};
use cp_topology::TopologyGraph;

use crate::multigraph::resolve_edges;
use crate::yen::{CollapsedGraph, k_shortest_paths};

// ── PathId / Route ────────────────────────────────────────────────────────────

/// A route between two station nodes, addressed by grid position and rank
/// (0 = cheapest).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathId {
    pub source: Position,
    pub target: Position,
    pub rank:   usize,
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} #{}", self.source, self.target, self.rank)
    }
}

/// A concrete edge sequence through the multigraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub id:           PathId,
    /// Edges to traverse in order, from source to target.
    pub edges:        Vec<EdgeId>,
    /// Sum of the search weights of `edges`.
    pub total_weight: u64,
}

impl Route {
    /// Node sequence visited, including both ends.
    pub fn nodes(&self, graph: &TopologyGraph) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.edges.iter().map(|&e| graph.edge(e).from).collect();
        if let Some(&last) = self.edges.last() {
            nodes.push(graph.edge(last).to);
        }
        nodes
    }

    /// Cells advanced along the route, independent of the search weight.
    pub fn cell_length(&self, graph: &TopologyGraph) -> u64 {
        self.edges.iter().map(|&e| graph.edge(e).length as u64).sum()
    }

    /// Cells occupied in order: the start node, each edge's resource cells
    /// without consecutive repeats, then the end node.
    pub fn cells(&self, graph: &TopologyGraph) -> Vec<Position> {
        let mut cells = vec![self.id.source];
        for &e in &self.edges {
            for &(pos, _) in &graph.edge(e).resources {
                if cells.last() != Some(&pos) {
                    cells.push(pos);
                }
            }
        }
        if cells.last() != Some(&self.id.target) {
            cells.push(self.id.target);
        }
        cells
    }
}

/// Up to `config.k` cheapest routes `from → to`, ranked.
pub fn k_shortest_routes(
    graph:     &TopologyGraph,
    collapsed: &CollapsedGraph,
    from:      NodeId,
    to:        NodeId,
    config:    &PlannerConfig,
) -> Vec<Route> {
    if from == to {
        return Vec::new();
    }
    let node_paths: Vec<Vec<NodeId>> = k_shortest_paths(collapsed, from, to, config.k)
        .into_iter()
        .map(|(_, path)| path)
        .collect();
    let (source, target) = (graph.position(from), graph.position(to));

    resolve_edges(graph, &node_paths, config.weight, config.k)
        .into_iter()
        .enumerate()
        .map(|(rank, (total_weight, edges))| Route {
            id: PathId { source, target, rank },
            edges,
            total_weight,
        })
        .collect()
}

// ── PathTable ─────────────────────────────────────────────────────────────────

/// Ranked routes for every ordered pair of distinct station nodes.
///
/// Pairs with no route are present with an empty list.
#[derive(Clone, Debug, Default)]
pub struct PathTable {
    routes: BTreeMap<(Position, Position), Vec<Route>>,
}

impl PathTable {
    pub fn compute(graph: &TopologyGraph, config: &PlannerConfig) -> Self {
        let collapsed = CollapsedGraph::new(graph, config.weight, config.weight_goal);
        let stations: Vec<NodeId> = graph.station_nodes().collect();
        let pairs: Vec<(NodeId, NodeId)> = stations
            .iter()
            .flat_map(|&a| stations.iter().filter(move |&&b| b != a).map(move |&b| (a, b)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let solved: Vec<Vec<Route>> = pairs
            .iter()
            .map(|&(a, b)| k_shortest_routes(graph, &collapsed, a, b, config))
            .collect();

        #[cfg(feature = "parallel")]
        let solved: Vec<Vec<Route>> = {
            use rayon::prelude::*;
            pairs
                .par_iter()
                .map(|&(a, b)| k_shortest_routes(graph, &collapsed, a, b, config))
                .collect()
        };

        let routes: BTreeMap<_, _> = pairs
            .iter()
            .zip(solved)
            .map(|(&(a, b), r)| ((graph.position(a), graph.position(b)), r))
            .collect();

        debug!(
            pairs = routes.len(),
            routes = routes.values().map(Vec::len).sum::<usize>(),
            k = config.k,
            "path table computed"
        );
        Self { routes }
    }

    /// Ranked routes between two station cells; empty if the pair is unknown
    /// or unreachable.
    pub fn paths_between(&self, source: Position, target: Position) -> &[Route] {
        self.routes.get(&(source, target)).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of [`paths_between`](Self::paths_between), in rank order.
    pub fn path_ids(&self, source: Position, target: Position) -> Vec<PathId> {
        self.paths_between(source, target).iter().map(|r| r.id).collect()
    }

    pub fn route(&self, id: PathId) -> Option<&Route> {
        self.paths_between(id.source, id.target).get(id.rank)
    }

    /// Cells occupied by the route `id`; `None` if there is no such route.
    pub fn path_cells(&self, graph: &TopologyGraph, id: PathId) -> Option<Vec<Position>> {
        self.route(id).map(|r| r.cells(graph))
    }

    /// Number of station pairs.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn route_count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }
}
