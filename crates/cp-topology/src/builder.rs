//! Grid traversal that produces a [`TopologyGraph`].
//!
//! # Algorithm
//!
//! 1. Scan the grid row-major for the first decision point; it seeds the
//!    traversal.
//! 2. From a node, walk each exit cell by cell, turning with the track, until
//!    a decision point (or a cell with no exit for the current heading) is
//!    entered.  That cell is the next node.
//! 3. Each newly discovered node explores every exit except the one leading
//!    back along the edge it was discovered through.  That edge's reverse is
//!    recorded as its mirror instead of being walked again.
//! 4. Every hop counts against a budget of `height * width * depth_factor`.
//!    A topology that exhausts it is rejected.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use cp_core::{Direction, NodeId, PlannerConfig, Position, TransitionGrid};

use crate::graph::{Edge, Node, TopologyGraph};
use crate::{StationRegistry, TopologyError, TopologyResult};

/// Build the graph of `grid` with no stations and the default hop budget.
pub fn build_graph(grid: &TransitionGrid) -> TopologyResult<TopologyGraph> {
    TopologyBuilder::new(grid).build()
}

/// Fluent builder for [`TopologyGraph`].
///
/// ```
/// use cp_core::{Direction::*, Position, TransitionGrid};
/// use cp_topology::{StationRegistry, TopologyBuilder};
///
/// let mut grid = TransitionGrid::new(1, 4);
/// grid.add_dead_end(Position::new(0, 0), East).unwrap();
/// grid.add_track(Position::new(0, 1), West, East).unwrap();
/// grid.add_track(Position::new(0, 2), West, East).unwrap();
/// grid.add_dead_end(Position::new(0, 3), West).unwrap();
///
/// let mut stations = StationRegistry::new();
/// stations.insert(Position::new(0, 0), 0, "A");
/// let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // one track, both directions
/// ```
pub struct TopologyBuilder<'a> {
    grid:         &'a TransitionGrid,
    stations:     Option<&'a StationRegistry>,
    depth_factor: u32,
    max_hops:     Option<u64>,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(grid: &'a TransitionGrid) -> Self {
        Self {
            grid,
            stations: None,
            depth_factor: PlannerConfig::default().depth_factor,
            max_hops: None,
        }
    }

    /// Register stations: their cells become nodes and carry the station id.
    pub fn stations(mut self, stations: &'a StationRegistry) -> Self {
        self.stations = Some(stations);
        self
    }

    /// Hop budget multiplier (`height * width * depth_factor`).
    pub fn depth_factor(mut self, depth_factor: u32) -> Self {
        self.depth_factor = depth_factor;
        self
    }

    /// Absolute hop budget; overrides `depth_factor`.
    pub fn max_hops(mut self, max_hops: u64) -> Self {
        self.max_hops = Some(max_hops);
        self
    }

    /// Traverse the grid.  Fails without a partial result.
    pub fn build(self) -> TopologyResult<TopologyGraph> {
        let grid = self.grid;
        let forced: FxHashSet<Position> = self
            .stations
            .map(|s| s.iter().map(|(p, _)| p).filter(|p| grid.contains(*p)).collect())
            .unwrap_or_default();
        let max_hops = self.max_hops.unwrap_or_else(|| grid.hop_budget(self.depth_factor));

        let mut traversal = Traversal {
            grid,
            forced,
            max_hops,
            hops: 0,
            nodes: Vec::new(),
            node_index: FxHashMap::default(),
            edges: BTreeMap::new(),
            next_rail: 0,
        };

        let seed = grid
            .positions()
            .find(|p| traversal.is_node(*p))
            .ok_or(TopologyError::NoDecisionPoint { height: grid.height(), width: grid.width() })?;
        traversal.explore(seed)?;

        let Traversal { nodes, edges, hops, .. } = traversal;
        let nodes: Vec<Node> = nodes
            .into_iter()
            .map(|position| Node {
                position,
                station: self.stations.and_then(|s| s.get(position)).map(|s| s.id),
            })
            .collect();
        let edges: Vec<Edge> = edges.into_values().collect();

        debug!(nodes = nodes.len(), edges = edges.len(), hops, "topology graph built");
        Ok(TopologyGraph::from_parts(nodes, edges))
    }
}

// ── Traversal internals ───────────────────────────────────────────────────────

/// Result of walking one exit of a node.
struct Walk {
    to:        Position,
    arrival:   Direction,
    resources: Vec<(Position, Direction)>,
}

struct Traversal<'a> {
    grid:       &'a TransitionGrid,
    forced:     FxHashSet<Position>,
    max_hops:   u64,
    hops:       u64,
    nodes:      Vec<Position>,
    node_index: FxHashMap<Position, NodeId>,
    /// Keyed by `(source, exit)`; iteration order is the CSR edge order.
    edges:      BTreeMap<(NodeId, Direction), Edge>,
    next_rail:  u32,
}

impl Traversal<'_> {
    fn is_node(&self, pos: Position) -> bool {
        self.grid.is_decision_point(pos) || self.forced.contains(&pos)
    }

    /// Node id for `pos`, and whether it was newly added.
    fn intern(&mut self, pos: Position) -> (NodeId, bool) {
        if let Some(&id) = self.node_index.get(&pos) {
            return (id, false);
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.node_index.insert(pos, id);
        (id, true)
    }

    fn explore(&mut self, seed: Position) -> TopologyResult<()> {
        let (seed_id, _) = self.intern(seed);
        // (node, exit leading back along its discovery edge)
        let mut stack: Vec<(NodeId, Option<Direction>)> = vec![(seed_id, None)];

        while let Some((node, back)) = stack.pop() {
            let pos = self.nodes[node.index()];
            for exit in self.grid.exits(pos).iter() {
                if Some(exit) == back || self.edges.contains_key(&(node, exit)) {
                    continue;
                }
                let walk = self.walk(pos, exit)?;
                let (to, fresh) = self.intern(walk.to);
                let rail_id = self.next_rail;
                self.next_rail += 1;

                let mirror_key = walk.arrival.opposite();
                if self.grid.exits(walk.to).contains(mirror_key)
                    && !self.edges.contains_key(&(to, mirror_key))
                {
                    let resources = mirror_resources(&walk.resources);
                    self.edges.insert(
                        (to, mirror_key),
                        Edge {
                            from: to,
                            to: node,
                            key: mirror_key,
                            length: resources.len() as u32 - 1,
                            resources,
                            rail_id,
                        },
                    );
                }

                self.edges.insert(
                    (node, exit),
                    Edge {
                        from: node,
                        to,
                        key: exit,
                        length: walk.resources.len() as u32 - 1,
                        resources: walk.resources,
                        rail_id,
                    },
                );

                if fresh {
                    stack.push((to, Some(mirror_key)));
                }
            }
        }
        Ok(())
    }

    /// Follow the track leaving `from` through `exit` up to the next node.
    fn walk(&mut self, from: Position, exit: Direction) -> TopologyResult<Walk> {
        let mut resources = vec![(from, exit)];
        let mut pos = from;
        let mut heading = exit;
        loop {
            let next = self
                .grid
                .step(pos, heading)
                .ok_or(TopologyError::OffGrid { from: pos, heading })?;
            self.hops += 1;
            if self.hops > self.max_hops {
                return Err(TopologyError::DepthExceeded { max_hops: self.max_hops });
            }
            resources.push((next, heading));

            if self.is_node(next) {
                return Ok(Walk { to: next, arrival: heading, resources });
            }
            match self.grid.transitions(next, heading).single() {
                Some(turn) => {
                    pos = next;
                    heading = turn;
                }
                // No way on: the cell is a dead end.
                None => return Ok(Walk { to: next, arrival: heading, resources }),
            }
        }
    }
}

/// Resources of the same track driven in the opposite direction.
///
/// `forward[i]` holds the heading used to *enter* cell `i` (for `i = 0`, the
/// exit heading).  Driving back, cell `i` is entered from cell `i + 1`, so it
/// carries the reverse of `forward[i + 1]`'s heading; the new first cell
/// leaves with the reverse of the arrival heading.
fn mirror_resources(forward: &[(Position, Direction)]) -> Vec<(Position, Direction)> {
    let n = forward.len();
    (0..n)
        .rev()
        .map(|i| {
            let heading = forward[(i + 1).min(n - 1)].1;
            (forward[i].0, heading.opposite())
        })
        .collect()
}
