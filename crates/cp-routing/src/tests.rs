//! Unit tests for cp-routing.

#[cfg(test)]
mod fixtures {
    use cp_core::{Direction::*, Position, TransitionGrid};
    use cp_topology::{StationRegistry, TopologyBuilder, TopologyGraph};

    fn horizontal(grid: &mut TransitionGrid, row: u32, from_col: u32, to_col: u32) {
        for col in from_col..=to_col {
            grid.add_track(Position::new(row, col), West, East).unwrap();
        }
    }

    pub fn bypass(grid: &mut TransitionGrid, row: u32, a: u32, b: u32) {
        grid.add_track(Position::new(row, a), West, North).unwrap();
        grid.add_track(Position::new(row - 1, a), South, East).unwrap();
        horizontal(grid, row - 1, a + 1, b - 1);
        grid.add_track(Position::new(row - 1, b), West, South).unwrap();
        grid.add_track(Position::new(row, b), North, East).unwrap();
    }

    /// Main line between A (1,0) and B (1, width-1) on row 1, dead ends at
    /// both ends.
    pub fn main_line(width: u32) -> TransitionGrid {
        let mut grid = TransitionGrid::new(2, width);
        grid.add_dead_end(Position::new(1, 0), East).unwrap();
        horizontal(&mut grid, 1, 1, width - 2);
        grid.add_dead_end(Position::new(1, width - 1), West).unwrap();
        grid
    }

    pub fn end_stations(width: u32) -> StationRegistry {
        let mut stations = StationRegistry::new();
        stations.insert(Position::new(1, 0), 0, "A");
        stations.insert(Position::new(1, width - 1), 1, "B");
        stations
    }

    /// A ─ S1 ═ S2 ─ B with the main segment 4 cells and the bypass 6.
    pub fn avoidance() -> TopologyGraph {
        let mut grid = main_line(9);
        bypass(&mut grid, 1, 2, 6);
        TopologyBuilder::new(&grid).stations(&end_stations(9)).build().unwrap()
    }

    /// As [`avoidance`], with an extra halt at (0,4) splitting the bypass so
    /// the two routes differ in their node sequence.
    pub fn avoidance_with_halt() -> TopologyGraph {
        let mut grid = main_line(9);
        bypass(&mut grid, 1, 2, 6);
        let mut stations = end_stations(9);
        stations.insert(Position::new(0, 4), 2, "Halt");
        TopologyBuilder::new(&grid).stations(&stations).build().unwrap()
    }

    pub const A: Position = Position { row: 1, col: 0 };
    pub const B: Position = Position { row: 1, col: 8 };
}

// ── Yen ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod yen {
    use cp_core::{EdgeWeight, Position, WeightGoal};

    use super::fixtures::{self, A, B};
    use crate::{CollapsedGraph, k_shortest_paths, shortest_path};

    #[test]
    fn collapse_keeps_extremal_parallel_weight() {
        let graph = fixtures::avoidance();
        let s1 = graph.node_at(Position::new(1, 2)).unwrap();
        let s2 = graph.node_at(Position::new(1, 6)).unwrap();

        let min = CollapsedGraph::new(&graph, EdgeWeight::Length, WeightGoal::Min);
        let max = CollapsedGraph::new(&graph, EdgeWeight::Length, WeightGoal::Max);
        let unit = CollapsedGraph::new(&graph, EdgeWeight::Unit, WeightGoal::Min);
        assert_eq!(min.weight(s1, s2), Some(4));
        assert_eq!(max.weight(s1, s2), Some(6));
        assert_eq!(unit.weight(s1, s2), Some(1));
        assert_eq!(min.weight(s1, s1), None);
    }

    #[test]
    fn shortest_path_on_main_line() {
        let graph = fixtures::avoidance();
        let g = CollapsedGraph::new(&graph, EdgeWeight::Length, WeightGoal::Min);
        let (a, b) = (graph.node_at(A).unwrap(), graph.node_at(B).unwrap());
        let (cost, path) = shortest_path(&g, a, b).unwrap();
        assert_eq!(cost, 8);
        assert_eq!(path.len(), 4);
        assert_eq!((path[0], path[3]), (a, b));
    }

    #[test]
    fn parallel_edges_give_one_node_path() {
        let graph = fixtures::avoidance();
        let g = CollapsedGraph::new(&graph, EdgeWeight::Length, WeightGoal::Min);
        let (a, b) = (graph.node_at(A).unwrap(), graph.node_at(B).unwrap());
        assert_eq!(k_shortest_paths(&g, a, b, 4).len(), 1);
    }

    #[test]
    fn distinct_node_paths_in_cost_order() {
        let graph = fixtures::avoidance_with_halt();
        let g = CollapsedGraph::new(&graph, EdgeWeight::Length, WeightGoal::Min);
        let (a, b) = (graph.node_at(A).unwrap(), graph.node_at(B).unwrap());
        let halt = graph.node_at(Position::new(0, 4)).unwrap();

        let paths = k_shortest_paths(&g, a, b, 4);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].0, 8);
        assert_eq!(paths[1].0, 10);
        assert!(!paths[0].1.contains(&halt));
        assert!(paths[1].1.contains(&halt));
    }

    #[test]
    fn k_bounds_result() {
        let graph = fixtures::avoidance_with_halt();
        let g = CollapsedGraph::new(&graph, EdgeWeight::Length, WeightGoal::Min);
        let (a, b) = (graph.node_at(A).unwrap(), graph.node_at(B).unwrap());
        assert_eq!(k_shortest_paths(&g, a, b, 1).len(), 1);
        assert!(k_shortest_paths(&g, a, b, 0).is_empty());
    }
}

// ── Path table ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod table {
    use cp_core::{EdgeWeight, PlannerConfig, Position};

    use super::fixtures::{self, A, B};
    use crate::{PathId, PathTable};

    #[test]
    fn avoidance_ranks() {
        let graph = fixtures::avoidance();
        let table = PathTable::compute(&graph, &PlannerConfig::default());
        assert_eq!(table.len(), 2);

        let routes = table.paths_between(A, B);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].total_weight, 8);
        assert_eq!(routes[1].total_weight, 10);
        assert_eq!(routes[0].id, PathId { source: A, target: B, rank: 0 });
        assert_eq!(routes[1].id.rank, 1);

        let back = table.paths_between(B, A);
        assert_eq!(back.iter().map(|r| r.total_weight).collect::<Vec<_>>(), vec![8, 10]);
    }

    #[test]
    fn route_lookup_by_id() {
        let graph = fixtures::avoidance();
        let table = PathTable::compute(&graph, &PlannerConfig::default());
        let ids = table.path_ids(A, B);
        for id in ids {
            assert_eq!(table.route(id).unwrap().id, id);
        }
        assert!(table.route(PathId { source: A, target: B, rank: 2 }).is_none());
    }

    #[test]
    fn path_cells_start_and_end_on_stations() {
        let graph = fixtures::avoidance();
        let table = PathTable::compute(&graph, &PlannerConfig::default());

        let main = table.path_cells(&graph, PathId { source: A, target: B, rank: 0 }).unwrap();
        let expected: Vec<Position> = (0..=8).map(|c| Position::new(1, c)).collect();
        assert_eq!(main, expected);

        let detour = table.path_cells(&graph, PathId { source: A, target: B, rank: 1 }).unwrap();
        assert_eq!(detour.len(), 11);
        assert_eq!(detour.first(), Some(&A));
        assert_eq!(detour.last(), Some(&B));
        assert!(detour.contains(&Position::new(0, 4)));
        assert!(detour.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn unit_weight_ties_break_on_edge_order() {
        let graph = fixtures::avoidance();
        let config = PlannerConfig { weight: EdgeWeight::Unit, ..PlannerConfig::default() };
        let table = PathTable::compute(&graph, &config);
        let routes = table.paths_between(A, B);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].total_weight, 3);
        assert_eq!(routes[1].total_weight, 3);
        // The bypass leaves S1 northwards; North sorts before East.
        assert_eq!(routes[0].cell_length(&graph), 10);
        assert_eq!(routes[1].cell_length(&graph), 8);
    }

    #[test]
    fn k_limits_routes_per_pair() {
        let graph = fixtures::avoidance();
        let config = PlannerConfig { k: 1, ..PlannerConfig::default() };
        let table = PathTable::compute(&graph, &config);
        assert_eq!(table.paths_between(A, B).len(), 1);
        assert_eq!(table.route_count(), 2);
    }

    #[test]
    fn unknown_pair_is_empty() {
        let graph = fixtures::avoidance();
        let table = PathTable::compute(&graph, &PlannerConfig::default());
        assert!(table.paths_between(A, Position::new(1, 4)).is_empty());
        assert!(table.paths_between(A, A).is_empty());
        assert!(table.path_ids(Position::new(0, 0), B).is_empty());
    }

    #[test]
    fn route_nodes_are_contiguous() {
        let graph = fixtures::avoidance_with_halt();
        let table = PathTable::compute(&graph, &PlannerConfig::default());
        // A, B, Halt: six ordered pairs.
        assert_eq!(table.len(), 6);
        for route in table.paths_between(A, B) {
            let nodes = route.nodes(&graph);
            assert_eq!(nodes.len(), route.edges.len() + 1);
            assert_eq!(graph.position(nodes[0]), A);
            assert_eq!(graph.position(*nodes.last().unwrap()), B);
        }
    }
}

// ── Randomized ladders ────────────────────────────────────────────────────────

#[cfg(test)]
mod ladders {
    use std::collections::BTreeSet;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use cp_core::{PlannerConfig, Position};
    use cp_topology::TopologyBuilder;

    use super::fixtures;
    use crate::PathTable;

    #[test]
    fn routes_non_decreasing_and_loopless() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..100 {
            let width = rng.gen_range(8..24u32);
            let mut grid = fixtures::main_line(width);
            let mut col = 1;
            while col + 4 <= width {
                let a = rng.gen_range(col..=width - 4);
                let b = a + rng.gen_range(2..=3u32);
                if b > width - 2 {
                    break;
                }
                fixtures::bypass(&mut grid, 1, a, b);
                col = b + 1;
            }
            let graph = TopologyBuilder::new(&grid)
                .stations(&fixtures::end_stations(width))
                .build()
                .unwrap();

            let k = rng.gen_range(1..6usize);
            let config = PlannerConfig { k, ..PlannerConfig::default() };
            let table = PathTable::compute(&graph, &config);
            let (a, b) = (Position::new(1, 0), Position::new(1, width - 1));

            let routes = table.paths_between(a, b);
            assert!(!routes.is_empty());
            assert!(routes.len() <= k);
            assert!(routes.windows(2).all(|w| w[0].total_weight <= w[1].total_weight));
            assert_eq!(routes[0].total_weight, (width - 1) as u64);
            for (rank, route) in routes.iter().enumerate() {
                assert_eq!(route.id.rank, rank);
                let nodes = route.nodes(&graph);
                let unique: BTreeSet<_> = nodes.iter().collect();
                assert_eq!(unique.len(), nodes.len(), "route revisits a node");
                for pair in route.edges.windows(2) {
                    assert_eq!(graph.edge(pair[0]).to, graph.edge(pair[1]).from);
                }
            }
        }
    }
}
