//! Unit tests for cp-topology.
//!
//! All tests use hand-built grids so they run without scenario files.

#[cfg(test)]
pub(crate) mod helpers {
    use cp_core::{Direction::*, Position, TransitionGrid};

    use crate::StationRegistry;

    /// Lay a straight east-west track on `row` from `from_col` to `to_col`
    /// inclusive.
    pub fn horizontal(grid: &mut TransitionGrid, row: u32, from_col: u32, to_col: u32) {
        for col in from_col..=to_col {
            grid.add_track(Position::new(row, col), West, East).unwrap();
        }
    }

    /// Lay a bypass loop above `row` leaving the main line at `a` and
    /// rejoining at `b` (`b - a >= 2`).
    pub fn bypass(grid: &mut TransitionGrid, row: u32, a: u32, b: u32) {
        grid.add_track(Position::new(row, a), West, North).unwrap();
        grid.add_track(Position::new(row - 1, a), South, East).unwrap();
        horizontal(grid, row - 1, a + 1, b - 1);
        grid.add_track(Position::new(row - 1, b), West, South).unwrap();
        grid.add_track(Position::new(row, b), North, East).unwrap();
    }

    /// Main line on row 1 between dead-end stations A (1,0) and B (1,8), with
    /// a bypass over columns 2..=6:
    ///
    /// ```text
    ///     . . ┌ ─ ─ ─ ┐ . .
    ///     A ─ ┴ ─ ─ ─ ┴ ─ B
    /// ```
    ///
    /// Main route A→B is 2 + 4 + 2 = 8 cells; via the bypass 2 + 6 + 2 = 10.
    pub fn avoidance_grid() -> (TransitionGrid, StationRegistry) {
        let mut grid = TransitionGrid::new(2, 9);
        grid.add_dead_end(Position::new(1, 0), East).unwrap();
        horizontal(&mut grid, 1, 1, 7);
        bypass(&mut grid, 1, 2, 6);
        grid.add_dead_end(Position::new(1, 8), West).unwrap();

        let mut stations = StationRegistry::new();
        stations.insert(Position::new(1, 0), 0, "A");
        stations.insert(Position::new(1, 8), 1, "B");
        (grid, stations)
    }

    /// Single track of `len` cells between two dead ends on row 0.
    pub fn line_grid(len: u32) -> TransitionGrid {
        let mut grid = TransitionGrid::new(1, len);
        grid.add_dead_end(Position::new(0, 0), East).unwrap();
        horizontal(&mut grid, 0, 1, len - 2);
        grid.add_dead_end(Position::new(0, len - 1), West).unwrap();
        grid
    }
}

// ── Graph structure ───────────────────────────────────────────────────────────

#[cfg(test)]
mod structure {
    use std::collections::BTreeSet;

    use cp_core::{Direction, Position};

    use crate::{Location, TopologyBuilder};

    #[test]
    fn avoidance_nodes_and_edges() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();

        assert_eq!(graph.node_count(), 4);
        // Three main-line tracks plus the bypass, each in both directions.
        assert_eq!(graph.edge_count(), 8);
        for pos in [(1, 0), (1, 2), (1, 6), (1, 8)] {
            assert!(graph.node_at(pos.into()).is_some(), "missing node {pos:?}");
        }
    }

    #[test]
    fn parallel_edges_are_keyed_by_exit() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();
        let s1 = graph.node_at(Position::new(1, 2)).unwrap();
        let s2 = graph.node_at(Position::new(1, 6)).unwrap();

        let parallel: Vec<_> = graph.edges_between(s1, s2).map(|e| graph.edge(e)).collect();
        assert_eq!(parallel.len(), 2);
        assert_eq!(parallel[0].key, Direction::North);
        assert_eq!(parallel[0].length, 6);
        assert_eq!(parallel[1].key, Direction::East);
        assert_eq!(parallel[1].length, 4);
    }

    #[test]
    fn resources_follow_the_track() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();
        let s1 = graph.node_at(Position::new(1, 2)).unwrap();
        let s2 = graph.node_at(Position::new(1, 6)).unwrap();
        let up = graph
            .edges_between(s1, s2)
            .map(|e| graph.edge(e))
            .find(|e| e.key == Direction::North)
            .unwrap();

        let cells: Vec<Position> = up.resources.iter().map(|&(p, _)| p).collect();
        let expected: Vec<Position> = [(1, 2), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (1, 6)]
            .into_iter()
            .map(Position::from)
            .collect();
        assert_eq!(cells, expected);
        assert_eq!(up.arrival_heading(), Direction::South);
        assert_eq!(up.length as usize, up.resources.len() - 1);
    }

    #[test]
    fn mirror_edges_share_rail_and_cells() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();

        for (i, e) in graph.edges.iter().enumerate() {
            let mirror = graph
                .edges
                .iter()
                .enumerate()
                .find(|(j, m)| *j != i && m.rail_id == e.rail_id)
                .map(|(_, m)| m)
                .unwrap_or_else(|| panic!("edge {i} has no mirror"));
            assert_eq!((mirror.from, mirror.to), (e.to, e.from));
            assert_eq!(mirror.key, e.arrival_heading().opposite());
            let a: BTreeSet<_> = e.resources.iter().map(|r| r.0).collect();
            let b: BTreeSet<_> = mirror.resources.iter().map(|r| r.0).collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn station_ids_attached_to_nodes() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();
        let stations: Vec<_> = graph.station_nodes().map(|n| graph.node(n).station).collect();
        assert_eq!(stations.len(), 2);
        assert!(stations.contains(&Some(0)));
        assert!(stations.contains(&Some(1)));
    }

    #[test]
    fn station_on_plain_track_splits_edge() {
        let grid = super::helpers::line_grid(5);
        let mut stations = crate::StationRegistry::new();
        stations.insert(Position::new(0, 2), 9, "Halt");
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 4);
        let halt = graph.node_at(Position::new(0, 2)).unwrap();
        assert_eq!(graph.node(halt).station, Some(9));
        assert_eq!(graph.out_degree(halt), 2);
    }

    #[test]
    fn diamond_crossing_has_four_exits() {
        use cp_core::{Direction::*, TransitionGrid};
        let mut grid = TransitionGrid::new(3, 3);
        let x = Position::new(1, 1);
        grid.add_track(x, West, East).unwrap();
        grid.add_track(x, North, South).unwrap();
        grid.add_dead_end(Position::new(1, 0), East).unwrap();
        grid.add_dead_end(Position::new(1, 2), West).unwrap();
        grid.add_dead_end(Position::new(0, 1), South).unwrap();
        grid.add_dead_end(Position::new(2, 1), North).unwrap();

        let graph = crate::build_graph(&grid).unwrap();
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 8);
        let cross = graph.node_at(x).unwrap();
        assert_eq!(graph.out_degree(cross), 4);
    }

    #[test]
    fn locate_nodes_edges_and_strays() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();
        assert!(matches!(graph.locate(Position::new(1, 2)), Some(Location::Node(_))));
        match graph.locate(Position::new(1, 4)) {
            Some(Location::Edge(e)) => {
                assert!(graph.edge(e).resources.iter().any(|r| r.0 == Position::new(1, 4)));
            }
            other => panic!("expected an edge, got {other:?}"),
        }
        assert!(graph.locate(Position::new(0, 0)).is_none());
    }

    #[test]
    fn csr_out_edges_match_sources() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();
        let mut total = 0;
        for n in 0..graph.node_count() {
            let node = cp_core::NodeId(n as u32);
            for e in graph.out_edges(node) {
                assert_eq!(graph.edge(e).from, node);
                total += 1;
            }
        }
        assert_eq!(total, graph.edge_count());
    }
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod failures {
    use cp_core::{Direction::*, Position, TransitionGrid};

    use crate::{TopologyBuilder, TopologyError, build_graph};

    #[test]
    fn empty_grid_has_no_seed() {
        let grid = TransitionGrid::new(3, 3);
        assert!(matches!(build_graph(&grid), Err(TopologyError::NoDecisionPoint { .. })));
    }

    #[test]
    fn loop_without_switches_has_no_seed() {
        let mut grid = TransitionGrid::new(2, 2);
        grid.add_track(Position::new(0, 0), South, East).unwrap();
        grid.add_track(Position::new(0, 1), West, South).unwrap();
        grid.add_track(Position::new(1, 1), North, West).unwrap();
        grid.add_track(Position::new(1, 0), East, North).unwrap();
        assert!(matches!(build_graph(&grid), Err(TopologyError::NoDecisionPoint { .. })));
    }

    #[test]
    fn hop_budget_is_enforced() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let result = TopologyBuilder::new(&grid).stations(&stations).max_hops(3).build();
        assert!(matches!(result, Err(TopologyError::DepthExceeded { max_hops: 3 })));
    }

    #[test]
    fn depth_factor_scales_grid_budget() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let result = TopologyBuilder::new(&grid).stations(&stations).depth_factor(0).build();
        assert!(matches!(
            result,
            Err(TopologyError::DepthExceeded { max_hops }) if max_hops == grid.hop_budget(0)
        ));
        assert_eq!(grid.hop_budget(10), 180);
        assert!(TopologyBuilder::new(&grid).stations(&stations).depth_factor(10).build().is_ok());
    }

    #[test]
    fn track_leaving_grid_is_rejected() {
        let mut grid = TransitionGrid::new(1, 2);
        grid.add_track(Position::new(0, 0), West, East).unwrap();
        grid.add_dead_end(Position::new(0, 1), West).unwrap();
        assert!(matches!(build_graph(&grid), Err(TopologyError::OffGrid { .. })));
    }
}

// ── Randomized ladders ────────────────────────────────────────────────────────

#[cfg(test)]
mod ladders {
    use std::collections::BTreeSet;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use cp_core::{Direction::*, Position, TransitionGrid};

    use crate::build_graph;

    /// Main line on row 1 with `spans` bypasses; returns the grid and the
    /// number of bypasses laid.
    fn random_ladder(rng: &mut SmallRng) -> (TransitionGrid, usize) {
        let width = rng.gen_range(6..24u32);
        let mut grid = TransitionGrid::new(2, width);
        grid.add_dead_end(Position::new(1, 0), East).unwrap();
        super::helpers::horizontal(&mut grid, 1, 1, width - 2);
        grid.add_dead_end(Position::new(1, width - 1), West).unwrap();

        let mut laid = 0;
        let mut col = 1;
        while col + 2 <= width - 2 {
            let a = rng.gen_range(col..=width - 4);
            let b = a + rng.gen_range(2..=3u32);
            if b > width - 2 {
                break;
            }
            super::helpers::bypass(&mut grid, 1, a, b);
            laid += 1;
            col = b + 1;
        }
        (grid, laid)
    }

    #[test]
    fn every_node_once_every_edge_nonempty() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let (grid, bypasses) = random_ladder(&mut rng);
            let graph = build_graph(&grid).unwrap();

            let positions: BTreeSet<_> = graph.nodes.iter().map(|n| n.position).collect();
            assert_eq!(positions.len(), graph.node_count(), "duplicate node");
            assert_eq!(graph.node_count(), 2 + 2 * bypasses);
            assert_eq!(graph.edge_count(), 2 + 6 * bypasses);

            for e in &graph.edges {
                assert!(!e.resources.is_empty());
                assert!(e.length >= 1);
                assert_eq!(e.resources.first().unwrap().0, graph.position(e.from));
                assert_eq!(e.resources.last().unwrap().0, graph.position(e.to));
            }
        }
    }
}

// ── Station snapping ──────────────────────────────────────────────────────────

#[cfg(test)]
mod snapping {
    use cp_core::{Position, StationSnap};

    use crate::{StationIndex, TopologyBuilder};

    #[test]
    fn exact_policy_only_matches_station_cells() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();
        let index = StationIndex::new(&graph, StationSnap::Exact);
        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve(Position::new(1, 0)), graph.node_at(Position::new(1, 0)));
        assert_eq!(index.resolve(Position::new(1, 1)), None);
        // A switch node is not a station.
        assert_eq!(index.resolve(Position::new(1, 2)), None);
    }

    #[test]
    fn nearest_policy_respects_tolerance() {
        let (grid, stations) = super::helpers::avoidance_grid();
        let graph = TopologyBuilder::new(&grid).stations(&stations).build().unwrap();
        let index = StationIndex::new(&graph, StationSnap::Nearest { max_distance: 1.5 });
        assert_eq!(index.resolve(Position::new(1, 1)), graph.node_at(Position::new(1, 0)));
        assert_eq!(index.resolve(Position::new(0, 7)), graph.node_at(Position::new(1, 8)));
        assert_eq!(index.resolve(Position::new(1, 4)), None);
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};

    use cp_core::Position;

    use crate::{TopologyError, load_stations_csv, load_stations_reader};

    const CSV: &str = "\
row,col,station_id,name\n\
1,0,0,Westgate\n\
1,8,1,Eastfield\n\
";

    #[test]
    fn parses_rows() {
        let reg = load_stations_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(reg.len(), 2);
        let s = reg.get(Position::new(1, 8)).unwrap();
        assert_eq!(s.id, 1);
        assert_eq!(s.name, "Eastfield");
    }

    #[test]
    fn duplicate_cell_rejected() {
        let csv = format!("{CSV}1,0,2,Again\n");
        assert!(matches!(
            load_stations_reader(Cursor::new(csv)),
            Err(TopologyError::Parse(_))
        ));
    }

    #[test]
    fn malformed_row_rejected() {
        let csv = "row,col,station_id,name\nx,0,0,A\n";
        assert!(matches!(
            load_stations_reader(Cursor::new(csv)),
            Err(TopologyError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let reg = load_stations_csv(file.path()).unwrap();
        assert!(reg.contains(Position::new(1, 0)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_stations_csv(std::path::Path::new("/nonexistent/stations.csv")).unwrap_err();
        assert!(matches!(err, TopologyError::Io(_)));
    }
}
