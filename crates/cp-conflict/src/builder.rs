//! Fluent builder for constructing a [`ConflictEngine`].

use cp_core::{PlannerConfig, TransitionGrid};
use cp_routing::PathTable;
use cp_topology::{StationRegistry, TopologyBuilder};

use crate::{AgentSpec, ConflictEngine, ConflictResult};

/// Fluent builder for [`ConflictEngine`].
///
/// # Required inputs
///
/// - [`TransitionGrid`] — the track layout
/// - `Vec<AgentSpec>` — agents in matrix order
///
/// # Optional inputs (have defaults)
///
/// | Method           | Default                        |
/// |------------------|--------------------------------|
/// | `.stations(r)`   | No stations: every agent stays unassigned |
/// | `.config(c)`     | `PlannerConfig::default()`     |
///
/// # Example
///
/// ```rust,ignore
/// let mut engine = EngineBuilder::new(&grid, agents)
///     .stations(&stations)
///     .config(PlannerConfig { k: 3, ..PlannerConfig::default() })
///     .build()?;
/// let matrix = engine.conflict_matrix()?;
/// ```
pub struct EngineBuilder<'a> {
    grid:     &'a TransitionGrid,
    agents:   Vec<AgentSpec>,
    stations: Option<&'a StationRegistry>,
    config:   PlannerConfig,
}

impl<'a> EngineBuilder<'a> {
    pub fn new(grid: &'a TransitionGrid, agents: Vec<AgentSpec>) -> Self {
        Self { grid, agents, stations: None, config: PlannerConfig::default() }
    }

    pub fn stations(mut self, stations: &'a StationRegistry) -> Self {
        self.stations = Some(stations);
        self
    }

    pub fn config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration, build the graph and path table, and place
    /// the agents.
    pub fn build(self) -> ConflictResult<ConflictEngine> {
        self.config.validate()?;

        let mut topology = TopologyBuilder::new(self.grid).depth_factor(self.config.depth_factor);
        if let Some(stations) = self.stations {
            topology = topology.stations(stations);
        }
        let graph = topology.build()?;
        let paths = PathTable::compute(&graph, &self.config);

        ConflictEngine::new(graph, paths, self.agents, self.config)
    }
}
