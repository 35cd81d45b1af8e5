//! The conflict engine: route assignment, schedules, and evaluation.
//!
//! # Agent lifecycle
//!
//! ```text
//! Unassigned ──(stations resolve, route exists)──▶ Assigned ──(evaluate)──▶ Scheduled
//!                                                     ▲                         │
//!                                                     └──(rank / delay change)──┘
//! ```
//!
//! All mutable state lives in one [`EngineState`] value so that previews can
//! snapshot and restore it wholesale.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use cp_core::{AgentHandle, EdgeId, NodeId, PlannerConfig, Position};
use cp_routing::{PathId, PathTable};
use cp_topology::{Location, StationIndex, TopologyGraph};

use crate::detect::{Conflict, ConflictMatrix, overlapping};
use crate::schedule::{ScheduleEntry, build_schedule};
use crate::{AgentSpec, ConflictError, ConflictResult};

/// Path rank per agent.
pub type RouteOverrides = BTreeMap<AgentHandle, usize>;
/// Delay (time steps) per agent; non-positive values clear the delay.
pub type DelayOverrides = BTreeMap<AgentHandle, f64>;

// ── AgentPlan / AgentState ────────────────────────────────────────────────────

/// The route currently assigned to one agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentPlan {
    pub path_id:       PathId,
    /// Every route of the agent's station pair, in rank order.
    pub available:     Vec<PathId>,
    pub selected_rank: usize,
    pub edges:         Vec<EdgeId>,
    pub start:         NodeId,
    pub target:        NodeId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AgentState {
    /// No station pair or no route.
    Unassigned,
    /// Has a route; schedule not yet computed.
    Assigned,
    /// Has a route and a resource-time schedule.
    Scheduled,
}

// ── EngineState ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
struct EngineState {
    plans:     BTreeMap<AgentHandle, AgentPlan>,
    schedules: BTreeMap<AgentHandle, Vec<ScheduleEntry>>,
    selection: BTreeMap<AgentHandle, usize>,
    delays:    BTreeMap<AgentHandle, f64>,
    conflicts: Vec<Conflict>,
    matrix:    ConflictMatrix,
}

impl EngineState {
    fn apply_delay(&mut self, handle: AgentHandle, steps: f64) {
        let delay = steps.max(0.0);
        if delay > 0.0 {
            self.delays.insert(handle, delay);
        } else {
            self.delays.remove(&handle);
        }
        self.schedules.remove(&handle);
    }

    fn apply_rank(&mut self, handle: AgentHandle, rank: usize) {
        self.selection.insert(handle, rank);
        self.schedules.remove(&handle);
    }
}

// ── ConflictEngine ────────────────────────────────────────────────────────────

pub struct ConflictEngine {
    graph:    TopologyGraph,
    paths:    PathTable,
    stations: StationIndex,
    config:   PlannerConfig,
    /// In supply order; matrix rows follow this order.
    agents:   Vec<AgentSpec>,
    index:    FxHashMap<AgentHandle, usize>,
    state:    EngineState,
}

impl ConflictEngine {
    /// Assemble an engine from prebuilt parts.  See
    /// [`EngineBuilder`](crate::EngineBuilder) for the usual path.
    ///
    /// Station nodes are indexed under `config.station_snap`.  Fails if the
    /// configuration is invalid, a handle repeats, or an agent stands on a
    /// cell that is not part of the graph.
    pub fn new(
        graph:  TopologyGraph,
        paths:  PathTable,
        agents: Vec<AgentSpec>,
        config: PlannerConfig,
    ) -> ConflictResult<Self> {
        config.validate()?;
        let index = index_agents(&agents)?;
        for agent in &agents {
            locate_agent(&graph, agent)?;
        }
        let stations = StationIndex::new(&graph, config.station_snap);

        let mut engine = Self {
            graph,
            paths,
            stations,
            config,
            agents,
            index,
            state: EngineState::default(),
        };
        engine.state.matrix = ConflictMatrix::new(engine.agents.len());
        engine.plan_all();
        debug!(
            agents = engine.agents.len(),
            assigned = engine.state.plans.len(),
            "conflict engine ready"
        );
        Ok(engine)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn agents(&self) -> &[AgentSpec] {
        &self.agents
    }

    pub fn agent(&self, handle: AgentHandle) -> ConflictResult<&AgentSpec> {
        self.slot(handle).map(|i| &self.agents[i])
    }

    /// Row of `handle` in the conflict matrix.
    pub fn agent_index(&self, handle: AgentHandle) -> Option<usize> {
        self.index.get(&handle).copied()
    }

    pub fn plan(&self, handle: AgentHandle) -> Option<&AgentPlan> {
        self.state.plans.get(&handle)
    }

    pub fn schedule(&self, handle: AgentHandle) -> Option<&[ScheduleEntry]> {
        self.state.schedules.get(&handle).map(Vec::as_slice)
    }

    pub fn agent_state(&self, handle: AgentHandle) -> ConflictResult<AgentState> {
        self.slot(handle)?;
        Ok(if self.state.schedules.contains_key(&handle) {
            AgentState::Scheduled
        } else if self.state.plans.contains_key(&handle) {
            AgentState::Assigned
        } else {
            AgentState::Unassigned
        })
    }

    /// Node or edge the agent currently stands on; `None` before it has a
    /// position.
    pub fn agent_location(&self, handle: AgentHandle) -> ConflictResult<Option<Location>> {
        locate_agent(&self.graph, self.agent(handle)?)
    }

    // ── Paths ─────────────────────────────────────────────────────────────

    /// Routes of the agent's station pair.  Empty when its stations do not
    /// resolve or no route connects them.
    pub fn available_paths(&self, handle: AgentHandle) -> ConflictResult<Vec<PathId>> {
        let agent = self.agent(handle)?;
        Ok(self.available_for(agent))
    }

    /// Cells of route `id`; empty for an unknown id.
    pub fn path_cells(&self, id: PathId) -> Vec<Position> {
        self.paths.path_cells(&self.graph, id).unwrap_or_default()
    }

    /// Cells of the agent's assigned route; empty when unassigned.
    pub fn agent_cell_path(&self, handle: AgentHandle) -> ConflictResult<Vec<Position>> {
        self.slot(handle)?;
        Ok(self
            .state
            .plans
            .get(&handle)
            .map(|p| self.path_cells(p.path_id))
            .unwrap_or_default())
    }

    pub fn select_agent_path(&mut self, handle: AgentHandle, rank: usize) -> ConflictResult<()> {
        let slot = self.slot(handle)?;
        self.check_rank(handle, rank)?;
        self.state.apply_rank(handle, rank);
        self.replan(slot);
        Ok(())
    }

    /// Selected rank; 0 when never selected.
    pub fn current_path_rank(&self, handle: AgentHandle) -> ConflictResult<usize> {
        self.slot(handle)?;
        Ok(self
            .state
            .plans
            .get(&handle)
            .map(|p| p.selected_rank)
            .or_else(|| self.state.selection.get(&handle).copied())
            .unwrap_or(0))
    }

    // ── Delays ────────────────────────────────────────────────────────────

    /// Hold the agent `steps` past its earliest departure.  Negative values
    /// clamp to 0, and 0 clears the delay.
    pub fn set_agent_delay(&mut self, handle: AgentHandle, steps: f64) -> ConflictResult<()> {
        self.slot(handle)?;
        self.state.apply_delay(handle, steps);
        Ok(())
    }

    pub fn clear_agent_delay(&mut self, handle: AgentHandle) -> ConflictResult<()> {
        self.slot(handle)?;
        if self.state.delays.remove(&handle).is_some() {
            self.state.schedules.remove(&handle);
        }
        Ok(())
    }

    pub fn agent_delay(&self, handle: AgentHandle) -> ConflictResult<f64> {
        self.slot(handle)?;
        Ok(self.state.delays.get(&handle).copied().unwrap_or(0.0))
    }

    /// Earliest departure plus any delay.
    pub fn departure_time(&self, handle: AgentHandle) -> ConflictResult<f64> {
        Ok(self.departure(self.agent(handle)?))
    }

    // ── Evaluation ────────────────────────────────────────────────────────

    /// Re-plan, schedule every assigned agent, and detect conflicts.
    pub fn conflict_matrix(&mut self) -> ConflictResult<ConflictMatrix> {
        self.evaluate()?;
        Ok(self.state.matrix.clone())
    }

    /// Conflicts found by the last evaluation.
    pub fn detected_conflicts(&self) -> &[Conflict] {
        &self.state.conflicts
    }

    /// Evaluate with temporary overrides and restore every piece of engine
    /// state before returning.  Invalid handles or ranks fail before anything
    /// is touched.
    pub fn evaluate_selection(
        &mut self,
        routes: &RouteOverrides,
        delays: &DelayOverrides,
    ) -> ConflictResult<(ConflictMatrix, Vec<Conflict>)> {
        self.validate_overrides(routes, delays)?;
        let saved = self.state.clone();

        self.apply_overrides(routes, delays);
        let result = self
            .evaluate()
            .map(|()| (self.state.matrix.clone(), self.state.conflicts.clone()));

        self.state = saved;
        if let Ok((_, conflicts)) = &result {
            trace!(routes = routes.len(), delays = delays.len(), conflicts = conflicts.len(), "preview");
        }
        result
    }

    /// Commit overrides.  Schedules of the touched agents are dropped; call
    /// [`conflict_matrix`](Self::conflict_matrix) to re-evaluate.
    pub fn apply_selection(
        &mut self,
        routes: &RouteOverrides,
        delays: &DelayOverrides,
    ) -> ConflictResult<()> {
        self.validate_overrides(routes, delays)?;
        self.apply_overrides(routes, delays);
        self.plan_all();
        Ok(())
    }

    // ── Live state ────────────────────────────────────────────────────────

    /// Replace the agent list with a fresh environment snapshot.
    ///
    /// Every agent's position must lie on the graph; otherwise nothing
    /// changes.  Selections and delays of agents still present are kept,
    /// all schedules are dropped.
    pub fn update_agents(&mut self, agents: Vec<AgentSpec>) -> ConflictResult<()> {
        let index = index_agents(&agents)?;
        for agent in &agents {
            locate_agent(&self.graph, agent)?;
        }

        self.agents = agents;
        self.index = index;
        let index = &self.index;
        let state = &mut self.state;
        state.plans.retain(|h, _| index.contains_key(h));
        state.selection.retain(|h, _| index.contains_key(h));
        state.delays.retain(|h, _| index.contains_key(h));
        state.schedules.clear();
        state.conflicts.clear();
        state.matrix = ConflictMatrix::new(self.agents.len());

        self.plan_all();
        debug!(agents = self.agents.len(), assigned = self.state.plans.len(), "agents updated");
        Ok(())
    }

    /// Swap in a rebuilt topology (e.g. after an environment reset).
    ///
    /// Agents must map onto the new graph.  Plans and schedules are rebuilt;
    /// selections carry over and clamp to 0 where out of range.
    pub fn replace_topology(&mut self, graph: TopologyGraph, paths: PathTable) -> ConflictResult<()> {
        for agent in &self.agents {
            locate_agent(&graph, agent)?;
        }
        self.stations = StationIndex::new(&graph, self.config.station_snap);
        self.graph = graph;
        self.paths = paths;
        self.state.plans.clear();
        self.state.schedules.clear();
        self.state.conflicts.clear();
        self.state.matrix = ConflictMatrix::new(self.agents.len());
        self.plan_all();
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn slot(&self, handle: AgentHandle) -> ConflictResult<usize> {
        self.index.get(&handle).copied().ok_or(ConflictError::UnknownAgent(handle))
    }

    fn check_rank(&self, handle: AgentHandle, rank: usize) -> ConflictResult<()> {
        let available = self.available_for(&self.agents[self.slot(handle)?]).len();
        if rank >= available {
            return Err(ConflictError::RankOutOfRange { handle, rank, available });
        }
        Ok(())
    }

    fn validate_overrides(&self, routes: &RouteOverrides, delays: &DelayOverrides) -> ConflictResult<()> {
        for (&handle, &rank) in routes {
            self.check_rank(handle, rank)?;
        }
        for &handle in delays.keys() {
            self.slot(handle)?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, routes: &RouteOverrides, delays: &DelayOverrides) {
        for (&handle, &rank) in routes {
            self.state.apply_rank(handle, rank);
        }
        for (&handle, &steps) in delays {
            self.state.apply_delay(handle, steps);
        }
    }

    fn stations_of(&self, agent: &AgentSpec) -> Option<(NodeId, NodeId)> {
        let (start, target) = agent.line_cells();
        Some((self.stations.resolve(start?)?, self.stations.resolve(target?)?))
    }

    fn available_for(&self, agent: &AgentSpec) -> Vec<PathId> {
        self.stations_of(agent)
            .map(|(s, t)| self.paths.path_ids(self.graph.position(s), self.graph.position(t)))
            .unwrap_or_default()
    }

    fn departure(&self, agent: &AgentSpec) -> f64 {
        agent.earliest_departure() + self.state.delays.get(&agent.handle).copied().unwrap_or(0.0)
    }

    fn plan_for(&self, agent: &AgentSpec) -> Option<AgentPlan> {
        let (start, target) = self.stations_of(agent)?;
        let routes = self
            .paths
            .paths_between(self.graph.position(start), self.graph.position(target));
        // A stale selection (e.g. after a topology change) falls back to 0.
        let rank = self
            .state
            .selection
            .get(&agent.handle)
            .copied()
            .filter(|&r| r < routes.len())
            .unwrap_or(0);
        let route = routes.get(rank)?;
        Some(AgentPlan {
            path_id: route.id,
            available: routes.iter().map(|r| r.id).collect(),
            selected_rank: rank,
            edges: route.edges.clone(),
            start,
            target,
        })
    }

    fn replan(&mut self, slot: usize) {
        let handle = self.agents[slot].handle;
        match self.plan_for(&self.agents[slot]) {
            None => {
                self.state.plans.remove(&handle);
                self.state.schedules.remove(&handle);
            }
            Some(plan) => {
                let unchanged = self.state.plans.get(&handle).is_some_and(|p| p.path_id == plan.path_id);
                if !unchanged {
                    self.state.schedules.remove(&handle);
                }
                self.state.plans.insert(handle, plan);
            }
        }
    }

    fn plan_all(&mut self) {
        for slot in 0..self.agents.len() {
            self.replan(slot);
        }
    }

    fn evaluate(&mut self) -> ConflictResult<()> {
        self.plan_all();

        for agent in &self.agents {
            if self.state.schedules.contains_key(&agent.handle) {
                continue;
            }
            let Some(plan) = self.state.plans.get(&agent.handle) else {
                continue;
            };
            let schedule =
                build_schedule(&self.graph, &plan.edges, agent.effective_speed(), self.departure(agent))?;
            self.state.schedules.insert(agent.handle, schedule);
        }

        let n = self.agents.len();
        let mut matrix = ConflictMatrix::new(n);
        let mut conflicts = Vec::new();
        let scheduled = |handle: AgentHandle| {
            Some((self.state.schedules.get(&handle)?, self.state.plans.get(&handle)?))
        };

        for i in 0..n {
            let a = self.agents[i].handle;
            let Some((sched_a, plan_a)) = scheduled(a) else { continue };
            for j in (i + 1)..n {
                let b = self.agents[j].handle;
                let Some((sched_b, plan_b)) = scheduled(b) else { continue };
                for (ea, eb) in overlapping(sched_a, sched_b) {
                    matrix.mark(i, j);
                    conflicts.push(Conflict {
                        resource:  ea.resource.clone(),
                        agents:    (a, b),
                        intervals: (ea.interval(), eb.interval()),
                        edges:     (ea.edge, eb.edge),
                        paths:     (plan_a.path_id, plan_b.path_id),
                    });
                }
            }
        }

        debug!(
            agents = n,
            scheduled = self.state.schedules.len(),
            conflicts = conflicts.len(),
            pairs = matrix.pair_count(),
            "conflicts evaluated"
        );
        self.state.matrix = matrix;
        self.state.conflicts = conflicts;
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn index_agents(agents: &[AgentSpec]) -> ConflictResult<FxHashMap<AgentHandle, usize>> {
    let mut index = FxHashMap::default();
    for (i, agent) in agents.iter().enumerate() {
        if index.insert(agent.handle, i).is_some() {
            return Err(ConflictError::DuplicateAgent(agent.handle));
        }
    }
    Ok(index)
}

fn locate_agent(graph: &TopologyGraph, agent: &AgentSpec) -> ConflictResult<Option<Location>> {
    let Some(position) = agent.current_position() else {
        return Ok(None);
    };
    graph
        .locate(position)
        .map(Some)
        .ok_or(ConflictError::Unmappable { handle: agent.handle, position })
}
