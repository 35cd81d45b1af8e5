//! Planner configuration.
//!
//! Typically built in code by the application (or deserialized from its own
//! settings file with the `serde` feature) and handed to the engine builder.

use crate::{CoreError, CoreResult};

/// Edge attribute used as path-search weight.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeWeight {
    /// Number of cells advanced along the edge.
    #[default]
    Length,
    /// Every edge costs 1 (fewest decision points).
    Unit,
}

/// Which parallel edge represents a node pair in the collapsed search graph.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightGoal {
    #[default]
    Min,
    Max,
}

/// How an agent's start/target cell is matched to a station node.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StationSnap {
    /// Only a cell that *is* a station node resolves.
    #[default]
    Exact,
    /// The nearest station node within `max_distance` cells (Euclidean).
    Nearest { max_distance: f32 },
}

/// Top-level configuration for graph building, routing, and conflict search.
///
/// With the `serde` feature, missing fields take their defaults.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Paths kept per station pair.  Default: 4.
    pub k: usize,

    /// Search weight.  Default: [`EdgeWeight::Length`].
    pub weight: EdgeWeight,

    /// Parallel-edge collapse policy.  Default: [`WeightGoal::Min`].
    pub weight_goal: WeightGoal,

    /// Ranks tried per agent by the conflict-free suggestion search.
    /// The search visits `max_suggestion_ranks ^ agents` combinations at
    /// most.  Default: 4.
    pub max_suggestion_ranks: usize,

    /// Station resolution policy.  Default: [`StationSnap::Exact`].
    pub station_snap: StationSnap,

    /// Traversal guard: at most `height * width * depth_factor` hops are
    /// walked while building the graph (see [`TransitionGrid::hop_budget`]).
    /// Default: 10.
    ///
    /// [`TransitionGrid::hop_budget`]: crate::TransitionGrid::hop_budget
    pub depth_factor: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            k:                    4,
            weight:               EdgeWeight::Length,
            weight_goal:          WeightGoal::Min,
            max_suggestion_ranks: 4,
            station_snap:         StationSnap::Exact,
            depth_factor:         10,
        }
    }
}

impl PlannerConfig {
    /// Reject settings that would make routing or search meaningless.
    pub fn validate(&self) -> CoreResult<()> {
        if self.k == 0 {
            return Err(CoreError::Config("k must be at least 1".into()));
        }
        if self.max_suggestion_ranks == 0 {
            return Err(CoreError::Config("max_suggestion_ranks must be at least 1".into()));
        }
        if self.depth_factor == 0 {
            return Err(CoreError::Config("depth_factor must be at least 1".into()));
        }
        if let StationSnap::Nearest { max_distance } = self.station_snap {
            if max_distance.is_nan() || max_distance < 0.0 {
                return Err(CoreError::Config(format!(
                    "station snap distance must be non-negative, got {max_distance}"
                )));
            }
        }
        Ok(())
    }
}
