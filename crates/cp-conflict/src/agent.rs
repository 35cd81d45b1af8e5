//! Environment-side description of a train.

use cp_core::{AgentHandle, Direction, Position};

/// A declared stop on an agent's line.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Waypoint {
    pub position:           Position,
    pub direction:          Option<Direction>,
    pub earliest_departure: Option<f64>,
    pub latest_arrival:     Option<f64>,
}

impl Waypoint {
    pub fn at(position: Position) -> Self {
        Self { position, ..Self::default() }
    }

    pub fn departing(mut self, earliest: f64) -> Self {
        self.earliest_departure = Some(earliest);
        self
    }
}

/// Snapshot of one agent as reported by the environment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentSpec {
    pub handle:           AgentHandle,
    pub initial_position: Option<Position>,
    /// `None` until the agent has entered the grid.
    pub position:         Option<Position>,
    pub direction:        Option<Direction>,
    pub target:           Option<Position>,
    /// Ordered stops; the first and last define the agent's line.
    pub waypoints:        Vec<Waypoint>,
    /// Cells per time step.
    pub speed:            f64,
    pub max_speed:        Option<f64>,
}

impl Default for AgentSpec {
    fn default() -> Self {
        Self {
            handle:           AgentHandle(0),
            initial_position: None,
            position:         None,
            direction:        None,
            target:           None,
            waypoints:        Vec::new(),
            speed:            1.0,
            max_speed:        None,
        }
    }
}

impl AgentSpec {
    /// An agent at `start` heading for `target` at speed 1.
    pub fn new(handle: AgentHandle, start: Position, target: Position) -> Self {
        Self {
            handle,
            initial_position: Some(start),
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Waypoint>) -> Self {
        self.waypoints = waypoints;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Where the agent is now, or where it will enter the grid.
    pub fn current_position(&self) -> Option<Position> {
        self.position.or(self.initial_position)
    }

    /// `speed` if positive, else `max_speed` if positive, else 1.
    pub fn effective_speed(&self) -> f64 {
        if self.speed > 0.0 {
            return self.speed;
        }
        match self.max_speed {
            Some(max) if max > 0.0 => max,
            _ => 1.0,
        }
    }

    /// First declared earliest departure, or 0.
    pub fn earliest_departure(&self) -> f64 {
        self.waypoints.iter().find_map(|w| w.earliest_departure).unwrap_or(0.0)
    }

    /// Start and target cells of the agent's line: the first and last
    /// waypoints when declared, else the initial (or current) position and
    /// the target.
    pub fn line_cells(&self) -> (Option<Position>, Option<Position>) {
        match (self.waypoints.first(), self.waypoints.last()) {
            (Some(first), Some(last)) => (Some(first.position), Some(last.position)),
            _ => (self.initial_position.or(self.position), self.target),
        }
    }
}
