use cp_core::{AgentHandle, CoreError, Position};
use cp_topology::TopologyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("unknown agent {0}")]
    UnknownAgent(AgentHandle),

    #[error("agent {0} supplied more than once")]
    DuplicateAgent(AgentHandle),

    #[error("path rank {rank} is out of range for {handle} ({available} paths available)")]
    RankOutOfRange {
        handle:    AgentHandle,
        rank:      usize,
        available: usize,
    },

    #[error("train speed must be positive to compute travel time, got {speed}")]
    InvalidSpeed { speed: f64 },

    #[error("{handle} at {position} cannot be matched to any graph node or edge")]
    Unmappable {
        handle:   AgentHandle,
        position: Position,
    },

    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("configuration error: {0}")]
    Config(#[from] CoreError),
}

pub type ConflictResult<T> = Result<T, ConflictError>;
