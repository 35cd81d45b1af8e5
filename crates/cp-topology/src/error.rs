//! Topology-subsystem error type.

use thiserror::Error;

use cp_core::{Direction, Position};

/// Errors produced by `cp-topology`.  Graph-construction errors are fatal:
/// no partial graph is ever returned.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("no decision point (switch, dead end, or crossing) in a {height}x{width} grid")]
    NoDecisionPoint { height: u32, width: u32 },

    #[error("traversal exceeded {max_hops} hops; the topology is malformed")]
    DepthExceeded { max_hops: u64 },

    #[error("track at {from} leads off the grid heading {heading}")]
    OffGrid { from: Position, heading: Direction },

    #[error("station parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TopologyResult<T> = Result<T, TopologyError>;
