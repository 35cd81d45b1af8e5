//! Error type shared by the `cp-*` crates for grid and configuration input.

use thiserror::Error;

use crate::Position;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("grid row {row} has {got} cells, expected {expected}")]
    RaggedGrid {
        row:      usize,
        expected: usize,
        got:      usize,
    },

    #[error("position {0} lies outside the grid")]
    OutOfBounds(Position),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for grid and configuration helpers.
pub type CoreResult<T> = Result<T, CoreError>;
