//! `cp-core` — foundational types for the rail conflict predictor.
//!
//! This crate is a dependency of every other `cp-*` crate.  It has no `cp-*`
//! dependencies and a single required external one (`thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `NodeId`, `EdgeId`, `AgentHandle`                         |
//! | [`grid`]   | `Position`, `Direction`, `Exits`, `TransitionGrid`        |
//! | [`config`] | `PlannerConfig`, `EdgeWeight`, `WeightGoal`, `StationSnap` |
//! | [`error`]  | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod grid;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{EdgeWeight, PlannerConfig, StationSnap, WeightGoal};
pub use error::{CoreError, CoreResult};
pub use grid::{Direction, Exits, Position, TransitionGrid};
pub use ids::{AgentHandle, EdgeId, NodeId};
