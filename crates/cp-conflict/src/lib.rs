//! `cp-conflict` — agent plans, resource-time schedules, and conflict search.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`agent`]    | `AgentSpec`, `Waypoint` (environment-side agent description) |
//! | [`schedule`] | `ResourceId`, `ScheduleEntry`, `build_schedule`, time windows |
//! | [`detect`]   | `Conflict`, `ConflictMatrix`, pairwise overlap scan          |
//! | [`engine`]   | `ConflictEngine`, `AgentPlan`, `AgentState`                  |
//! | [`builder`]  | `EngineBuilder` (grid + agents → ready engine)               |
//! | [`search`]   | Bounded conflict-free rank search                            |
//! | [`error`]    | `ConflictError`, `ConflictResult<T>`                         |
//!
//! # Typical flow
//!
//! ```rust,ignore
//! let mut engine = EngineBuilder::new(&grid, agents).stations(&stations).build()?;
//! let matrix = engine.conflict_matrix()?;
//! if matrix.has_conflicts() {
//!     let conflicts = engine.detected_conflicts().to_vec();
//!     if let Some(choice) = engine.suggest_conflict_free(&[], &conflicts)? {
//!         engine.apply_selection(&choice, &BTreeMap::new())?;
//!     }
//! }
//! ```

pub mod agent;
pub mod builder;
pub mod detect;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod search;


pub use agent::{AgentSpec, Waypoint};
pub use builder::EngineBuilder;
pub use detect::{Conflict, ConflictMatrix};
pub use engine::{AgentPlan, AgentState, ConflictEngine, DelayOverrides, RouteOverrides};
pub use error::{ConflictError, ConflictResult};
pub use schedule::{
    ResourceId, ScheduleEntry, build_schedule, cell_time_window, edge_time_window,
    path_time_windows,
};
