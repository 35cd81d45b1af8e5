//! `cp-topology` — reduces a transition grid to a decision-point multigraph.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`graph`]    | `TopologyGraph` (CSR), `Node`, `Edge`, `Location`           |
//! | [`builder`]  | `TopologyBuilder`, `build_graph`                            |
//! | [`stations`] | `StationRegistry`, `Station`, `StationIndex` (R-tree snap)  |
//! | [`loader`]   | `load_stations_csv`, `load_stations_reader`                 |
//! | [`error`]    | `TopologyError`, `TopologyResult<T>`                        |
//!
//! # Graph model
//!
//! Nodes are decision points (switches, dead ends, crossings, and registered
//! station cells), addressed by grid position.  Edges are maximal runs of
//! plain track between two nodes, keyed by the direction in which they leave
//! their source node, so parallel tracks between the same node pair stay
//! distinct.  The graph is immutable once built.

pub mod builder;
pub mod error;
pub mod graph;
pub mod loader;
pub mod stations;

#[cfg(test)]
mod tests;

pub use builder::{TopologyBuilder, build_graph};
pub use error::{TopologyError, TopologyResult};
pub use graph::{Edge, Location, Node, TopologyGraph};
pub use loader::{load_stations_csv, load_stations_reader};
pub use stations::{Station, StationIndex, StationRegistry};
