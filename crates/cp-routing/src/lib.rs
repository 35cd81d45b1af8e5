//! `cp-routing` — k-shortest loopless routes between station nodes.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`yen`]        | `CollapsedGraph`, Dijkstra, Yen's k-shortest node paths   |
//! | [`multigraph`] | Expansion of node paths into concrete parallel-edge choices |
//! | [`table`]      | `PathId`, `Route`, `PathTable`                            |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Station pairs are solved on the Rayon pool.               |
//! | `serde`    | Derives `Serialize`/`Deserialize` on `PathId`.            |
//!
//! There is no error type: an unreachable station pair simply has no routes.

pub mod multigraph;
pub mod table;
pub mod yen;

#[cfg(test)]
mod tests;

pub use multigraph::resolve_edges;
pub use table::{PathId, PathTable, Route, k_shortest_routes};
pub use yen::{CollapsedGraph, edge_weight, k_shortest_paths, shortest_path};
