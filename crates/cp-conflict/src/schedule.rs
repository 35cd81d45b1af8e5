//! Resource-time schedules.
//!
//! An agent driving an edge sequence at constant speed `v` occupies edge `i`
//! for `length_i / v` time units, back to back from its departure time.  Each
//! interval is half-open: `[start, end)`.

use std::collections::BTreeSet;
use std::fmt;

use cp_core::{EdgeId, Position};
use cp_topology::{Edge, TopologyGraph};

use crate::{ConflictError, ConflictResult};

// ── ResourceId ────────────────────────────────────────────────────────────────

/// Identity of the physical track an edge occupies.
///
/// An edge and its mirror share the same cells, so two agents driving one
/// track in opposite directions contend for the same resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceId {
    Cells(BTreeSet<Position>),
    Rail(u32),
}

impl ResourceId {
    /// Cells if the edge has any, else its rail id.
    pub fn of(edge: &Edge) -> Self {
        let cells: BTreeSet<Position> = edge.resources.iter().map(|&(p, _)| p).collect();
        if cells.is_empty() {
            ResourceId::Rail(edge.rail_id)
        } else {
            ResourceId::Cells(cells)
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Cells(cells) => {
                let (first, last) = (cells.first(), cells.last());
                match (first, last) {
                    (Some(a), Some(b)) => write!(f, "track {a}..{b} ({} cells)", cells.len()),
                    _ => f.write_str("track (no cells)"),
                }
            }
            ResourceId::Rail(id) => write!(f, "rail {id}"),
        }
    }
}

// ── ScheduleEntry ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleEntry {
    pub edge:     EdgeId,
    pub resource: ResourceId,
    pub start:    f64,
    pub end:      f64,
}

impl ScheduleEntry {
    /// Strict overlap of the two half-open intervals.  Touching endpoints do
    /// not overlap.
    #[inline]
    pub fn overlaps(&self, other: &ScheduleEntry) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn interval(&self) -> (f64, f64) {
        (self.start, self.end)
    }
}

// ── Time windows ──────────────────────────────────────────────────────────────

fn check_speed(speed: f64) -> ConflictResult<f64> {
    if speed.is_nan() || speed <= 0.0 {
        return Err(ConflictError::InvalidSpeed { speed });
    }
    Ok(speed)
}

/// Time to drive `edge`: its length, or resource count, or 1, over `speed`.
fn travel_time(edge: &Edge, speed: f64) -> ConflictResult<f64> {
    let speed = check_speed(speed)?;
    let cells = match edge.length {
        0 => edge.resources.len().max(1) as u32,
        n => n,
    };
    Ok(cells as f64 / speed)
}

/// Window for crossing a single cell, relative to entry.
pub fn cell_time_window(speed: f64) -> ConflictResult<(f64, f64)> {
    Ok((0.0, 1.0 / check_speed(speed)?))
}

/// Window for driving one edge, relative to entry.
pub fn edge_time_window(graph: &TopologyGraph, edge: EdgeId, speed: f64) -> ConflictResult<(f64, f64)> {
    Ok((0.0, travel_time(graph.edge(edge), speed)?))
}

/// Consecutive windows for an edge sequence, starting at 0.
pub fn path_time_windows(
    graph: &TopologyGraph,
    edges: &[EdgeId],
    speed: f64,
) -> ConflictResult<Vec<(f64, f64)>> {
    let mut now = 0.0;
    edges
        .iter()
        .map(|&e| {
            let start = now;
            now += travel_time(graph.edge(e), speed)?;
            Ok((start, now))
        })
        .collect()
}

/// Schedule of an agent leaving at `departure` along `edges` at `speed`.
pub fn build_schedule(
    graph:     &TopologyGraph,
    edges:     &[EdgeId],
    speed:     f64,
    departure: f64,
) -> ConflictResult<Vec<ScheduleEntry>> {
    let mut now = departure;
    let mut schedule = Vec::with_capacity(edges.len());
    for &id in edges {
        let edge = graph.edge(id);
        let duration = travel_time(edge, speed)?;
        schedule.push(ScheduleEntry {
            edge: id,
            resource: ResourceId::of(edge),
            start: now,
            end: now + duration,
        });
        now += duration;
    }
    Ok(schedule)
}
