//! Pairwise conflict detection.

use std::fmt;
use std::ops::Index;

use cp_core::{AgentHandle, EdgeId};
use cp_routing::PathId;

use crate::schedule::{ResourceId, ScheduleEntry};

/// Two agents holding the same resource at overlapping times.
#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    pub resource:  ResourceId,
    pub agents:    (AgentHandle, AgentHandle),
    pub intervals: ((f64, f64), (f64, f64)),
    pub edges:     (EdgeId, EdgeId),
    pub paths:     (PathId, PathId),
}

impl Conflict {
    pub fn involves(&self, handle: AgentHandle) -> bool {
        self.agents.0 == handle || self.agents.1 == handle
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ((a0, a1), (b0, b1)) = self.intervals;
        write!(
            f,
            "{} [{a0}, {a1}) and {} [{b0}, {b1}) on {}",
            self.agents.0, self.agents.1, self.resource
        )
    }
}

/// Every overlapping pair of entries on a common resource.
pub(crate) fn overlapping<'a>(
    a: &'a [ScheduleEntry],
    b: &'a [ScheduleEntry],
) -> impl Iterator<Item = (&'a ScheduleEntry, &'a ScheduleEntry)> + 'a {
    a.iter().flat_map(move |ea| {
        b.iter()
            .filter(move |eb| ea.resource == eb.resource && ea.overlaps(eb))
            .map(move |eb| (ea, eb))
    })
}

// ── ConflictMatrix ────────────────────────────────────────────────────────────

/// Symmetric `n × n` agent conflict matrix with an empty diagonal.
///
/// Rows and columns follow the order agents were supplied to the engine.
/// `m[i][j]` reads one cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConflictMatrix {
    n:     usize,
    cells: Vec<bool>,
}

impl ConflictMatrix {
    pub fn new(n: usize) -> Self {
        Self { n, cells: vec![false; n * n] }
    }

    /// Mark `i` and `j` as conflicting.  The diagonal is never set.
    pub(crate) fn mark(&mut self, i: usize, j: usize) {
        if i != j {
            self.cells[i * self.n + j] = true;
            self.cells[j * self.n + i] = true;
        }
    }

    pub fn get(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.n + j]
    }

    /// Number of agents (rows).
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn has_conflicts(&self) -> bool {
        self.cells.iter().any(|&c| c)
    }

    /// Number of conflicting unordered agent pairs.
    pub fn pair_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count() / 2
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(self.n.max(1)).take(self.n)
    }

    /// Row-major `0`/`1` copy, the shape UIs usually want.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.rows().map(|r| r.iter().map(|&c| c as u8).collect()).collect()
    }
}

impl Index<usize> for ConflictMatrix {
    type Output = [bool];

    fn index(&self, row: usize) -> &[bool] {
        &self.cells[row * self.n..(row + 1) * self.n]
    }
}

impl fmt::Display for ConflictMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: Vec<&str> = row.iter().map(|&c| if c { "1" } else { "0" }).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
