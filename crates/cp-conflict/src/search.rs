//! Bounded search for a conflict-free combination of route ranks.
//!
//! The search space is the Cartesian product of each focused agent's first
//! `max_suggestion_ranks` ranks, visited in lexicographic order (the first
//! agent varies slowest).  Each combination is previewed with
//! [`ConflictEngine::evaluate_selection`], so the engine is left untouched.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use cp_core::AgentHandle;

use crate::engine::{DelayOverrides, RouteOverrides};
use crate::{Conflict, ConflictEngine, ConflictResult};

impl ConflictEngine {
    /// First rank combination under which no conflict involves a focused
    /// agent.
    ///
    /// The focus is `handles` plus every agent named in `conflicts`.  Focused
    /// agents without any route are left out of the combination.  Returns
    /// `None` when the bounded space holds no such combination.
    pub fn suggest_conflict_free(
        &mut self,
        handles:   &[AgentHandle],
        conflicts: &[Conflict],
    ) -> ConflictResult<Option<RouteOverrides>> {
        let mut focus: BTreeSet<AgentHandle> = handles.iter().copied().collect();
        for c in conflicts {
            focus.insert(c.agents.0);
            focus.insert(c.agents.1);
        }

        let cap = self.config().max_suggestion_ranks;
        let mut axes: Vec<(AgentHandle, usize)> = Vec::with_capacity(focus.len());
        for &handle in &focus {
            let available = self.available_paths(handle)?.len().min(cap);
            if available > 0 {
                axes.push((handle, available));
            }
        }
        if axes.is_empty() {
            return Ok(None);
        }

        let no_delays = DelayOverrides::new();
        let mut ranks = vec![0usize; axes.len()];
        let mut tried = 0usize;
        loop {
            let choice: RouteOverrides = axes.iter().zip(&ranks).map(|(&(h, _), &r)| (h, r)).collect();
            let (_, found) = self.evaluate_selection(&choice, &no_delays)?;
            tried += 1;
            let clear = !found.iter().any(|c| focus.contains(&c.agents.0) || focus.contains(&c.agents.1));
            trace!(?choice, conflicts = found.len(), clear, "suggestion candidate");
            if clear {
                debug!(tried, agents = axes.len(), "conflict-free combination found");
                return Ok(Some(choice));
            }

            // Advance the odometer; the last axis varies fastest.
            let mut axis = axes.len();
            loop {
                if axis == 0 {
                    debug!(tried, agents = axes.len(), "no conflict-free combination");
                    return Ok(None);
                }
                axis -= 1;
                ranks[axis] += 1;
                if ranks[axis] < axes[axis].1 {
                    break;
                }
                ranks[axis] = 0;
            }
        }
    }

    /// One line per agent describing a suggested combination, for display.
    pub fn describe_suggestion(&self, suggestion: &RouteOverrides) -> String {
        let mut lines = Vec::with_capacity(suggestion.len());
        for (&handle, &rank) in suggestion {
            let ids = self.available_paths(handle).unwrap_or_default();
            let line = match ids.get(rank).and_then(|&id| self.paths().route(id)) {
                Some(route) => format!(
                    "{handle}: take route {} of {} from {} to {} ({} cells)",
                    rank + 1,
                    ids.len(),
                    route.id.source,
                    route.id.target,
                    route.cell_length(self.graph()),
                ),
                None => format!("{handle}: route {} is not available", rank + 1),
            };
            lines.push(line);
        }
        lines.join("\n")
    }
}
