//! JSON scenario files.
//!
//! ```json
//! {
//!   "grid_dimensions": [height, width],
//!   "grid":     [[transition codes, row-major]],
//!   "stations": [{ "row": 1, "col": 0, "id": 0, "name": "Westgate" }],
//!   "agents":   [{ "handle": 0, "initial_position": { "row": 1, "col": 0 }, ... }],
//!   "config":   { ... }            // optional PlannerConfig
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use cp_conflict::AgentSpec;
use cp_core::{PlannerConfig, Position, TransitionGrid};
use cp_topology::StationRegistry;

#[derive(Deserialize)]
struct StationDef {
    row:  u32,
    col:  u32,
    id:   u32,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
pub struct Scenario {
    grid_dimensions: [u32; 2],
    grid:            Vec<Vec<u16>>,
    #[serde(default)]
    stations:        Vec<StationDef>,
    pub agents:      Vec<AgentSpec>,
    #[serde(default)]
    pub config:      Option<PlannerConfig>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn grid(&self) -> Result<TransitionGrid> {
        let grid = TransitionGrid::from_rows(self.grid.clone())?;
        let [height, width] = self.grid_dimensions;
        ensure!(
            grid.height() == height && grid.width() == width,
            "grid is {}x{} but grid_dimensions says {height}x{width}",
            grid.height(),
            grid.width()
        );
        Ok(grid)
    }

    pub fn stations(&self) -> StationRegistry {
        let mut registry = StationRegistry::new();
        for s in &self.stations {
            let name = if s.name.is_empty() { format!("station {}", s.id) } else { s.name.clone() };
            registry.insert(Position::new(s.row, s.col), s.id, name);
        }
        registry
    }
}
