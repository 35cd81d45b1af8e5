//! CSV station loader.
//!
//! # CSV format
//!
//! One row per station:
//!
//! ```csv
//! row,col,station_id,name
//! 1,0,0,Westgate
//! 1,8,1,Eastfield
//! ```
//!
//! Two stations on the same cell are rejected.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use cp_core::Position;

use crate::{StationRegistry, TopologyError};

#[derive(Deserialize)]
struct StationRecord {
    row:        u32,
    col:        u32,
    station_id: u32,
    name:       String,
}

/// Load a [`StationRegistry`] from a CSV file.
pub fn load_stations_csv(path: &Path) -> Result<StationRegistry, TopologyError> {
    let file = std::fs::File::open(path)?;
    load_stations_reader(file)
}

/// Like [`load_stations_csv`] but accepts any `Read` source.
pub fn load_stations_reader<R: Read>(reader: R) -> Result<StationRegistry, TopologyError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut registry = StationRegistry::new();

    for result in csv_reader.deserialize::<StationRecord>() {
        let row = result.map_err(|e| TopologyError::Parse(e.to_string()))?;
        let pos = Position::new(row.row, row.col);
        if let Some(previous) = registry.insert(pos, row.station_id, row.name.trim()) {
            return Err(TopologyError::Parse(format!(
                "stations {} and {} share cell {pos}",
                previous.id, row.station_id
            )));
        }
    }

    Ok(registry)
}
