//! avoidance — predict and resolve conflicts for a JSON rail scenario.
//!
//! ```text
//! avoidance [scenario.json] [stations.csv]
//! ```
//!
//! Builds the decision-point graph, assigns every train its shortest route,
//! prints the conflict matrix and conflicts, then searches the first few
//! alternative routes for a conflict-free combination and applies it.
//! Set `RUST_LOG=debug` to see the engine's own events.

mod scenario;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cp_conflict::EngineBuilder;
use cp_topology::load_stations_csv;

use scenario::Scenario;

const DEFAULT_SCENARIO: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/simple_avoidance.json");

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let scenario_path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_SCENARIO));
    let stations_csv = args.next().map(PathBuf::from);

    // ── Load ──────────────────────────────────────────────────────────────
    let scenario = Scenario::load(&scenario_path)?;
    let grid = scenario.grid()?;
    let mut stations = scenario.stations();
    if let Some(path) = stations_csv.as_deref() {
        let extra = load_stations_csv(path)?;
        for (pos, station) in extra.iter() {
            stations.insert(pos, station.id, station.name.clone());
        }
    }
    let config = scenario.config.clone().unwrap_or_default();

    let mut engine = EngineBuilder::new(&grid, scenario.agents)
        .stations(&stations)
        .config(config)
        .build()?;
    info!(
        nodes = engine.graph().node_count(),
        edges = engine.graph().edge_count(),
        station_pairs = engine.paths().len(),
        agents = engine.agents().len(),
        "scenario loaded"
    );

    // ── Routes ────────────────────────────────────────────────────────────
    println!("Routes:");
    let handles: Vec<_> = engine.agents().iter().map(|a| a.handle).collect();
    for &handle in &handles {
        let ids = engine.available_paths(handle)?;
        if ids.is_empty() {
            println!("  {handle}: no line (stations unresolved or unreachable)");
            continue;
        }
        for id in ids {
            let cells = engine.path_cells(id);
            println!("  {handle}: {id} ({} cells)", cells.len().saturating_sub(1));
        }
    }

    // ── Conflicts ─────────────────────────────────────────────────────────
    let matrix = engine.conflict_matrix()?;
    println!("\nConflict matrix:\n{matrix}");
    let conflicts = engine.detected_conflicts().to_vec();
    if conflicts.is_empty() {
        println!("No conflicts.");
        return Ok(());
    }
    for c in &conflicts {
        println!("  {c}");
    }

    // ── Resolution ────────────────────────────────────────────────────────
    match engine.suggest_conflict_free(&[], &conflicts)? {
        Some(choice) => {
            println!("\nSuggested resolution:\n{}", engine.describe_suggestion(&choice));
            engine.apply_selection(&choice, &BTreeMap::new())?;
            let after = engine.conflict_matrix()?;
            println!("\nConflict matrix after applying:\n{after}");
        }
        None => println!(
            "\nNo conflict-free combination within the first {} routes per train.",
            engine.config().max_suggestion_ranks
        ),
    }

    Ok(())
}
