use anyhow::Result;
use std::time::{Duration, Instant};
use log::{info, debug};

use segregation_common::{RunRecord, SimulationConfig};
use segregation_engine::output;
use segregation_engine::{LoggingObserver, SegregationSimulation, SnapshotRecorder};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const PRINT_INTERVAL: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Segregation Engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    info!("Loading configuration from {}", config_path);
    let config = SimulationConfig::load(&config_path)?;

    // --- Initialize Simulation ---
    let mut sim = SegregationSimulation::new(&config)?;
    let params = sim.params().clone();
    info!(
        "Grid {}x{} with {} agents ({} per type), alike preference {:.3}, seed {}.",
        params.cells_side,
        params.cells_side,
        params.num_agents,
        params.type_counts[1],
        params.alike_preference,
        params.seed
    );
    debug!("Simulation Parameters: {:#?}", params);
    let initial_cells = sim.grid().cells().to_vec();

    // --- Simulation Loop ---
    info!(
        "Starting simulation loop for {} steps, recording every {} steps...",
        params.tlength, params.record_interval_steps
    );
    let start_time = Instant::now();
    let mut observers = (
        LoggingObserver::new(params.tlength, PRINT_INTERVAL),
        SnapshotRecorder::new(params.tlength, params.record_interval_steps, config.output.save_cells_in_snapshot),
    );
    let summary = sim.run(&mut observers);

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished {} steps in {:.3} seconds.",
        summary.steps_executed,
        total_duration.as_secs_f64()
    );

    // --- Save Recorded Data ---
    info!("Saving recorded data...");
    let (_, recorder) = observers;
    let record = RunRecord {
        params,
        initial_cells,
        snapshots: recorder.into_snapshots(),
        happiness: summary.happiness,
    };
    let written = output::save_outputs(&config.output, &record, sim.grid())?;
    debug!("Wrote {} output files.", written.len());

    info!("Simulation Complete.");
    Ok(())
}
