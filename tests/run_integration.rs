use segregation_common::{RunRecord, SimulationConfig};
use segregation_engine::{NoopObserver, SegregationSimulation, SnapshotRecorder, EMPTY};

fn config(seed: u64, alike_preference: f64) -> SimulationConfig {
    SimulationConfig::from_toml_str(&format!(
        r#"
        [grid]
        cells_side = 20

        [population]
        num_agents = 300

        [preferences]
        alike_preference = {alike_preference}

        [timing]
        tlength = 30
        record_interval_steps = 10

        [initial_conditions]
        seed = {seed}
        "#
    ))
    .unwrap()
}

#[test]
fn seeded_runs_replay_identically() {
    let cfg = config(0xDEAD_BEEF, 0.6);
    let mut a = SegregationSimulation::new(&cfg).unwrap();
    let mut b = SegregationSimulation::new(&cfg).unwrap();
    let summary_a = a.run(&mut NoopObserver);
    let summary_b = b.run(&mut NoopObserver);
    assert_eq!(summary_a, summary_b);
    assert_eq!(a.grid(), b.grid());
}

#[test]
fn segregation_raises_happiness_over_a_run() {
    let mut sim = SegregationSimulation::new(&config(7, 0.5)).unwrap();
    let summary = sim.run(&mut NoopObserver);
    assert_eq!(summary.steps_executed, 30);
    let first = summary.happiness[0];
    let last = *summary.happiness.last().unwrap();
    assert!(last > first, "happy fraction went from {first} to {last}");
    assert!(summary.happiness.iter().all(|f| (0.0..=1.0).contains(f)));
}

#[test]
fn recorded_run_keeps_population_in_every_snapshot() {
    let cfg = config(11, 0.7);
    let mut sim = SegregationSimulation::new(&cfg).unwrap();
    let initial_cells = sim.grid().cells().to_vec();
    let mut recorder = SnapshotRecorder::new(30, 10, true);
    let summary = sim.run(&mut recorder);

    let record = RunRecord {
        params: sim.params().clone(),
        initial_cells,
        snapshots: recorder.into_snapshots(),
        happiness: summary.happiness,
    };
    assert_eq!(record.steps_executed(), 30);
    assert_eq!(record.snapshots.iter().map(|s| s.step).collect::<Vec<_>>(), vec![9, 19, 29]);
    for snapshot in &record.snapshots {
        let cells = snapshot.cells.as_ref().unwrap();
        assert_eq!(cells.iter().filter(|&&v| v != EMPTY).count(), 300);
        assert_eq!(cells.iter().filter(|&&v| v == 1).count(), 150);
        assert_eq!(snapshot.happy_fraction, record.happiness[snapshot.step as usize]);
    }
}
