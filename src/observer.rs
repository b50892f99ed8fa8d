use crate::grid::Grid;
use crate::simulation::StepReport;
use log::{debug, info, trace};
use segregation_common::StepSnapshot;
use std::time::{Duration, Instant};

/// Receives the simulation's output after every step.
///
/// `report` carries the step index and the step's happy fraction; `grid` is the
/// layout after relocation (`grid.to_rows()` gives the 2-D snapshot).
pub trait StepObserver {
    fn on_step(&mut self, grid: &Grid, report: &StepReport);

    /// Called once when the run reaches its configured length.
    fn on_complete(&mut self, _steps_executed: u32, _happiness: &[f64]) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {
    fn on_step(&mut self, _grid: &Grid, _report: &StepReport) {}
}

/// Feeds both observers, first `A` then `B`.
impl<A: StepObserver, B: StepObserver> StepObserver for (A, B) {
    fn on_step(&mut self, grid: &Grid, report: &StepReport) {
        self.0.on_step(grid, report);
        self.1.on_step(grid, report);
    }

    fn on_complete(&mut self, steps_executed: u32, happiness: &[f64]) {
        self.0.on_complete(steps_executed, happiness);
        self.1.on_complete(steps_executed, happiness);
    }
}

/// Logs progress: an `info!` line every `print_interval` (and on the last
/// step), `trace!` for every other step.
pub struct LoggingObserver {
    total_steps: u32,
    print_interval: Duration,
    start_time: Instant,
    previous_print_time: Instant,
    previous_step_time: Instant,
}

impl LoggingObserver {
    pub fn new(total_steps: u32, print_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            total_steps,
            print_interval,
            start_time: now,
            previous_print_time: now,
            previous_step_time: now,
        }
    }
}

impl StepObserver for LoggingObserver {
    fn on_step(&mut self, grid: &Grid, report: &StepReport) {
        let current_time = Instant::now();
        let step_duration = current_time.duration_since(self.previous_step_time);
        self.previous_step_time = current_time;

        let should_print_status = current_time.duration_since(self.previous_print_time) >= self.print_interval;
        let is_last_step = report.step_index + 1 >= self.total_steps;

        if should_print_status || is_last_step {
            info!(
                "Step [{}/{}] | Happy: {:.4} | Unhappy agents: {} / {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                report.step_index + 1,
                self.total_steps,
                report.happy_fraction,
                report.unhappy_count,
                grid.occupied_count(),
                step_duration.as_secs_f64() * 1000.0,
                self.start_time.elapsed().as_secs_f64()
            );
            self.previous_print_time = current_time;
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                report.step_index + 1,
                self.total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    fn on_complete(&mut self, steps_executed: u32, happiness: &[f64]) {
        let final_fraction = happiness.last().copied().unwrap_or(0.0);
        info!(
            "Run complete: {} steps in {:.3} s, final happy fraction {:.4}.",
            steps_executed,
            self.start_time.elapsed().as_secs_f64(),
            final_fraction
        );
    }
}

/// Collects a [`StepSnapshot`] every `record_interval_steps` steps and on the
/// last step of the run.
pub struct SnapshotRecorder {
    total_steps: u32,
    record_interval_steps: u32,
    include_cells: bool,
    recorded_snapshots: Vec<StepSnapshot>,
}

impl SnapshotRecorder {
    pub fn new(total_steps: u32, record_interval_steps: u32, include_cells: bool) -> Self {
        Self {
            total_steps,
            record_interval_steps: record_interval_steps.max(1),
            include_cells,
            recorded_snapshots: Vec::new(),
        }
    }

    /// Provides access to the recorded snapshots.
    pub fn snapshots(&self) -> &[StepSnapshot] {
        &self.recorded_snapshots
    }

    pub fn into_snapshots(self) -> Vec<StepSnapshot> {
        self.recorded_snapshots
    }
}

impl StepObserver for SnapshotRecorder {
    fn on_step(&mut self, grid: &Grid, report: &StepReport) {
        let completed = report.step_index + 1;
        let is_record_step = completed % self.record_interval_steps == 0;
        let is_last_step = completed >= self.total_steps;
        if !(is_record_step || is_last_step) {
            return;
        }

        debug!("Recording snapshot at step {}...", report.step_index);
        self.recorded_snapshots.push(StepSnapshot {
            step: report.step_index,
            happy_fraction: report.happy_fraction,
            happy_count: report.happy_count,
            unhappy_count: report.unhappy_count,
            relocated: report.relocated,
            cells: self.include_cells.then(|| grid.cells().to_vec()),
        });
    }
}
