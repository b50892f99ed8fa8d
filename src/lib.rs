//! Schelling segregation model on a toroidal grid.
//!
//! [`grid::Grid`] owns the cells and resolves Moore-8 neighborhoods with
//! wraparound; [`simulation::SegregationSimulation`] classifies agents,
//! relocates the unhappy ones and records the happy fraction per step,
//! reporting each step to a [`observer::StepObserver`].

pub mod grid;
pub mod observer;
pub mod output;
pub mod simulation;

pub use grid::{CellValue, Grid, Position, EMPTY};
pub use observer::{LoggingObserver, NoopObserver, SnapshotRecorder, StepObserver};
pub use simulation::{classify, Happiness, NeighborhoodCounts, RunSummary, SegregationSimulation, StepReport};
