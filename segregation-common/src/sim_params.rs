use serde::{Deserialize, Serialize};

/// Run parameters derived from the configuration, used throughout a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimParams {
    // Grid
    pub cells_side: u32,
    pub num_cells: usize,

    // Population
    pub num_agents: usize,
    /// Cells initially holding each value: `[empty, type 1, type 2]`.
    pub type_counts: [usize; 3],

    pub alike_preference: f64,

    // Time
    pub tlength: u32,
    pub record_interval_steps: u32,

    /// Resolved seed of the run's random source.
    pub seed: u64,
}
