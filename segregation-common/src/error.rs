//! Configuration errors shared by the engine and the visualizer.
//!
//! Every rule checked before a grid is built has its own variant so callers
//! (and tests) can match on exactly what was wrong.

/// The run cannot start with the given parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidConfiguration {
    /// The grid side length was zero.
    #[error("cells_side must be positive")]
    NonPositiveSide,

    /// The per-value counts do not fill the grid exactly.
    #[error("type counts sum to {actual} but the grid has {expected} cells")]
    CountMismatch {
        /// `cells_side²`.
        expected: usize,
        /// Sum of the supplied counts.
        actual: usize,
    },

    /// A pre-arranged grid does not hold the expected number of each value.
    #[error("grid holds {actual:?} cells per value, expected {expected:?}")]
    TypeCountMismatch {
        /// `[empty, type 1, type 2]` from the parameters.
        expected: [usize; 3],
        /// `[empty, type 1, type 2]` found in the grid.
        actual: [usize; 3],
    },

    /// A pre-arranged cell vector has the wrong length.
    #[error("expected {expected} cells, got {actual}")]
    CellCountMismatch {
        /// `cells_side²`.
        expected: usize,
        /// Length of the supplied vector.
        actual: usize,
    },

    /// A pre-arranged cell holds something other than empty, type 1 or type 2.
    #[error("cell {index} holds invalid value {value}")]
    InvalidCellValue {
        /// Flat index of the offending cell.
        index: usize,
        /// The value found there.
        value: u8,
    },

    /// No agents to simulate.
    #[error("num_agents must be positive")]
    NoAgents,

    /// Agents are split into two equal groups.
    #[error("num_agents ({0}) must be even")]
    OddAgentCount(u32),

    /// At least one cell must stay empty so relocation can terminate.
    #[error("num_agents ({num_agents}) must be less than the {capacity} grid cells")]
    OverCapacity {
        /// Requested population.
        num_agents: u64,
        /// `cells_side²`.
        capacity: u64,
    },

    /// The happiness threshold is not a fraction.
    #[error("alike_preference {0} is outside [0, 1]")]
    PreferenceOutOfRange(f64),

    /// Nothing to simulate.
    #[error("tlength must be positive")]
    NoSteps,

    /// Snapshots would never be recorded.
    #[error("record_interval_steps must be positive")]
    NoRecordInterval,
}
