pub mod config;
pub mod error;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, GridConfig, PopulationConfig, PreferenceConfig, TimingConfig, InitialConditions, OutputConfig, OutputFormat};
pub use error::InvalidConfiguration;
pub use sim_params::SimParams;
pub use snapshot::{RunRecord, StepSnapshot, write_run_record, read_run_record, save_run_record, load_run_record};
