use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::error::InvalidConfiguration;
use crate::sim_params::SimParams;
use std::path::Path;

// Grid geometry
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GridConfig {
    pub cells_side: u32,
}

// Population placed on the grid at start
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PopulationConfig {
    /// Total agents, split evenly between type 1 and type 2.
    pub num_agents: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PreferenceConfig {
    /// Minimum same-type share of occupied neighbors for an agent to stay put.
    pub alike_preference: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub tlength: u32,
    #[serde(default = "default_record_interval_steps")]
    pub record_interval_steps: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct InitialConditions {
    /// Seed for the run's random source. Drawn from OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Bincode,
    MessagePack,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Bincode => "bin",
            OutputFormat::MessagePack => "msgpack",
        }
    }

    /// Picks the format matching a file extension written by [`OutputFormat::extension`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "bin" | "bincode" => Some(OutputFormat::Bincode),
            "msgpack" | "mp" => Some(OutputFormat::MessagePack),
            _ => None,
        }
    }
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_happiness: bool,
    #[serde(default = "default_true")]
    pub save_snapshots: bool,
    #[serde(default)]
    pub save_cells_in_snapshot: bool,
    #[serde(default)]
    pub save_final_grid: bool,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: String::from("segregation"),
            save_happiness: true,
            save_snapshots: true,
            save_cells_in_snapshot: false,
            save_final_grid: false,
            format: OutputFormat::Json,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_record_interval_steps() -> u32 {
    1
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub population: PopulationConfig,
    pub preferences: PreferenceConfig,
    pub timing: TimingConfig,
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads and validates the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every parameter rule; the first violation wins.
    pub fn validate(&self) -> std::result::Result<(), InvalidConfiguration> {
        let side = self.grid.cells_side;
        if side == 0 {
            return Err(InvalidConfiguration::NonPositiveSide);
        }

        let num_agents = self.population.num_agents;
        if num_agents == 0 {
            return Err(InvalidConfiguration::NoAgents);
        }
        if num_agents % 2 != 0 {
            return Err(InvalidConfiguration::OddAgentCount(num_agents));
        }
        let capacity = u64::from(side) * u64::from(side);
        if u64::from(num_agents) >= capacity {
            return Err(InvalidConfiguration::OverCapacity {
                num_agents: u64::from(num_agents),
                capacity,
            });
        }

        let preference = self.preferences.alike_preference;
        if !(0.0..=1.0).contains(&preference) {
            // NaN also lands here.
            return Err(InvalidConfiguration::PreferenceOutOfRange(preference));
        }

        if self.timing.tlength == 0 {
            return Err(InvalidConfiguration::NoSteps);
        }
        if self.timing.record_interval_steps == 0 {
            return Err(InvalidConfiguration::NoRecordInterval);
        }

        Ok(())
    }

    /// Converts the configuration into the parameters used at runtime.
    /// `seed` is the resolved seed (from the config, or drawn by the caller).
    pub fn get_sim_params(&self, seed: u64) -> SimParams {
        let cells_side = self.grid.cells_side;
        let num_cells = cells_side as usize * cells_side as usize;
        let num_agents = self.population.num_agents as usize;
        let per_type = num_agents / 2;

        SimParams {
            cells_side,
            num_cells,
            num_agents,
            type_counts: [num_cells.saturating_sub(num_agents), per_type, per_type],
            alike_preference: self.preferences.alike_preference,
            tlength: self.timing.tlength,
            record_interval_steps: self.timing.record_interval_steps,
            seed,
        }
    }
}
