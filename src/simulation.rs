use crate::grid::{Grid, Position, EMPTY};
use crate::observer::StepObserver;
use anyhow::Result;
use log::{debug, info, trace};
use rand::prelude::*;
use rand::rngs::StdRng;
use segregation_common::{InvalidConfiguration, SimParams, SimulationConfig};

/// Outcome of the happiness test for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Happiness {
    Happy,
    Unhappy,
}

/// Composition of an agent's Moore neighborhood. Empty neighbors are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighborhoodCounts {
    /// Neighbors holding the same value as the agent.
    pub like: u32,
    /// Neighbors holding any agent.
    pub occupied: u32,
}

impl NeighborhoodCounts {
    pub fn of(grid: &Grid, position: Position) -> Self {
        let own = grid.value_at(position);
        grid.neighbors_of(position)
            .iter()
            .map(|&n| grid.value_at(n))
            .filter(|&v| v != EMPTY)
            .fold(NeighborhoodCounts::default(), |mut acc, v| {
                acc.occupied += 1;
                if v == own {
                    acc.like += 1;
                }
                acc
            })
    }

    /// An agent without occupied neighbors has nothing to object to and is happy.
    pub fn happiness(self, alike_preference: f64) -> Happiness {
        if self.occupied == 0 {
            return Happiness::Happy;
        }
        let ratio = f64::from(self.like) / f64::from(self.occupied);
        if ratio >= alike_preference {
            Happiness::Happy
        } else {
            Happiness::Unhappy
        }
    }
}

/// Happiness of the agent at `position` against `alike_preference`.
pub fn classify(grid: &Grid, position: Position, alike_preference: f64) -> Happiness {
    NeighborhoodCounts::of(grid, position).happiness(alike_preference)
}

/// What one step did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Zero-based index of the completed step.
    pub step_index: u32,
    pub happy_count: u32,
    pub unhappy_count: u32,
    /// Agents moved. Equals `unhappy_count`: every unhappy agent finds an empty cell.
    pub relocated: u32,
    /// Positions drawn while rejection-sampling for empty cells.
    pub sampling_attempts: u64,
    /// `happy_count / (happy_count + unhappy_count)`.
    pub happy_fraction: f64,
}

/// Returned once a run reaches its configured length.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps_executed: u32,
    pub happiness: Vec<f64>,
}

/// Manages the grid and executes the segregation model step by step.
///
/// The random source is supplied by the caller and consumed in a fixed order
/// (initial shuffle, then per step: unhappy-agent order, relocation sampling),
/// so a seeded generator replays a run exactly.
pub struct SegregationSimulation<R: Rng = StdRng> {
    params: SimParams,
    grid: Grid,
    rng: R,
    /// Steps completed so far.
    current_step: u32,
    /// One happy fraction per completed step.
    happiness: Vec<f64>,
}

impl SegregationSimulation<StdRng> {
    /// Builds a run from a validated configuration, seeding a `StdRng` from the
    /// configured seed or from OS entropy.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let seed = match config.initial_conditions.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::rng().random::<u64>();
                info!("No seed configured; drew seed {} from OS entropy.", seed);
                seed
            }
        };
        let params = config.get_sim_params(seed);
        let rng = StdRng::seed_from_u64(seed);
        let sim = Self::with_rng(params, rng)?;
        Ok(sim)
    }
}

impl<R: Rng> SegregationSimulation<R> {
    /// Shuffles a fresh grid from `params.type_counts` using `rng`.
    pub fn with_rng(params: SimParams, mut rng: R) -> Result<Self, InvalidConfiguration> {
        check_params(&params)?;
        let grid = Grid::initialize(params.cells_side, params.type_counts, &mut rng)?;
        debug!(
            "Initialized {}x{} grid with {} agents ({} empty cells).",
            params.cells_side, params.cells_side, params.num_agents, params.type_counts[0]
        );
        Ok(Self::assemble(params, grid, rng))
    }

    /// Starts from a pre-arranged grid. The grid must match `params` in size and
    /// population and keep at least one cell empty.
    pub fn from_grid(params: SimParams, grid: Grid, rng: R) -> Result<Self, InvalidConfiguration> {
        check_params(&params)?;
        if grid.side() != params.cells_side {
            return Err(InvalidConfiguration::CellCountMismatch {
                expected: params.num_cells,
                actual: grid.num_cells(),
            });
        }
        let occupied = grid.occupied_count();
        if occupied >= grid.num_cells() {
            return Err(InvalidConfiguration::OverCapacity {
                num_agents: occupied as u64,
                capacity: grid.num_cells() as u64,
            });
        }
        let counts = [grid.count_of(EMPTY), grid.count_of(1), grid.count_of(2)];
        if counts != params.type_counts {
            return Err(InvalidConfiguration::TypeCountMismatch {
                expected: params.type_counts,
                actual: counts,
            });
        }
        Ok(Self::assemble(params, grid, rng))
    }

    fn assemble(params: SimParams, grid: Grid, rng: R) -> Self {
        let happiness = Vec::with_capacity(params.tlength as usize);
        Self {
            params,
            grid,
            rng,
            current_step: 0,
            happiness,
        }
    }

    /// Advances the model by one step and reports it to `observer`.
    /// Returns `None` once `tlength` steps have run; the state is left untouched.
    pub fn step<O: StepObserver + ?Sized>(&mut self, observer: &mut O) -> Option<StepReport> {
        if self.is_finished() {
            return None;
        }
        let step_index = self.current_step;

        // --- 1-3. Classify every agent against the current layout ---
        let (happy, unhappy) = self.partition_agents();
        let happy_count = happy.len() as u32;
        let unhappy_count = unhappy.len() as u32;

        // --- 4. Record the happy fraction ---
        let total = happy_count + unhappy_count;
        let happy_fraction = if total > 0 {
            f64::from(happy_count) / f64::from(total)
        } else {
            1.0
        };
        self.happiness.push(happy_fraction);

        // --- 5. Relocate unhappy agents ---
        let (relocated, sampling_attempts) = if unhappy.is_empty() {
            (0, 0)
        } else {
            self.relocate(unhappy)
        };

        self.current_step += 1;
        let report = StepReport {
            step_index,
            happy_count,
            unhappy_count,
            relocated,
            sampling_attempts,
            happy_fraction,
        };
        trace!(
            "Step {} | happy {:.4} ({}/{}) | relocated {} in {} draws",
            step_index, happy_fraction, happy_count, total, relocated, sampling_attempts
        );

        // --- 6. Hand the new state to the observer ---
        observer.on_step(&self.grid, &report);
        Some(report)
    }

    /// Runs the remaining steps, then signals completion to `observer`.
    pub fn run<O: StepObserver + ?Sized>(&mut self, observer: &mut O) -> RunSummary {
        while self.step(observer).is_some() {}
        observer.on_complete(self.current_step, &self.happiness);
        RunSummary {
            steps_executed: self.current_step,
            happiness: self.happiness.clone(),
        }
    }

    /// Splits occupied cells into happy and unhappy, in row-major order.
    fn partition_agents(&self) -> (Vec<Position>, Vec<Position>) {
        let preference = self.params.alike_preference;
        self.grid
            .occupied_positions()
            .partition(|&pos| classify(&self.grid, pos, preference) == Happiness::Happy)
    }

    /// Moves each unhappy agent, in a fresh random order, to a uniformly drawn
    /// empty cell. Cells vacated earlier in the pass are valid destinations.
    fn relocate(&mut self, mut unhappy: Vec<Position>) -> (u32, u64) {
        unhappy.shuffle(&mut self.rng);

        let mut relocated = 0;
        let mut attempts: u64 = 0;
        for from in unhappy {
            // At least one cell is always empty, so this terminates with probability 1.
            let to = loop {
                attempts += 1;
                let candidate = self.grid.random_position(&mut self.rng);
                if self.grid.is_empty_at(candidate) {
                    break candidate;
                }
            };
            self.grid.move_agent(from, to);
            relocated += 1;
        }
        (relocated, attempts)
    }

    pub fn is_finished(&self) -> bool {
        self.current_step >= self.params.tlength
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Happy fraction of every completed step.
    pub fn happiness(&self) -> &[f64] {
        &self.happiness
    }
}

fn check_params(params: &SimParams) -> Result<(), InvalidConfiguration> {
    if params.cells_side == 0 {
        return Err(InvalidConfiguration::NonPositiveSide);
    }
    let side_cells = params.cells_side as usize * params.cells_side as usize;
    if params.num_cells != side_cells {
        return Err(InvalidConfiguration::CellCountMismatch {
            expected: side_cells,
            actual: params.num_cells,
        });
    }
    if params.num_agents == 0 {
        return Err(InvalidConfiguration::NoAgents);
    }
    if params.num_agents >= params.num_cells {
        return Err(InvalidConfiguration::OverCapacity {
            num_agents: params.num_agents as u64,
            capacity: params.num_cells as u64,
        });
    }
    if params.num_agents % 2 != 0 {
        return Err(InvalidConfiguration::OddAgentCount(params.num_agents as u32));
    }
    // Two equal groups plus at least one empty cell.
    let per_type = params.num_agents / 2;
    let expected = [params.num_cells - params.num_agents, per_type, per_type];
    if params.type_counts != expected {
        return Err(InvalidConfiguration::TypeCountMismatch {
            expected,
            actual: params.type_counts,
        });
    }
    if !(0.0..=1.0).contains(&params.alike_preference) {
        return Err(InvalidConfiguration::PreferenceOutOfRange(params.alike_preference));
    }
    if params.tlength == 0 {
        return Err(InvalidConfiguration::NoSteps);
    }
    Ok(())
}
