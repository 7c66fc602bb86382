use std::fmt::Display;

use crate::energy::energy_model::EnergyBreakdown;

// Configuration of the move engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverOptions {
    max_iterations: Option<usize>, // None = run until convergence
    random_label_order: bool,
    seed: Option<u64>, // None = seed the label-order generator from entropy
    verbosity: u8,     // 0 = silent, 1 = per pass, 2 = per move
    truncate_non_submodular: bool,
    verify_cuts: bool,
}

impl SolverOptions {
    pub fn default() -> Self {
        SolverOptions {
            max_iterations: None,
            random_label_order: false,
            seed: None,
            verbosity: 0,
            truncate_non_submodular: true,
            verify_cuts: true,
        }
    }

    pub fn set_max_iterations(&mut self, value: Option<usize>) -> &mut Self {
        self.max_iterations = value;
        self
    }

    pub fn set_random_label_order(&mut self, value: bool) -> &mut Self {
        self.random_label_order = value;
        self
    }

    pub fn set_seed(&mut self, value: Option<u64>) -> &mut Self {
        self.seed = value;
        self
    }

    pub fn set_verbosity(&mut self, value: u8) -> &mut Self {
        self.verbosity = value;
        self
    }

    pub fn set_truncate_non_submodular(&mut self, value: bool) -> &mut Self {
        self.truncate_non_submodular = value;
        self
    }

    pub fn set_verify_cuts(&mut self, value: bool) -> &mut Self {
        self.verify_cuts = value;
        self
    }

    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    pub fn random_label_order(&self) -> bool {
        self.random_label_order
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn truncate_non_submodular(&self) -> bool {
        self.truncate_non_submodular
    }

    pub fn verify_cuts(&self) -> bool {
        self.verify_cuts
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Converged,
    IterationLimitReached,
}

// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Converged,
    IterationLimitReached,
}

impl From<RunStatus> for EngineState {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Converged => EngineState::Converged,
            RunStatus::IterationLimitReached => EngineState::IterationLimitReached,
        }
    }
}

// Outcome of an expansion or swap run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub status: RunStatus,
    pub passes: usize,
    pub accepted_moves: usize,
    pub energy: EnergyBreakdown,
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} after {} passes and {} accepted moves, energy {}",
            self.status, self.passes, self.accepted_moves, self.energy
        )
    }
}
