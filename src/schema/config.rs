//! Configuration types for an evolver run.

use serde::{Deserialize, Serialize};

use super::GeneDescriptor;

/// Whether fitness is maximized or minimized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FitnessMode {
    #[default]
    Max,
    Min,
}

impl FitnessMode {
    /// True if `candidate` is strictly better than `goal` in this mode.
    pub fn beats(self, candidate: f64, goal: f64) -> bool {
        match self {
            FitnessMode::Max => candidate > goal,
            FitnessMode::Min => candidate < goal,
        }
    }
}

/// Which gene parameters of the target take part in the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Genotype {
    /// Every gene parameter of the target.
    #[default]
    All,
    /// Only gene parameters placed inside the named frame.
    Frame(String),
}

/// Top-level evolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolverConfig {
    /// Number of chromosomes per generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Number of generations, including the final evaluation pass.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Seed for the run's random stream.
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    /// Per-gene mutation probability, also used as the mutation strength.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Exponent applied to fitness when building selection weights.
    #[serde(default = "default_selection_pressure")]
    pub selection_pressure: u32,
    /// Maximize or minimize fitness.
    #[serde(default)]
    pub mode: FitnessMode,
    /// Wall-clock budget, checked once per generation.
    #[serde(default = "default_max_time_seconds")]
    pub max_time_seconds: f64,
    /// Stop as soon as the best fitness beats this value.
    #[serde(default)]
    pub goal: Option<f64>,
    /// Seed the population from the previous run when the genotype is unchanged.
    #[serde(default)]
    pub reuse_population: bool,
    /// Output every generation instead of only the last one.
    #[serde(default)]
    pub output_all: bool,
    /// Gene parameters taking part in the run.
    #[serde(default)]
    pub genotype: Genotype,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            iterations: default_iterations(),
            random_seed: default_random_seed(),
            mutation_rate: default_mutation_rate(),
            selection_pressure: default_selection_pressure(),
            mode: FitnessMode::default(),
            max_time_seconds: default_max_time_seconds(),
            goal: None,
            reuse_population: false,
            output_all: false,
            genotype: Genotype::default(),
        }
    }
}

fn default_population_size() -> usize {
    20
}
fn default_iterations() -> usize {
    1
}
fn default_random_seed() -> u64 {
    1
}
fn default_mutation_rate() -> f64 {
    0.01
}
fn default_selection_pressure() -> u32 {
    3
}
fn default_max_time_seconds() -> f64 {
    10.0
}

impl EvolverConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), EvolverConfigError> {
        if self.population_size == 0 {
            return Err(EvolverConfigError::EmptyPopulation);
        }
        if self.iterations == 0 {
            return Err(EvolverConfigError::NoIterations);
        }
        if self.selection_pressure < 1 {
            return Err(EvolverConfigError::InvalidSelectionPressure);
        }
        if !(self.mutation_rate >= 0.0) {
            return Err(EvolverConfigError::InvalidMutationRate(self.mutation_rate));
        }
        if !(self.max_time_seconds > 0.0) {
            return Err(EvolverConfigError::InvalidMaxTime(self.max_time_seconds));
        }
        Ok(())
    }

    /// Validate the gene descriptors a run would use.
    pub fn validate_genes(genes: &[GeneDescriptor]) -> Result<(), EvolverConfigError> {
        match genes.iter().find(|g| !g.has_valid_bounds()) {
            Some(gene) => Err(EvolverConfigError::InvalidBounds(gene.name.clone())),
            None => Ok(()),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolverConfigError {
    #[error("Population size must be at least 1")]
    EmptyPopulation,
    #[error("Iterations must be at least 1")]
    NoIterations,
    #[error("Selection pressure must be at least 1")]
    InvalidSelectionPressure,
    #[error("Mutation rate must be non-negative, got {0}")]
    InvalidMutationRate(f64),
    #[error("Max time must be positive, got {0}")]
    InvalidMaxTime(f64),
    #[error("Gene {0} has min greater than max")]
    InvalidBounds(String),
}
