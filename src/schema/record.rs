//! Run results: the evolution record and its status types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{GeneDescriptor, GeneValue};

/// Gene values of one chromosome, index-aligned with the descriptors.
pub type ChromosomeValues = Vec<GeneValue>;

/// Everything a finished run leaves behind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvolutionRecord {
    /// Descriptors the run used.
    pub genes: Vec<GeneDescriptor>,
    /// Sorted chromosome values, one entry per recorded generation.
    pub population_all: Vec<Vec<ChromosomeValues>>,
    /// Sorted fitness values, one entry per recorded generation.
    pub fitness_all: Vec<Vec<f64>>,
    /// Why the run stopped.
    pub stop_reason: StopReason,
}

impl EvolutionRecord {
    /// Final (sorted) population, fittest first.
    pub fn population(&self) -> &[ChromosomeValues] {
        self.population_all.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fitness of the final population.
    pub fn fitness(&self) -> &[f64] {
        self.fitness_all.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fittest chromosome of the final population.
    pub fn fittest(&self) -> Option<(&ChromosomeValues, f64)> {
        let values = self.population().first()?;
        let fitness = self.fitness().first().copied()?;
        Some((values, fitness))
    }

    /// Number of recorded generations.
    pub fn generations(&self) -> usize {
        self.population_all.len()
    }

    /// Gene names in descriptor order.
    pub fn gene_names(&self) -> Vec<String> {
        self.genes.iter().map(|g| g.name.clone()).collect()
    }

    /// Node outputs: every generation, or only the last one wrapped in a list.
    pub fn outputs(&self, output_all: bool) -> EvolverOutputs {
        let (population, fitness) = if output_all {
            (self.population_all.clone(), self.fitness_all.clone())
        } else {
            (
                vec![self.population().to_vec()],
                vec![self.fitness().to_vec()],
            )
        };

        EvolverOutputs {
            genes: self.gene_names(),
            population,
            fitness,
        }
    }
}

/// Output sockets of the evolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EvolverOutputs {
    pub genes: Vec<String>,
    pub population: Vec<Vec<ChromosomeValues>>,
    pub fitness: Vec<Vec<f64>>,
}

/// Reason a run stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Ran every iteration.
    Completed,
    /// Best fitness beat the goal after `iterations` generations.
    GoalReached { iterations: usize },
    /// Wall-clock budget exceeded after `iterations` generations.
    TimeLimit { iterations: usize },
    /// Rebuilt from a stored memory string.
    Restored,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Completed => write!(f, "Evolver Runned"),
            StopReason::GoalReached { iterations } => {
                write!(f, "Goal achieved in {} iterations", iterations)
            }
            StopReason::TimeLimit { iterations } => {
                write!(f, "Max. time reached in {} iterations", iterations)
            }
            StopReason::Restored => write!(f, "Restored from memory"),
        }
    }
}

/// Result of asking the evolver to run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No fitness source is linked; nothing was run.
    NotConfigured,
    /// The run finished and its record was stored.
    Finished(EvolutionRecord),
}

impl RunOutcome {
    /// The record, if the run happened.
    pub fn record(&self) -> Option<&EvolutionRecord> {
        match self {
            RunOutcome::NotConfigured => None,
            RunOutcome::Finished(record) => Some(record),
        }
    }

    /// Status line shown to the user.
    pub fn info(&self) -> String {
        match self {
            RunOutcome::NotConfigured => "Stopped - Fitness not linked".to_string(),
            RunOutcome::Finished(record) => record.stop_reason.to_string(),
        }
    }
}

/// Progress update sent once per generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationProgress {
    /// Zero-based generation index.
    pub iteration: usize,
    /// Seconds since the run started.
    pub elapsed_seconds: f64,
    /// Best fitness of this generation.
    pub best_fitness: f64,
}
