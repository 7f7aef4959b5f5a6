//! Error types for the evolver engine.

use crate::schema::{EvolverConfigError, FitnessMode};

/// Errors raised by an evaluation target.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("Unknown node: {0}")]
    UnknownNode(String),
    #[error("Value for {name} does not match its kind (expected {expected})")]
    ValueMismatch { name: String, expected: &'static str },
    #[error("Recompute of node {node} failed: {message}")]
    Recompute { node: String, message: String },
    #[error("Node graph contains a cycle")]
    Cycle,
    #[error("Fitness output is not linked")]
    FitnessNotLinked,
}

/// Top-level error type for evolver operations.
#[derive(Debug, thiserror::Error)]
pub enum EvolverError {
    #[error("Target error: {0}")]
    Target(#[from] TargetError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] EvolverConfigError),
    #[error("Invalid fitness value: {0}")]
    InvalidFitness(String),
    /// Zero fitness under `Min`, negative or all-zero weights under `Max`.
    #[error("Selection weights are not a probability distribution ({mode:?} mode, fitness {fitness:?})")]
    DegenerateWeights { mode: FitnessMode, fitness: Vec<f64> },
    #[error("Malformed evolver memory: {0}")]
    MemoryFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("No evolution record for run {0}")]
    NoRecord(String),
    #[error("Run id {0:?} cannot be used as a file name")]
    InvalidRunId(String),
}

/// Result type alias for evolver operations.
pub type EvolverResult<T> = Result<T, EvolverError>;
