//! Genetic optimizer for the parameters of an external computation graph.
//!
//! # Overview
//!
//! - **Genome Operations** (`genome`): seeded random draws, crossover and
//!   mutation per gene kind
//! - **Chromosomes** (`chromosome`): one candidate and its fitness
//! - **Fitness** (`fitness`): the [`EvaluationTarget`] boundary
//! - **Search** (`search`): population manager and the evolve loop
//! - **Archive** (`archive`): run records, memory strings and files
//!
//! # Example
//!
//! ```rust,no_run
//! use evolver::compute::ParameterGraph;
//! use evolver::compute::evolution::{EvolutionStore, apply_fittest, run};
//! use evolver::schema::{EvolverConfig, NumberKind, ParameterInfo};
//!
//! let mut graph = ParameterGraph::new();
//! graph.add_parameter(
//!     "x",
//!     ParameterInfo::Number { kind: NumberKind::Float, min: -5.0, max: 5.0, value: 0.0 },
//! );
//! graph.add_node("score", &["x"], |v| {
//!     let x = v.number("x")?;
//!     Ok(vec![1.0 / (1.0 + (x - 2.0).powi(2))])
//! });
//! graph.link_fitness("score");
//!
//! let config = EvolverConfig { iterations: 50, ..Default::default() };
//! let mut store = EvolutionStore::new();
//! let outcome = run(&config, &mut graph, &mut store, "evolver-1").unwrap();
//! println!("{}", outcome.info());
//!
//! if let Some(record) = outcome.record() {
//!     apply_fittest(record, &mut graph).unwrap();
//! }
//! ```

mod archive;
mod chromosome;
mod error;
mod fitness;
mod genome;
mod search;

pub use archive::{EvolutionStore, MemoryExport, decode_memory, encode_memory};
pub use chromosome::Chromosome;
pub use error::{EvolverError, EvolverResult, TargetError};
pub use fitness::{
    EvaluationTarget, FitnessReading, GeneParameter, ManualRecompute, apply_to_target,
};
pub use genome::{GenomeRng, is_permutation, ordered_crossover};
pub use search::{
    Evolver, apply_fittest, collect_genes, run, sample_parents, selection_weights,
};
