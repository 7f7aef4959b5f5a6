//! Evolver - genetic optimization of computation-graph parameters.
//!
//! The evolver tunes named parameters ("genes") of an external computation
//! graph so that one designated output, the fitness, is maximized or
//! minimized. Candidates are written into the graph one at a time, the
//! affected nodes are recomputed in topological order and the fitness is read
//! back.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, gene descriptors and run records
//! - `compute`: The evolver engine and an in-memory parameter graph
//!
//! # Example
//!
//! ```rust,no_run
//! use evolver::{
//!     compute::{ParameterGraph, evolution::{Evolver, collect_genes}},
//!     schema::{EvolverConfig, Genotype, NumberKind, ParameterInfo},
//! };
//!
//! let mut graph = ParameterGraph::new();
//! graph.add_parameter(
//!     "gain",
//!     ParameterInfo::Number { kind: NumberKind::Float, min: 0.0, max: 4.0, value: 1.0 },
//! );
//! graph.add_node("score", &["gain"], |v| Ok(vec![4.0 - (v.number("gain")? - 3.0).abs()]));
//! graph.link_fitness("score");
//!
//! let genes = collect_genes(&graph, &Genotype::All).unwrap();
//! let config = EvolverConfig { population_size: 30, iterations: 40, ..Default::default() };
//! let mut evolver = Evolver::new(config, genes).unwrap();
//! let record = evolver
//!     .run_with_callback(&mut graph, None, |p| {
//!         println!("Generation {}: best fitness = {:.3}", p.iteration, p.best_fitness);
//!     })
//!     .unwrap();
//!
//! println!("{}", record.stop_reason);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::ParameterGraph;
pub use compute::evolution::{EvolutionStore, Evolver, EvolverError};
pub use schema::{EvolutionRecord, EvolverConfig, FitnessMode, GeneDescriptor};
