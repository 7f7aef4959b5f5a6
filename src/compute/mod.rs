//! Compute module - the evolver engine and an in-memory evaluation target.

pub mod evolution;
mod graph;

pub use graph::*;
