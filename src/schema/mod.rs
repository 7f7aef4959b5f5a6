//! Schema module - Configuration, gene and record types for the evolver.

mod config;
mod gene;
mod record;

pub use config::*;
pub use gene::*;
pub use record::*;
