//! Chromosome: one candidate solution and its fitness.

use crate::schema::{ChromosomeValues, GeneDescriptor};

use super::error::EvolverError;
use super::fitness::{EvaluationTarget, ManualRecompute, apply_to_target};
use super::genome::GenomeRng;

/// Probability of a full gene reset once a gene has been picked for mutation.
const RESET_CHANCE: f64 = 0.5;

/// A candidate: gene values index-aligned with the descriptors, plus fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    /// Gene values.
    pub values: ChromosomeValues,
    /// Fitness score; 0 until evaluated.
    pub fitness: f64,
}

impl Chromosome {
    /// Wrap existing gene values.
    pub fn from_values(values: ChromosomeValues) -> Self {
        Self {
            values,
            fitness: 0.0,
        }
    }

    /// Fill one value per gene, either at random or with the baseline values.
    pub fn fill(genes: &[GeneDescriptor], use_random: bool, rng: &mut GenomeRng) -> Self {
        let values = genes
            .iter()
            .map(|gene| {
                if use_random {
                    rng.random_variation(gene)
                } else {
                    gene.initial_value()
                }
            })
            .collect();
        Self::from_values(values)
    }

    /// Apply the genes to the target, recompute `execution_order` and read fitness.
    ///
    /// Auto-recompute is held off while genes are written and restored before
    /// the explicit recomputation, including when a write fails. Recompute
    /// errors propagate to the caller.
    pub fn evaluate<T: EvaluationTarget + ?Sized>(
        &mut self,
        genes: &[GeneDescriptor],
        target: &mut T,
        execution_order: &[String],
    ) -> Result<f64, EvolverError> {
        {
            let mut manual = ManualRecompute::new(&mut *target);
            for (gene, value) in genes.iter().zip(&self.values) {
                apply_to_target(gene, &mut *manual, value)?;
            }
        }

        for node in execution_order {
            target.recompute(node, false)?;
        }

        let fitness = target.read_fitness()?.into_fitness()?;
        self.fitness = fitness;
        Ok(fitness)
    }

    /// Produce a child with `other`.
    ///
    /// Per gene: with probability `mutation_rate` the gene either resets to a
    /// random value (half the time) or is crossed and then slightly mutated;
    /// otherwise it is crossed only.
    pub fn cross_over(
        &self,
        other: &Chromosome,
        genes: &[GeneDescriptor],
        mutation_rate: f64,
        rng: &mut GenomeRng,
    ) -> Chromosome {
        let values = genes
            .iter()
            .zip(self.values.iter().zip(&other.values))
            .map(|(gene, (a, b))| {
                if rng.unit() < mutation_rate {
                    if rng.unit() < RESET_CHANCE {
                        rng.random_variation(gene)
                    } else {
                        let crossed = rng.cross(gene, a, b);
                        rng.small_mutation(gene, crossed, mutation_rate)
                    }
                } else {
                    rng.cross(gene, a, b)
                }
            })
            .collect();

        Chromosome::from_values(values)
    }
}
