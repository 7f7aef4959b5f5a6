//! Boundary between the evolver and the computation it optimizes.
//!
//! The evolver never computes fitness itself. It writes gene values into an
//! [`EvaluationTarget`], asks the target to recompute the affected nodes in a
//! precomputed order, and reads back a single number.

use std::ops::{Deref, DerefMut};

use crate::schema::{GeneDescriptor, GeneValue, ParameterInfo, ParameterValue};

use super::error::{EvolverError, TargetError};

/// A gene-capable parameter exposed by a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneParameter {
    /// Parameter name.
    pub name: String,
    /// Frame the parameter sits in, if any.
    pub frame: Option<String>,
}

/// Raw value read from the fitness output.
#[derive(Debug, Clone, PartialEq)]
pub enum FitnessReading {
    Scalar(f64),
    List(Vec<f64>),
}

impl FitnessReading {
    /// Unwrap to a single number; lists yield their first item.
    pub fn into_fitness(self) -> Result<f64, EvolverError> {
        match self {
            FitnessReading::Scalar(value) => Ok(value),
            FitnessReading::List(items) => items
                .first()
                .copied()
                .ok_or_else(|| EvolverError::InvalidFitness("empty fitness output".to_string())),
        }
    }
}

/// External computation graph driven by the evolver.
///
/// Implementations are mutated by evaluation, so only one chromosome's genes
/// are live on a target at a time.
pub trait EvaluationTarget {
    /// Gene-capable parameters, in target order.
    fn gene_parameters(&self) -> Vec<GeneParameter>;

    /// Current description of a parameter.
    fn get(&self, name: &str) -> Result<ParameterInfo, TargetError>;

    /// Write a parameter value.
    fn set(&mut self, name: &str, value: ParameterValue) -> Result<(), TargetError>;

    /// Nodes affected by the given parameters, in dependency order.
    fn topological_sort(&self, roots: &[String]) -> Result<Vec<String>, TargetError>;

    /// Recompute one node from its current inputs.
    fn recompute(&mut self, node: &str, suppress_errors: bool) -> Result<(), TargetError>;

    /// Whether a fitness source is connected.
    fn fitness_linked(&self) -> bool;

    /// Read the fitness output.
    fn read_fitness(&self) -> Result<FitnessReading, TargetError>;

    /// Whether writes trigger recomputation immediately.
    fn auto_recompute(&self) -> bool;

    fn set_auto_recompute(&mut self, enabled: bool);
}

/// Suspends a target's auto-recompute flag until dropped.
pub struct ManualRecompute<'a, T: EvaluationTarget + ?Sized> {
    target: &'a mut T,
    previous: bool,
}

impl<'a, T: EvaluationTarget + ?Sized> ManualRecompute<'a, T> {
    pub fn new(target: &'a mut T) -> Self {
        let previous = target.auto_recompute();
        target.set_auto_recompute(false);
        Self { target, previous }
    }
}

impl<T: EvaluationTarget + ?Sized> Deref for ManualRecompute<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.target
    }
}

impl<T: EvaluationTarget + ?Sized> DerefMut for ManualRecompute<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.target
    }
}

impl<T: EvaluationTarget + ?Sized> Drop for ManualRecompute<'_, T> {
    fn drop(&mut self) {
        self.target.set_auto_recompute(self.previous);
    }
}

/// Write one gene value into its target parameter.
pub fn apply_to_target<T: EvaluationTarget + ?Sized>(
    gene: &GeneDescriptor,
    target: &mut T,
    value: &GeneValue,
) -> Result<(), TargetError> {
    let parameter = gene
        .to_parameter_value(value)
        .ok_or_else(|| TargetError::ValueMismatch {
            name: gene.name.clone(),
            expected: kind_name(gene),
        })?;
    target.set(&gene.name, parameter)
}

fn kind_name(gene: &GeneDescriptor) -> &'static str {
    use crate::schema::GeneKind;
    match gene.kind {
        GeneKind::Number { .. } => "number",
        GeneKind::Permutation { .. } => "permutation",
        GeneKind::MultiNumber { .. } => "number list",
        GeneKind::MultiVector { .. } => "vector list",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::ParameterGraph;
    use crate::schema::NumberKind;

    #[test]
    fn test_reading_unwraps_lists() {
        assert_eq!(FitnessReading::Scalar(2.0).into_fitness().unwrap(), 2.0);
        assert_eq!(
            FitnessReading::List(vec![3.0, 9.0]).into_fitness().unwrap(),
            3.0
        );
        assert!(matches!(
            FitnessReading::List(Vec::new()).into_fitness(),
            Err(EvolverError::InvalidFitness(_))
        ));
    }

    #[test]
    fn test_manual_recompute_restores_flag() {
        let mut graph = ParameterGraph::new();
        assert!(graph.auto_recompute());
        {
            let guard = ManualRecompute::new(&mut graph);
            assert!(!guard.auto_recompute());
        }
        assert!(graph.auto_recompute());

        graph.set_auto_recompute(false);
        {
            let _guard = ManualRecompute::new(&mut graph);
        }
        assert!(!graph.auto_recompute());
    }

    #[test]
    fn test_apply_rejects_mismatched_value() {
        let mut graph = ParameterGraph::new();
        graph.add_parameter(
            "x",
            ParameterInfo::Number {
                kind: NumberKind::Float,
                min: 0.0,
                max: 1.0,
                value: 0.5,
            },
        );
        let gene = GeneDescriptor::from_parameter("x", graph.get("x").unwrap());

        apply_to_target(&gene, &mut graph, &GeneValue::Number(0.25)).unwrap();
        assert_eq!(
            graph.get("x").unwrap(),
            ParameterInfo::Number {
                kind: NumberKind::Float,
                min: 0.0,
                max: 1.0,
                value: 0.25,
            }
        );

        let err = apply_to_target(&gene, &mut graph, &GeneValue::Numbers(vec![1.0])).unwrap_err();
        assert!(matches!(err, TargetError::ValueMismatch { .. }));
    }
}
