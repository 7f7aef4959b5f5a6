//! Gene variation operators for evolutionary search.
//!
//! Provides random generation, crossover, and mutation for every gene kind.
//! All draws go through one seeded stream so a run is reproducible.

use rand::prelude::*;

use crate::schema::{GeneDescriptor, GeneKind, GeneValue, NumberKind};

/// Random number generator wrapper for gene operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// Access the underlying generator for distribution sampling.
    pub fn inner(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Sample a fresh value anywhere in the gene's domain.
    pub fn random_variation(&mut self, gene: &GeneDescriptor) -> GeneValue {
        match &gene.kind {
            GeneKind::Number { kind, min, max, .. } => {
                GeneValue::Number(self.uniform(*kind, *min, *max))
            }
            GeneKind::Permutation { values } => {
                let mut order: Vec<usize> = (0..values.len()).collect();
                order.shuffle(&mut self.rng);
                GeneValue::Permutation(order)
            }
            GeneKind::MultiNumber {
                kind,
                min,
                max,
                initial,
            } => GeneValue::Numbers(
                (0..initial.len())
                    .map(|_| self.uniform(*kind, *min, *max))
                    .collect(),
            ),
            GeneKind::MultiVector {
                mins,
                maxs,
                initial,
            } => GeneValue::Vectors(
                (0..initial.len())
                    .map(|_| {
                        let mut v = [0.0; 3];
                        for j in 0..3 {
                            v[j] = self.uniform(NumberKind::Float, mins[j], maxs[j]);
                        }
                        v
                    })
                    .collect(),
            ),
        }
    }

    /// Combine two parent values into a child value.
    ///
    /// Numbers and vectors are blended with a fresh mixing factor per element
    /// and kept inside the gene's bounds.
    /// Permutations keep a random-length prefix of `a` and append the rest in
    /// the order they appear in `b`. Values of the wrong shape for `gene` are
    /// replaced by a fresh random variation.
    pub fn cross(&mut self, gene: &GeneDescriptor, a: &GeneValue, b: &GeneValue) -> GeneValue {
        match (&gene.kind, a, b) {
            (GeneKind::Number { kind, min, max, .. }, GeneValue::Number(x), GeneValue::Number(y)) => {
                let m = self.unit();
                GeneValue::Number(truncate(*kind, clamp(blend(*x, *y, m), *min, *max)))
            }
            (GeneKind::Permutation { .. }, GeneValue::Permutation(x), GeneValue::Permutation(y)) => {
                let k = (self.unit() * x.len() as f64) as usize;
                GeneValue::Permutation(ordered_crossover(x, y, k))
            }
            (
                GeneKind::MultiNumber { kind, min, max, .. },
                GeneValue::Numbers(x),
                GeneValue::Numbers(y),
            ) => {
                GeneValue::Numbers(
                    x.iter()
                        .zip(y)
                        .map(|(&p, &q)| {
                            let m = self.unit();
                            truncate(*kind, clamp(blend(p, q, m), *min, *max))
                        })
                        .collect(),
                )
            }
            (
                GeneKind::MultiVector { mins, maxs, .. },
                GeneValue::Vectors(x),
                GeneValue::Vectors(y),
            ) => {
                GeneValue::Vectors(
                    x.iter()
                        .zip(y)
                        .map(|(p, q)| {
                            let mut v = [0.0; 3];
                            for j in 0..3 {
                                let m = self.unit();
                                v[j] = clamp(blend(p[j], q[j], m), mins[j], maxs[j]);
                            }
                            v
                        })
                        .collect(),
                )
            }
            _ => self.random_variation(gene),
        }
    }

    /// Nudge a value by up to half of `range * factor`, clamped to bounds.
    ///
    /// Permutations instead get `max(factor * 100, 1)` random swaps.
    pub fn small_mutation(
        &mut self,
        gene: &GeneDescriptor,
        value: GeneValue,
        factor: f64,
    ) -> GeneValue {
        match (&gene.kind, value) {
            (GeneKind::Number { kind, min, max, .. }, GeneValue::Number(v)) => {
                let shifted = v + (self.unit() - 0.5) * (max - min) * factor;
                GeneValue::Number(truncate(*kind, clamp(shifted, *min, *max)))
            }
            (GeneKind::Permutation { .. }, GeneValue::Permutation(mut order)) => {
                let swaps = (factor * 100.0).max(1.0) as usize;
                if !order.is_empty() {
                    for _ in 0..swaps {
                        let i = (self.unit() * order.len() as f64) as usize;
                        let j = (self.unit() * order.len() as f64) as usize;
                        order.swap(i, j);
                    }
                }
                GeneValue::Permutation(order)
            }
            (GeneKind::MultiNumber { kind, min, max, .. }, GeneValue::Numbers(items)) => {
                GeneValue::Numbers(
                    items
                        .into_iter()
                        .map(|v| {
                            let shifted = v + (self.unit() - 0.5) * (max - min) * factor;
                            truncate(*kind, clamp(shifted, *min, *max))
                        })
                        .collect(),
                )
            }
            (GeneKind::MultiVector { mins, maxs, .. }, GeneValue::Vectors(items)) => {
                GeneValue::Vectors(
                    items
                        .into_iter()
                        .map(|mut v| {
                            for j in 0..3 {
                                let shifted =
                                    v[j] + (self.unit() - 0.5) * (maxs[j] - mins[j]) * factor;
                                v[j] = clamp(shifted, mins[j], maxs[j]);
                            }
                            v
                        })
                        .collect(),
                )
            }
            (_, other) => other,
        }
    }

    /// Uniform value in `[min, max)`, truncated for integer genes.
    fn uniform(&mut self, kind: NumberKind, min: f64, max: f64) -> f64 {
        truncate(kind, min + self.unit() * (max - min))
    }
}

/// Weighted blend: `a * m + b * (1 - m)`.
fn blend(a: f64, b: f64, m: f64) -> f64 {
    a * m + b * (1.0 - m)
}

/// Integer genes truncate toward zero after every arithmetic step.
fn truncate(kind: NumberKind, value: f64) -> f64 {
    match kind {
        NumberKind::Int => value.trunc(),
        NumberKind::Float => value,
    }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// First `k` items of `a`, then the items of `b` not taken yet, in `b`'s order.
pub fn ordered_crossover(a: &[usize], b: &[usize], k: usize) -> Vec<usize> {
    let k = k.min(a.len());
    let mut child: Vec<usize> = a[..k].to_vec();
    let mut taken = vec![false; a.len().max(b.len())];
    for &i in &child {
        if let Some(slot) = taken.get_mut(i) {
            *slot = true;
        }
    }
    for &i in b {
        if let Some(slot) = taken.get_mut(i)
            && !*slot
        {
            *slot = true;
            child.push(i);
        }
    }
    child
}

/// True if `order` is a bijection on `[0, order.len())`.
pub fn is_permutation(order: &[usize]) -> bool {
    let mut seen = vec![false; order.len()];
    order.iter().all(|&i| {
        if i >= seen.len() || seen[i] {
            false
        } else {
            seen[i] = true;
            true
        }
    })
}
