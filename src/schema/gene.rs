//! Gene descriptor types: what the evolver is allowed to tune.
//!
//! A gene is bound to one named parameter of the external target. The
//! descriptor records the parameter's kind, its bounds and the value it held
//! when the descriptor was built (the baseline).

use serde::{Deserialize, Serialize};

/// Numeric kind of a scalar gene.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NumberKind {
    Int,
    #[default]
    Float,
}

/// Payload list reordered by a permutation gene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "items")]
pub enum ListValues {
    Numbers(Vec<f64>),
    Vectors(Vec<[f64; 3]>),
}

impl ListValues {
    /// Number of items in the list.
    pub fn len(&self) -> usize {
        match self {
            ListValues::Numbers(items) => items.len(),
            ListValues::Vectors(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reorder the list: item `i` of the result is item `order[i]` of `self`.
    ///
    /// Returns `None` if any index is out of range.
    pub fn reordered(&self, order: &[usize]) -> Option<ListValues> {
        match self {
            ListValues::Numbers(items) => order
                .iter()
                .map(|&i| items.get(i).copied())
                .collect::<Option<_>>()
                .map(ListValues::Numbers),
            ListValues::Vectors(items) => order
                .iter()
                .map(|&i| items.get(i).copied())
                .collect::<Option<_>>()
                .map(ListValues::Vectors),
        }
    }
}

/// Description of a target parameter, as reported by the target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ParameterInfo {
    /// A single number with bounds.
    Number {
        kind: NumberKind,
        min: f64,
        max: f64,
        value: f64,
    },
    /// A list whose order is tuned.
    List { values: ListValues },
    /// A list of bounded numbers.
    NumberRange {
        kind: NumberKind,
        min: f64,
        max: f64,
        values: Vec<f64>,
    },
    /// A list of bounded 3D vectors.
    VectorRange {
        mins: [f64; 3],
        maxs: [f64; 3],
        values: Vec<[f64; 3]>,
    },
}

/// A value written into a target parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ParameterValue {
    Int(i64),
    Float(f64),
    Numbers(Vec<f64>),
    Vectors(Vec<[f64; 3]>),
}

impl From<ListValues> for ParameterValue {
    fn from(values: ListValues) -> Self {
        match values {
            ListValues::Numbers(items) => ParameterValue::Numbers(items),
            ListValues::Vectors(items) => ParameterValue::Vectors(items),
        }
    }
}

/// Value of one gene inside a chromosome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GeneValue {
    Number(f64),
    Permutation(Vec<usize>),
    Numbers(Vec<f64>),
    Vectors(Vec<[f64; 3]>),
}

/// Variant-specific part of a gene descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GeneKind {
    Number {
        kind: NumberKind,
        min: f64,
        max: f64,
        initial: f64,
    },
    Permutation {
        values: ListValues,
    },
    MultiNumber {
        kind: NumberKind,
        min: f64,
        max: f64,
        initial: Vec<f64>,
    },
    MultiVector {
        mins: [f64; 3],
        maxs: [f64; 3],
        initial: Vec<[f64; 3]>,
    },
}

/// A tunable parameter of the external target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneDescriptor {
    /// Name of the target parameter this gene drives.
    pub name: String,
    /// Kind, bounds and baseline.
    pub kind: GeneKind,
}

impl GeneDescriptor {
    /// Build a descriptor from the parameter's current state.
    pub fn from_parameter(name: impl Into<String>, info: ParameterInfo) -> Self {
        let kind = match info {
            ParameterInfo::Number {
                kind,
                min,
                max,
                value,
            } => GeneKind::Number {
                kind,
                min,
                max,
                initial: value,
            },
            ParameterInfo::List { values } => GeneKind::Permutation { values },
            ParameterInfo::NumberRange {
                kind,
                min,
                max,
                values,
            } => GeneKind::MultiNumber {
                kind,
                min,
                max,
                initial: values,
            },
            ParameterInfo::VectorRange { mins, maxs, values } => GeneKind::MultiVector {
                mins,
                maxs,
                initial: values,
            },
        };

        Self {
            name: name.into(),
            kind,
        }
    }

    /// Scalar range (max - min) used to scale mutations.
    pub fn range(&self) -> Option<f64> {
        match &self.kind {
            GeneKind::Number { min, max, .. } | GeneKind::MultiNumber { min, max, .. } => {
                Some(max - min)
            }
            _ => None,
        }
    }

    /// Per-dimension ranges of a vector gene.
    pub fn vector_ranges(&self) -> Option<[f64; 3]> {
        match &self.kind {
            GeneKind::MultiVector { mins, maxs, .. } => {
                Some([maxs[0] - mins[0], maxs[1] - mins[1], maxs[2] - mins[2]])
            }
            _ => None,
        }
    }

    /// Value of the baseline chromosome for this gene.
    pub fn initial_value(&self) -> GeneValue {
        match &self.kind {
            GeneKind::Number { initial, .. } => GeneValue::Number(*initial),
            GeneKind::Permutation { values } => GeneValue::Permutation((0..values.len()).collect()),
            GeneKind::MultiNumber { initial, .. } => GeneValue::Numbers(initial.clone()),
            GeneKind::MultiVector { initial, .. } => GeneValue::Vectors(initial.clone()),
        }
    }

    /// Translate a gene value into what gets written to the target.
    ///
    /// Returns `None` when the value does not belong to this gene's kind.
    pub fn to_parameter_value(&self, value: &GeneValue) -> Option<ParameterValue> {
        match (&self.kind, value) {
            (GeneKind::Number { kind, .. }, GeneValue::Number(v)) => Some(match kind {
                NumberKind::Int => ParameterValue::Int(*v as i64),
                NumberKind::Float => ParameterValue::Float(*v),
            }),
            (GeneKind::Permutation { values }, GeneValue::Permutation(order))
                if order.len() == values.len() =>
            {
                values.reordered(order).map(Into::into)
            }
            (GeneKind::MultiNumber { .. }, GeneValue::Numbers(items)) => {
                Some(ParameterValue::Numbers(items.clone()))
            }
            (GeneKind::MultiVector { .. }, GeneValue::Vectors(items)) => {
                Some(ParameterValue::Vectors(items.clone()))
            }
            _ => None,
        }
    }

    /// Whether `other` drives the same parameter with the same shape.
    ///
    /// Compares name, kind, bounds and list lengths. Baseline values and the
    /// payload of a permutation gene are ignored: they follow whatever the
    /// target currently holds.
    pub fn same_genotype(&self, other: &GeneDescriptor) -> bool {
        if self.name != other.name {
            return false;
        }
        match (&self.kind, &other.kind) {
            (
                GeneKind::Number {
                    kind, min, max, ..
                },
                GeneKind::Number {
                    kind: k, min: lo, max: hi, ..
                },
            ) => kind == k && min == lo && max == hi,
            (GeneKind::Permutation { values }, GeneKind::Permutation { values: v }) => {
                matches!(
                    (values, v),
                    (ListValues::Numbers(_), ListValues::Numbers(_))
                        | (ListValues::Vectors(_), ListValues::Vectors(_))
                ) && values.len() == v.len()
            }
            (
                GeneKind::MultiNumber {
                    kind,
                    min,
                    max,
                    initial,
                },
                GeneKind::MultiNumber {
                    kind: k,
                    min: lo,
                    max: hi,
                    initial: init,
                },
            ) => kind == k && min == lo && max == hi && initial.len() == init.len(),
            (
                GeneKind::MultiVector {
                    mins,
                    maxs,
                    initial,
                },
                GeneKind::MultiVector {
                    mins: lo,
                    maxs: hi,
                    initial: init,
                },
            ) => mins == lo && maxs == hi && initial.len() == init.len(),
            _ => false,
        }
    }

    /// Bounds check used by validation.
    pub fn has_valid_bounds(&self) -> bool {
        match &self.kind {
            GeneKind::Number { min, max, .. } | GeneKind::MultiNumber { min, max, .. } => {
                min <= max
            }
            GeneKind::MultiVector { mins, maxs, .. } => (0..3).all(|j| mins[j] <= maxs[j]),
            GeneKind::Permutation { .. } => true,
        }
    }
}
