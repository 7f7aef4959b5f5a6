//! In-memory parameter graph implementing [`EvaluationTarget`].
//!
//! Parameters hold gene-capable values; compute nodes read parameters and
//! other nodes' outputs and produce a list of numbers. One node is linked as
//! the fitness output.

use std::collections::{HashMap, HashSet, VecDeque};

use log::warn;

use crate::compute::evolution::{EvaluationTarget, FitnessReading, GeneParameter, TargetError};
use crate::schema::{ListValues, NumberKind, ParameterInfo, ParameterValue};

/// Node computation: reads the graph, returns the node's output list.
pub type NodeFn = Box<dyn FnMut(&GraphValues<'_>) -> Result<Vec<f64>, String>>;

struct Parameter {
    name: String,
    frame: Option<String>,
    info: ParameterInfo,
    /// Reordered copy of a `List` parameter; its base values stay untouched.
    reordered: Option<ListValues>,
}

impl Parameter {
    /// Current value of a `List` parameter as seen by compute nodes.
    fn list(&self) -> Option<&ListValues> {
        match &self.info {
            ParameterInfo::List { values } => Some(self.reordered.as_ref().unwrap_or(values)),
            _ => None,
        }
    }
}

struct ComputeNode {
    name: String,
    inputs: Vec<String>,
    compute: NodeFn,
}

/// Read-only view of parameter values and node outputs.
pub struct GraphValues<'a> {
    parameters: &'a [Parameter],
    outputs: &'a HashMap<String, Vec<f64>>,
}

impl GraphValues<'_> {
    fn parameter(&self, name: &str) -> Result<&Parameter, String> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| format!("unknown parameter {name}"))
    }

    /// Value of a number parameter.
    pub fn number(&self, name: &str) -> Result<f64, String> {
        match &self.parameter(name)?.info {
            ParameterInfo::Number { value, .. } => Ok(*value),
            _ => Err(format!("{name} is not a number")),
        }
    }

    /// Values of a number list parameter, reordered for `List` parameters.
    pub fn numbers(&self, name: &str) -> Result<&[f64], String> {
        let parameter = self.parameter(name)?;
        match (parameter.list(), &parameter.info) {
            (Some(ListValues::Numbers(items)), _)
            | (None, ParameterInfo::NumberRange { values: items, .. }) => Ok(items),
            _ => Err(format!("{name} is not a number list")),
        }
    }

    /// Values of a vector list parameter, reordered for `List` parameters.
    pub fn vectors(&self, name: &str) -> Result<&[[f64; 3]], String> {
        let parameter = self.parameter(name)?;
        match (parameter.list(), &parameter.info) {
            (Some(ListValues::Vectors(items)), _)
            | (None, ParameterInfo::VectorRange { values: items, .. }) => Ok(items),
            _ => Err(format!("{name} is not a vector list")),
        }
    }

    /// Last output of a compute node.
    pub fn output(&self, node: &str) -> Result<&[f64], String> {
        self.outputs
            .get(node)
            .map(Vec::as_slice)
            .ok_or_else(|| format!("node {node} has no output"))
    }
}

/// A small dependency graph of parameters and compute nodes.
pub struct ParameterGraph {
    parameters: Vec<Parameter>,
    nodes: Vec<ComputeNode>,
    outputs: HashMap<String, Vec<f64>>,
    fitness_node: Option<String>,
    auto_recompute: bool,
    recompute_count: usize,
}

impl Default for ParameterGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterGraph {
    /// Create an empty graph with auto-recompute on.
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
            nodes: Vec::new(),
            outputs: HashMap::new(),
            fitness_node: None,
            auto_recompute: true,
            recompute_count: 0,
        }
    }

    /// Add a parameter outside any frame.
    pub fn add_parameter(&mut self, name: &str, info: ParameterInfo) {
        self.push_parameter(name, None, info);
    }

    /// Add a parameter inside a named frame.
    pub fn add_parameter_in_frame(&mut self, name: &str, frame: &str, info: ParameterInfo) {
        self.push_parameter(name, Some(frame.to_string()), info);
    }

    fn push_parameter(&mut self, name: &str, frame: Option<String>, info: ParameterInfo) {
        self.parameters.retain(|p| p.name != name);
        self.parameters.push(Parameter {
            name: name.to_string(),
            frame,
            info,
            reordered: None,
        });
    }

    /// Remove a parameter.
    pub fn remove_parameter(&mut self, name: &str) {
        self.parameters.retain(|p| p.name != name);
    }

    /// Add a compute node reading `inputs` (parameters or other nodes).
    pub fn add_node<F>(&mut self, name: &str, inputs: &[&str], compute: F)
    where
        F: FnMut(&GraphValues<'_>) -> Result<Vec<f64>, String> + 'static,
    {
        self.nodes.retain(|n| n.name != name);
        self.nodes.push(ComputeNode {
            name: name.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            compute: Box::new(compute),
        });
    }

    /// Use a node's output as fitness.
    pub fn link_fitness(&mut self, node: &str) {
        self.fitness_node = Some(node.to_string());
    }

    /// Disconnect the fitness output.
    pub fn unlink_fitness(&mut self) {
        self.fitness_node = None;
    }

    /// Number of node recomputations so far.
    pub fn recompute_count(&self) -> usize {
        self.recompute_count
    }

    fn parameter_mut(&mut self, name: &str) -> Result<&mut Parameter, TargetError> {
        self.parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| TargetError::UnknownParameter(name.to_string()))
    }

    /// Nodes reading any of `sources`, directly or transitively.
    fn downstream(&self, sources: &[String]) -> HashSet<String> {
        let mut reached: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<&str> = sources.iter().map(String::as_str).collect();

        while let Some(current) = queue.pop_front() {
            for node in &self.nodes {
                if node.inputs.iter().any(|i| i == current) && reached.insert(node.name.clone()) {
                    queue.push_back(&node.name);
                }
            }
        }
        reached
    }
}

impl EvaluationTarget for ParameterGraph {
    fn gene_parameters(&self) -> Vec<GeneParameter> {
        self.parameters
            .iter()
            .map(|p| GeneParameter {
                name: p.name.clone(),
                frame: p.frame.clone(),
            })
            .collect()
    }

    fn get(&self, name: &str) -> Result<ParameterInfo, TargetError> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.info.clone())
            .ok_or_else(|| TargetError::UnknownParameter(name.to_string()))
    }

    fn set(&mut self, name: &str, value: ParameterValue) -> Result<(), TargetError> {
        let parameter = self.parameter_mut(name)?;
        let mismatch = |expected| TargetError::ValueMismatch {
            name: name.to_string(),
            expected,
        };

        match (&mut parameter.info, value) {
            (
                ParameterInfo::Number {
                    kind: NumberKind::Int,
                    value,
                    ..
                },
                ParameterValue::Int(v),
            ) => *value = v as f64,
            (
                ParameterInfo::Number {
                    kind: NumberKind::Float,
                    value,
                    ..
                },
                ParameterValue::Float(v),
            ) => *value = v,
            (ParameterInfo::Number { .. }, _) => return Err(mismatch("number")),
            (
                ParameterInfo::List {
                    values: ListValues::Numbers(base),
                },
                ParameterValue::Numbers(v),
            ) if base.len() == v.len() => parameter.reordered = Some(ListValues::Numbers(v)),
            (
                ParameterInfo::List {
                    values: ListValues::Vectors(base),
                },
                ParameterValue::Vectors(v),
            ) if base.len() == v.len() => parameter.reordered = Some(ListValues::Vectors(v)),
            (ParameterInfo::NumberRange { values: items, .. }, ParameterValue::Numbers(v)) => {
                *items = v
            }
            (ParameterInfo::VectorRange { values: items, .. }, ParameterValue::Vectors(v)) => {
                *items = v
            }
            _ => return Err(mismatch("list")),
        }

        if self.auto_recompute {
            for node in self.topological_sort(&[name.to_string()])? {
                self.recompute(&node, true)?;
            }
        }
        Ok(())
    }

    fn topological_sort(&self, roots: &[String]) -> Result<Vec<String>, TargetError> {
        let affected = self.downstream(roots);

        // Kahn's algorithm over the affected nodes, ties in insertion order.
        let mut pending: HashMap<&str, usize> = self
            .nodes
            .iter()
            .filter(|n| affected.contains(&n.name))
            .map(|n| {
                let deps = n.inputs.iter().filter(|i| affected.contains(*i)).count();
                (n.name.as_str(), deps)
            })
            .collect();

        let mut order = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = self
                .nodes
                .iter()
                .find(|n| pending.get(n.name.as_str()) == Some(&0))
                .ok_or(TargetError::Cycle)?;
            pending.remove(ready.name.as_str());
            for node in &self.nodes {
                if let Some(count) = pending.get_mut(node.name.as_str()) {
                    *count -= node.inputs.iter().filter(|i| **i == ready.name).count();
                }
            }
            order.push(ready.name.clone());
        }
        Ok(order)
    }

    fn recompute(&mut self, node: &str, suppress_errors: bool) -> Result<(), TargetError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.name == node)
            .ok_or_else(|| TargetError::UnknownNode(node.to_string()))?;

        self.recompute_count += 1;
        let values = GraphValues {
            parameters: &self.parameters,
            outputs: &self.outputs,
        };
        let result = (self.nodes[index].compute)(&values);

        match result {
            Ok(output) => {
                self.outputs.insert(node.to_string(), output);
                Ok(())
            }
            Err(message) if suppress_errors => {
                warn!("Node {} failed: {}", node, message);
                self.outputs.insert(node.to_string(), Vec::new());
                Ok(())
            }
            Err(message) => Err(TargetError::Recompute {
                node: node.to_string(),
                message,
            }),
        }
    }

    fn fitness_linked(&self) -> bool {
        self.fitness_node.is_some()
    }

    fn read_fitness(&self) -> Result<FitnessReading, TargetError> {
        let node = self
            .fitness_node
            .as_ref()
            .ok_or(TargetError::FitnessNotLinked)?;
        let output = self
            .outputs
            .get(node)
            .ok_or_else(|| TargetError::UnknownNode(node.clone()))?;
        Ok(FitnessReading::List(output.clone()))
    }

    fn auto_recompute(&self) -> bool {
        self.auto_recompute
    }

    fn set_auto_recompute(&mut self, enabled: bool) {
        self.auto_recompute = enabled;
    }
}
