//! Evolution state store: run records keyed by run id.
//!
//! Records persist outside the store as a memory string: the gene names as
//! length-prefixed records (`<len>:<name>`), a `#`, then the JSON of
//! `[population_all, fitness_all]`. On disk the memory string sits in a small
//! JSON envelope.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::schema::{ChromosomeValues, EvolutionRecord, GeneDescriptor, StopReason};

use super::error::{EvolverError, EvolverResult, TargetError};
use super::fitness::EvaluationTarget;

const HISTORY_MARKER: char = '#';

/// Run records owned by the caller.
#[derive(Debug, Default)]
pub struct EvolutionStore {
    records: HashMap<String, EvolutionRecord>,
}

impl EvolutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless the run already has one.
    pub fn create(&mut self, run_id: &str, record: EvolutionRecord) -> bool {
        if self.records.contains_key(run_id) {
            return false;
        }
        self.records.insert(run_id.to_string(), record);
        true
    }

    /// Replace the run's record, returning the previous one.
    pub fn overwrite(&mut self, run_id: &str, record: EvolutionRecord) -> Option<EvolutionRecord> {
        self.records.insert(run_id.to_string(), record)
    }

    pub fn get(&self, run_id: &str) -> Option<&EvolutionRecord> {
        self.records.get(run_id)
    }

    /// Whether the run has been executed or restored.
    pub fn has(&self, run_id: &str) -> bool {
        self.records.contains_key(run_id)
    }

    pub fn remove(&mut self, run_id: &str) -> Option<EvolutionRecord> {
        self.records.remove(run_id)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Memory string of the run's record.
    pub fn memory(&self, run_id: &str) -> EvolverResult<String> {
        let record = self
            .get(run_id)
            .ok_or_else(|| EvolverError::NoRecord(run_id.to_string()))?;
        encode_memory(record)
    }

    /// Rebuild the run's record from a memory string.
    ///
    /// Does nothing when the run already has a record or the memory is
    /// empty. Returns whether a record was restored.
    pub fn restore<T: EvaluationTarget + ?Sized>(
        &mut self,
        run_id: &str,
        memory: &str,
        target: &T,
    ) -> EvolverResult<bool> {
        if self.has(run_id) || memory.is_empty() {
            return Ok(false);
        }
        let record = decode_memory(memory, target)?;
        info!(
            "Restored run {} with {} generations",
            run_id,
            record.generations()
        );
        self.records.insert(run_id.to_string(), record);
        Ok(true)
    }

    /// Save the run's record into `dir`.
    pub fn save<P: AsRef<Path>>(&self, run_id: &str, dir: P) -> EvolverResult<PathBuf> {
        let filename = record_filename(run_id)?;
        let export = MemoryExport {
            run_id: run_id.to_string(),
            memory: self.memory(run_id)?,
        };

        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(filename);
        fs::write(&path, serde_json::to_string_pretty(&export)?)?;

        Ok(path)
    }

    /// Load the run's record from `dir`, replacing any stored one.
    pub fn load<P: AsRef<Path>, T: EvaluationTarget + ?Sized>(
        &mut self,
        dir: P,
        run_id: &str,
        target: &T,
    ) -> EvolverResult<()> {
        let path = dir.as_ref().join(record_filename(run_id)?);
        let content = fs::read_to_string(&path)?;
        let export: MemoryExport = serde_json::from_str(&content)?;

        let record = decode_memory(&export.memory, target)?;
        self.records.insert(run_id.to_string(), record);
        Ok(())
    }
}

/// On-disk wrapper around a memory string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryExport {
    pub run_id: String,
    pub memory: String,
}

/// File name for a run's record; the id must not leave the record directory.
fn record_filename(run_id: &str) -> EvolverResult<String> {
    if run_id.is_empty()
        || run_id == "."
        || run_id == ".."
        || run_id.contains(['/', '\\', '\0'])
    {
        return Err(EvolverError::InvalidRunId(run_id.to_string()));
    }
    Ok(format!("{}.evolver.json", run_id))
}

/// Serialize a record's gene names and history.
pub fn encode_memory(record: &EvolutionRecord) -> EvolverResult<String> {
    let mut memory = String::new();
    for gene in &record.genes {
        memory.push_str(&format!("{}:{}", gene.name.len(), gene.name));
    }
    memory.push(HISTORY_MARKER);
    memory.push_str(&serde_json::to_string(&(
        &record.population_all,
        &record.fitness_all,
    ))?);
    Ok(memory)
}

fn split_names(memory: &str) -> EvolverResult<(Vec<String>, &str)> {
    let mut names = Vec::new();
    let mut rest = memory;

    loop {
        if let Some(history) = rest.strip_prefix(HISTORY_MARKER) {
            return Ok((names, history));
        }
        let (len, tail) = rest
            .split_once(':')
            .ok_or_else(|| EvolverError::MemoryFormat("missing history marker".to_string()))?;
        let len: usize = len
            .parse()
            .map_err(|_| EvolverError::MemoryFormat(format!("bad name length {len:?}")))?;
        let name = tail
            .get(..len)
            .ok_or_else(|| EvolverError::MemoryFormat("truncated gene name".to_string()))?;
        names.push(name.to_string());
        rest = &tail[len..];
    }
}

/// Rebuild a record from a memory string against the target's current state.
///
/// Genes whose parameter no longer exists are dropped from the record along
/// with their values.
pub fn decode_memory<T: EvaluationTarget + ?Sized>(
    memory: &str,
    target: &T,
) -> EvolverResult<EvolutionRecord> {
    let (names, history) = split_names(memory)?;
    let (population_all, fitness_all): (Vec<Vec<ChromosomeValues>>, Vec<Vec<f64>>) =
        serde_json::from_str(history)?;

    if population_all.len() != fitness_all.len() {
        return Err(EvolverError::MemoryFormat(format!(
            "{} population generations but {} fitness generations",
            population_all.len(),
            fitness_all.len()
        )));
    }
    if let Some(chromosome) = population_all
        .iter()
        .flatten()
        .find(|c| c.len() != names.len())
    {
        return Err(EvolverError::MemoryFormat(format!(
            "chromosome has {} values for {} genes",
            chromosome.len(),
            names.len()
        )));
    }

    let mut kept = Vec::with_capacity(names.len());
    let mut genes = Vec::with_capacity(names.len());
    for (index, name) in names.into_iter().enumerate() {
        match target.get(&name) {
            Ok(parameter) => {
                kept.push(index);
                genes.push(GeneDescriptor::from_parameter(name, parameter));
            }
            Err(TargetError::UnknownParameter(_)) => {
                warn!("Gene {} no longer exists, dropping it from memory", name);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let population_all: Vec<Vec<ChromosomeValues>> = population_all
        .into_iter()
        .map(|generation| {
            generation
                .into_iter()
                .map(|chromosome| kept.iter().map(|&i| chromosome[i].clone()).collect())
                .collect()
        })
        .collect();

    Ok(EvolutionRecord {
        genes,
        population_all,
        fitness_all,
        stop_reason: StopReason::Restored,
    })
}
