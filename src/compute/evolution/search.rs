//! Population manager: the evolve loop.

use std::time::Instant;

use log::{debug, info, warn};
use rand_distr::{Distribution, WeightedIndex};

use crate::schema::{
    ChromosomeValues, EvolutionRecord, EvolverConfig, FitnessMode, GeneDescriptor,
    GenerationProgress, Genotype, RunOutcome, StopReason,
};

use super::archive::EvolutionStore;
use super::chromosome::Chromosome;
use super::error::{EvolverError, EvolverResult, TargetError};
use super::fitness::{EvaluationTarget, apply_to_target};
use super::genome::GenomeRng;

/// Build descriptors for the target's gene parameters selected by `genotype`.
pub fn collect_genes<T: EvaluationTarget + ?Sized>(
    target: &T,
    genotype: &Genotype,
) -> Result<Vec<GeneDescriptor>, TargetError> {
    target
        .gene_parameters()
        .into_iter()
        .filter(|p| match genotype {
            Genotype::All => true,
            Genotype::Frame(frame) => p.frame.as_deref() == Some(frame.as_str()),
        })
        .map(|p| -> Result<GeneDescriptor, TargetError> {
            let info = target.get(&p.name)?;
            Ok(GeneDescriptor::from_parameter(p.name, info))
        })
        .collect()
}

/// Normalized parent-selection probabilities.
///
/// `Max` weighs each chromosome by `f^p`, `Min` by `f^-p`. Weights that do
/// not form a probability distribution are reported, not repaired.
pub fn selection_weights(
    fitness: &[f64],
    mode: FitnessMode,
    pressure: u32,
) -> EvolverResult<Vec<f64>> {
    let exponent = pressure as i32;
    let raw: Vec<f64> = fitness
        .iter()
        .map(|f| match mode {
            FitnessMode::Max => f.powi(exponent),
            FitnessMode::Min => 1.0 / f.powi(exponent),
        })
        .collect();
    let total: f64 = raw.iter().sum();
    let weights: Vec<f64> = raw.iter().map(|w| w / total).collect();

    if weights.iter().all(|w| w.is_finite() && *w >= 0.0) {
        Ok(weights)
    } else {
        Err(EvolverError::DegenerateWeights {
            mode,
            fitness: fitness.to_vec(),
        })
    }
}

/// Draw `count` indices independently, with replacement, from `weights`.
pub fn sample_parents(
    weights: &[f64],
    count: usize,
    rng: &mut GenomeRng,
) -> EvolverResult<Vec<usize>> {
    let dist = WeightedIndex::new(weights)
        .map_err(|e| EvolverError::InvalidFitness(format!("selection weights: {e}")))?;
    Ok((0..count).map(|_| dist.sample(rng.inner())).collect())
}

/// Genetic optimizer over a fixed list of gene descriptors.
pub struct Evolver {
    config: EvolverConfig,
    genes: Vec<GeneDescriptor>,
    rng: GenomeRng,
    population: Vec<Chromosome>,
    population_all: Vec<Vec<ChromosomeValues>>,
    fitness_all: Vec<Vec<f64>>,
}

impl Evolver {
    /// Create an evolver; validates the configuration and gene bounds.
    pub fn new(config: EvolverConfig, genes: Vec<GeneDescriptor>) -> EvolverResult<Self> {
        config.validate()?;
        EvolverConfig::validate_genes(&genes)?;
        let rng = GenomeRng::new(config.random_seed);

        Ok(Self {
            config,
            genes,
            rng,
            population: Vec::new(),
            population_all: Vec::new(),
            fitness_all: Vec::new(),
        })
    }

    pub fn genes(&self) -> &[GeneDescriptor] {
        &self.genes
    }

    /// Current population; fittest first after sorting.
    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    /// Seed the first generation.
    ///
    /// With reuse enabled and an unchanged genotype (same gene names, kinds,
    /// bounds and list lengths) the stored final
    /// population is taken over and topped up with random chromosomes.
    /// Otherwise the population is the baseline plus random chromosomes.
    pub fn initialize(&mut self, previous: Option<&EvolutionRecord>) {
        let size = self.config.population_size;
        self.population.clear();
        self.population_all.clear();
        self.fitness_all.clear();

        let reusable = match previous {
            Some(record) if self.config.reuse_population => {
                let unchanged = record.genes.len() == self.genes.len()
                    && record
                        .genes
                        .iter()
                        .zip(&self.genes)
                        .all(|(stored, fresh)| stored.same_genotype(fresh));
                if unchanged {
                    Some(record.population())
                } else {
                    warn!("Genotype changed since the last run, starting a fresh population");
                    None
                }
            }
            _ => None,
        };

        match reusable {
            Some(stored) => {
                info!("Reusing {} stored chromosomes", stored.len().min(size));
                self.population.extend(
                    stored
                        .iter()
                        .take(size)
                        .map(|values| Chromosome::from_values(values.clone())),
                );
            }
            None => {
                self.population
                    .push(Chromosome::fill(&self.genes, false, &mut self.rng));
            }
        }

        while self.population.len() < size {
            self.population
                .push(Chromosome::fill(&self.genes, true, &mut self.rng));
        }
    }

    /// Evaluate every chromosome in turn on the shared target.
    pub fn evaluate_population<T: EvaluationTarget + ?Sized>(
        &mut self,
        target: &mut T,
        execution_order: &[String],
    ) -> EvolverResult<()> {
        for chromosome in &mut self.population {
            chromosome.evaluate(&self.genes, target, execution_order)?;
        }
        Ok(())
    }

    /// Stable sort, fittest first.
    pub fn sort_population(&mut self) {
        match self.config.mode {
            FitnessMode::Max => self
                .population
                .sort_by(|a, b| b.fitness.total_cmp(&a.fitness)),
            FitnessMode::Min => self
                .population
                .sort_by(|a, b| a.fitness.total_cmp(&b.fitness)),
        }
    }

    fn record_generation(&mut self) {
        self.population_all
            .push(self.population.iter().map(|c| c.values.clone()).collect());
        self.fitness_all
            .push(self.population.iter().map(|c| c.fitness).collect());
    }

    fn best_fitness(&self) -> f64 {
        self.population.first().map_or(0.0, |c| c.fitness)
    }

    /// Replace the sorted population with its offspring.
    ///
    /// Chromosome 0 survives unchanged; every other slot is a child of two
    /// parents drawn by fitness weight. All parent indices are drawn before
    /// any crossover.
    pub fn next_generation(&mut self) -> EvolverResult<()> {
        if self.population.len() < 2 {
            return Ok(());
        }
        let fitness: Vec<f64> = self.population.iter().map(|c| c.fitness).collect();
        let weights = selection_weights(&fitness, self.config.mode, self.config.selection_pressure)?;
        let offspring = self.population.len() - 1;
        let parents = sample_parents(&weights, offspring * 2, &mut self.rng)?;

        let mut next = Vec::with_capacity(self.population.len());
        next.extend(self.population.first().cloned());
        for pair in parents.chunks_exact(2) {
            let child = self.population[pair[0]].cross_over(
                &self.population[pair[1]],
                &self.genes,
                self.config.mutation_rate,
                &mut self.rng,
            );
            next.push(child);
        }

        self.population = next;
        Ok(())
    }

    fn evaluate_and_record<T, F>(
        &mut self,
        target: &mut T,
        execution_order: &[String],
        start: Instant,
        callback: &mut F,
    ) -> EvolverResult<()>
    where
        T: EvaluationTarget + ?Sized,
        F: FnMut(&GenerationProgress),
    {
        self.evaluate_population(target, execution_order)?;
        self.sort_population();
        self.record_generation();

        let progress = GenerationProgress {
            iteration: self.population_all.len() - 1,
            elapsed_seconds: start.elapsed().as_secs_f64(),
            best_fitness: self.best_fitness(),
        };
        debug!(
            "Generation {}: best fitness {:.6} after {:.3}s",
            progress.iteration, progress.best_fitness, progress.elapsed_seconds
        );
        callback(&progress);
        Ok(())
    }

    /// Run evolution with progress callback.
    ///
    /// The execution order is computed once from the gene names and reused
    /// for every evaluation. When the time limit ends the loop, the final
    /// pass re-evaluates and records the last population a second time.
    pub fn run_with_callback<T, F>(
        &mut self,
        target: &mut T,
        previous: Option<&EvolutionRecord>,
        mut callback: F,
    ) -> EvolverResult<EvolutionRecord>
    where
        T: EvaluationTarget + ?Sized,
        F: FnMut(&GenerationProgress),
    {
        let start = Instant::now();
        info!(
            "Starting evolver: {} genes, population {}, {} iterations",
            self.genes.len(),
            self.config.population_size,
            self.config.iterations
        );

        let names: Vec<String> = self.genes.iter().map(|g| g.name.clone()).collect();
        let execution_order = target.topological_sort(&names)?;
        self.initialize(previous);

        let mut stop_reason = StopReason::Completed;
        for i in 0..self.config.iterations - 1 {
            self.evaluate_and_record(target, &execution_order, start, &mut callback)?;

            if let Some(goal) = self.config.goal
                && self.config.mode.beats(self.best_fitness(), goal)
            {
                stop_reason = StopReason::GoalReached { iterations: i + 1 };
                break;
            }
            if start.elapsed().as_secs_f64() > self.config.max_time_seconds {
                stop_reason = StopReason::TimeLimit { iterations: i + 1 };
                break;
            }

            self.next_generation()?;
        }

        if !matches!(stop_reason, StopReason::GoalReached { .. }) {
            self.evaluate_and_record(target, &execution_order, start, &mut callback)?;
        }

        info!("{} (best fitness {:.6})", stop_reason, self.best_fitness());

        Ok(EvolutionRecord {
            genes: self.genes.clone(),
            population_all: self.population_all.clone(),
            fitness_all: self.fitness_all.clone(),
            stop_reason,
        })
    }

    /// Run evolution without progress reporting.
    pub fn run<T: EvaluationTarget + ?Sized>(
        &mut self,
        target: &mut T,
        previous: Option<&EvolutionRecord>,
    ) -> EvolverResult<EvolutionRecord> {
        self.run_with_callback(target, previous, |_| {})
    }
}

/// Run the evolver against a target and store the record under `run_id`.
///
/// Nothing runs when the target has no fitness source. The stored entry is
/// replaced only when the run succeeds.
pub fn run<T: EvaluationTarget + ?Sized>(
    config: &EvolverConfig,
    target: &mut T,
    store: &mut EvolutionStore,
    run_id: &str,
) -> EvolverResult<RunOutcome> {
    if !target.fitness_linked() {
        info!("Fitness output not linked, evolver {} not run", run_id);
        return Ok(RunOutcome::NotConfigured);
    }

    let genes = collect_genes(target, &config.genotype)?;
    let mut evolver = Evolver::new(config.clone(), genes)?;
    let record = evolver.run(target, store.get(run_id))?;
    store.overwrite(run_id, record.clone());

    Ok(RunOutcome::Finished(record))
}

/// Write the fittest chromosome of the final population into the target.
pub fn apply_fittest<T: EvaluationTarget + ?Sized>(
    record: &EvolutionRecord,
    target: &mut T,
) -> EvolverResult<()> {
    let Some((values, fitness)) = record.fittest() else {
        warn!("Evolution record has no population to apply");
        return Ok(());
    };

    for (gene, value) in record.genes.iter().zip(values) {
        apply_to_target(gene, target, value)?;
    }
    info!("Applied fittest chromosome (fitness {:.6})", fitness);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::compute::ParameterGraph;
    use crate::compute::evolution::is_permutation;
    use crate::schema::{GeneKind, GeneValue, ListValues, NumberKind, ParameterInfo};

    /// Genes of every kind; fitness rewards a high `x`.
    fn mixed_graph() -> ParameterGraph {
        let mut graph = ParameterGraph::new();
        graph.add_parameter(
            "x",
            ParameterInfo::Number {
                kind: NumberKind::Float,
                min: 0.0,
                max: 10.0,
                value: 1.0,
            },
        );
        graph.add_parameter(
            "n",
            ParameterInfo::Number {
                kind: NumberKind::Int,
                min: -5.0,
                max: 5.0,
                value: 0.0,
            },
        );
        graph.add_parameter(
            "order",
            ParameterInfo::List {
                values: ListValues::Numbers(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            },
        );
        graph.add_parameter(
            "offsets",
            ParameterInfo::VectorRange {
                mins: [0.0, -1.0, 0.0],
                maxs: [1.0, 1.0, 0.5],
                values: vec![[0.5, 0.0, 0.25]; 3],
            },
        );
        graph.add_parameter(
            "levels",
            ParameterInfo::NumberRange {
                kind: NumberKind::Int,
                min: -3.0,
                max: 3.0,
                values: vec![0.0, 1.0, -1.0, 2.0],
            },
        );
        graph.add_parameter(
            "route",
            ParameterInfo::List {
                values: ListValues::Vectors(vec![
                    [0.0, 0.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [2.0, 0.0, 0.0],
                ]),
            },
        );
        graph.add_node(
            "score",
            &["x", "n", "order", "offsets", "levels", "route"],
            |v| {
                let first = v.numbers("order")?[0];
                let start = v.vectors("route")?[0][0];
                let level = v.numbers("levels")?[0];
                Ok(vec![
                    v.number("x")? + 1.0 + first * 0.01 + start * 0.001 + level * 0.0001,
                ])
            },
        );
        graph.link_fitness("score");
        graph
    }

    fn config(population_size: usize, iterations: usize) -> EvolverConfig {
        EvolverConfig {
            population_size,
            iterations,
            mutation_rate: 0.2,
            ..Default::default()
        }
    }

    fn run_mixed(config: EvolverConfig) -> EvolutionRecord {
        let mut graph = mixed_graph();
        let genes = collect_genes(&graph, &Genotype::All).unwrap();
        let mut evolver = Evolver::new(config, genes).unwrap();
        evolver.run(&mut graph, None).unwrap()
    }

    /// Fitness equals the 1-based generation index.
    fn counting_graph(population_size: usize) -> ParameterGraph {
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
        let calls = Rc::new(Cell::new(0usize));
        graph.add_node("generation", &["x"], move |_| {
            let generation = calls.get() / population_size;
            calls.set(calls.get() + 1);
            Ok(vec![(generation + 1) as f64])
        });
        graph.link_fitness("generation");
        graph
    }

    #[test]
    fn test_collect_genes_by_frame() {
        let mut graph = mixed_graph();
        graph.add_parameter_in_frame(
            "framed",
            "Genes",
            ParameterInfo::Number {
                kind: NumberKind::Float,
                min: 0.0,
                max: 1.0,
                value: 0.0,
            },
        );

        let all = collect_genes(&graph, &Genotype::All).unwrap();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0].name, "x");
        assert!(matches!(all[2].kind, GeneKind::Permutation { .. }));
        assert!(matches!(all[4].kind, GeneKind::MultiNumber { .. }));
        assert!(matches!(all[5].kind, GeneKind::Permutation { .. }));

        let framed = collect_genes(&graph, &Genotype::Frame("Genes".to_string())).unwrap();
        assert_eq!(framed.len(), 1);
        assert_eq!(framed[0].name, "framed");
    }

    #[test]
    fn test_initialize_has_baseline_first() {
        let graph = mixed_graph();
        let genes = collect_genes(&graph, &Genotype::All).unwrap();
        let mut evolver = Evolver::new(config(6, 1), genes.clone()).unwrap();
        evolver.initialize(None);

        assert_eq!(evolver.population().len(), 6);
        let baseline: Vec<GeneValue> = genes.iter().map(|g| g.initial_value()).collect();
        assert_eq!(evolver.population()[0].values, baseline);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Evolver::new(config(0, 1), Vec::new());
        assert!(matches!(result, Err(EvolverError::Config(_))));
    }

    #[test]
    fn test_single_chromosome_population() {
        let record = run_mixed(config(1, 4));
        assert_eq!(record.stop_reason, StopReason::Completed);
        assert_eq!(record.generations(), 4);

        // Elitism keeps the baseline, the only chromosome.
        let first = &record.population_all[0];
        assert_eq!(first.len(), 1);
        for population in &record.population_all {
            assert_eq!(population, first);
        }
    }

    #[test]
    fn test_run_is_deterministic() {
        let a = run_mixed(config(8, 6));
        let b = run_mixed(config(8, 6));
        assert_eq!(a.population_all, b.population_all);
        assert_eq!(a.fitness_all, b.fitness_all);

        let c = run_mixed(EvolverConfig {
            random_seed: 2,
            ..config(8, 6)
        });
        assert_ne!(a.population_all, c.population_all);
    }

    #[test]
    fn test_history_shape_and_sorting() {
        let record = run_mixed(config(8, 6));
        assert_eq!(record.stop_reason, StopReason::Completed);
        assert_eq!(record.generations(), 6);
        assert_eq!(record.fitness_all.len(), 6);
        for (population, fitness) in record.population_all.iter().zip(&record.fitness_all) {
            assert_eq!(population.len(), 8);
            assert_eq!(fitness.len(), 8);
            assert!(fitness.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_min_mode_sorts_ascending() {
        let record = run_mixed(EvolverConfig {
            mode: FitnessMode::Min,
            ..config(6, 4)
        });
        for fitness in &record.fitness_all {
            assert!(fitness.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_elite_survives_each_transition() {
        let mut graph = mixed_graph();
        let genes = collect_genes(&graph, &Genotype::All).unwrap();
        let order = graph.topological_sort(&["x".to_string()]).unwrap();
        let mut evolver = Evolver::new(config(8, 1), genes).unwrap();
        evolver.initialize(None);

        let mut best_so_far = f64::NEG_INFINITY;
        for _ in 0..10 {
            evolver.evaluate_population(&mut graph, &order).unwrap();
            evolver.sort_population();
            let best = evolver.population()[0].clone();
            assert!(best.fitness >= best_so_far);
            best_so_far = best.fitness;

            evolver.next_generation().unwrap();
            assert_eq!(evolver.population()[0], best);
            assert_eq!(evolver.population().len(), 8);
        }
    }

    #[test]
    fn test_genes_stay_in_bounds() {
        let record = run_mixed(EvolverConfig {
            mutation_rate: 0.9,
            ..config(10, 8)
        });

        for chromosome in record.population_all.iter().flatten() {
            let GeneValue::Number(x) = chromosome[0] else {
                panic!("x is a number gene");
            };
            assert!((0.0..=10.0).contains(&x));

            let GeneValue::Number(n) = chromosome[1] else {
                panic!("n is a number gene");
            };
            assert!((-5.0..=5.0).contains(&n));
            assert_eq!(n, n.trunc());

            let GeneValue::Permutation(order) = &chromosome[2] else {
                panic!("order is a permutation gene");
            };
            assert_eq!(order.len(), 5);
            assert!(is_permutation(order));

            let GeneValue::Vectors(offsets) = &chromosome[3] else {
                panic!("offsets is a vector gene");
            };
            for v in offsets {
                assert!((0.0..=1.0).contains(&v[0]));
                assert!((-1.0..=1.0).contains(&v[1]));
                assert!((0.0..=0.5).contains(&v[2]));
            }

            let GeneValue::Numbers(levels) = &chromosome[4] else {
                panic!("levels is a multi-number gene");
            };
            assert_eq!(levels.len(), 4);
            for level in levels {
                assert!((-3.0..=3.0).contains(level));
                assert_eq!(*level, level.trunc());
            }

            let GeneValue::Permutation(route) = &chromosome[5] else {
                panic!("route is a permutation gene");
            };
            assert_eq!(route.len(), 3);
            assert!(is_permutation(route));
        }
    }

    #[test]
    fn test_goal_stops_early() {
        let mut graph = counting_graph(4);
        let genes = collect_genes(&graph, &Genotype::All).unwrap();
        let mut evolver = Evolver::new(
            EvolverConfig {
                population_size: 4,
                iterations: 20,
                goal: Some(5.0),
                ..Default::default()
            },
            genes,
        )
        .unwrap();

        let mut reported = Vec::new();
        let record = evolver
            .run_with_callback(&mut graph, None, |p| reported.push(p.best_fitness))
            .unwrap();

        // Generation 6 is the first to score above 5.
        assert_eq!(record.stop_reason, StopReason::GoalReached { iterations: 6 });
        assert_eq!(record.generations(), 6);
        assert_eq!(reported, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(record.stop_reason.to_string(), "Goal achieved in 6 iterations");
    }

    #[test]
    fn test_time_limit_stops_run() {
        let mut graph = ParameterGraph::new();
        graph.add_parameter(
            "x",
            ParameterInfo::Number {
                kind: NumberKind::Float,
                min: 1.0,
                max: 2.0,
                value: 1.5,
            },
        );
        graph.add_node("slow", &["x"], |v| {
            std::thread::sleep(std::time::Duration::from_millis(5));
            Ok(vec![v.number("x")?])
        });
        graph.link_fitness("slow");

        let genes = collect_genes(&graph, &Genotype::All).unwrap();
        let mut evolver = Evolver::new(
            EvolverConfig {
                population_size: 4,
                iterations: 1000,
                max_time_seconds: 0.05,
                ..Default::default()
            },
            genes,
        )
        .unwrap();
        let record = evolver.run(&mut graph, None).unwrap();

        let StopReason::TimeLimit { iterations } = record.stop_reason else {
            panic!("expected time limit, got {:?}", record.stop_reason);
        };
        assert!(iterations < 1000);
        // The last population is recorded again by the final pass.
        assert_eq!(record.generations(), iterations + 1);
    }

    #[test]
    fn test_selection_weights_max_and_min() {
        let weights = selection_weights(&[10.0, 1.0, 1.0], FitnessMode::Max, 3).unwrap();
        assert!((weights[0] - 1000.0 / 1002.0).abs() < 1e-12);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        let weights = selection_weights(&[1.0, 2.0], FitnessMode::Min, 1).unwrap();
        assert!((weights[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_selection_weights_degenerate() {
        assert!(matches!(
            selection_weights(&[0.0, 1.0], FitnessMode::Min, 2),
            Err(EvolverError::DegenerateWeights { .. })
        ));
        assert!(matches!(
            selection_weights(&[0.0, 0.0], FitnessMode::Max, 3),
            Err(EvolverError::DegenerateWeights { .. })
        ));
        assert!(matches!(
            selection_weights(&[-1.0, 2.0], FitnessMode::Max, 3),
            Err(EvolverError::DegenerateWeights { .. })
        ));
    }

    #[test]
    fn test_weighted_sampling_frequency() {
        let weights = selection_weights(&[10.0, 1.0, 1.0], FitnessMode::Max, 3).unwrap();
        let mut rng = GenomeRng::new(99);
        let draws = sample_parents(&weights, 50_000, &mut rng).unwrap();

        let share = draws.iter().filter(|&&i| i == 0).count() as f64 / draws.len() as f64;
        assert!((share - 1000.0 / 1002.0).abs() < 0.005);
    }

    #[test]
    fn test_reuse_seeds_from_previous_population() {
        let first = run_mixed(config(6, 3));
        let mut graph = mixed_graph();
        let genes = collect_genes(&graph, &Genotype::All).unwrap();

        let mut larger = Evolver::new(
            EvolverConfig {
                reuse_population: true,
                ..config(8, 1)
            },
            genes.clone(),
        )
        .unwrap();
        larger.initialize(Some(&first));
        let seeded: Vec<_> = larger.population()[..6]
            .iter()
            .map(|c| c.values.clone())
            .collect();
        assert_eq!(seeded, first.population());
        assert_eq!(larger.population().len(), 8);

        let mut smaller = Evolver::new(
            EvolverConfig {
                reuse_population: true,
                ..config(4, 2)
            },
            genes,
        )
        .unwrap();
        let record = smaller.run(&mut graph, Some(&first)).unwrap();
        assert_eq!(record.population().len(), 4);
    }

    #[test]
    fn test_reuse_ignored_when_genotype_changes() {
        let first = run_mixed(config(6, 2));
        let mut graph = mixed_graph();
        graph.remove_parameter("n");
        let genes = collect_genes(&graph, &Genotype::All).unwrap();

        let mut evolver = Evolver::new(
            EvolverConfig {
                reuse_population: true,
                ..config(6, 1)
            },
            genes.clone(),
        )
        .unwrap();
        evolver.initialize(Some(&first));
        let baseline: Vec<GeneValue> = genes.iter().map(|g| g.initial_value()).collect();
        assert_eq!(evolver.population()[0].values, baseline);
    }

    #[test]
    fn test_reuse_after_run_on_same_graph() {
        let mut graph = mixed_graph();
        let mut store = EvolutionStore::new();
        let first = run(&config(6, 3), &mut graph, &mut store, "node-1").unwrap();
        let first = first.record().unwrap().clone();

        // The target now holds the last evaluated chromosome, not the baseline.
        let genes = collect_genes(&graph, &Genotype::All).unwrap();
        assert!(genes.iter().zip(&first.genes).all(|(a, b)| a.same_genotype(b)));

        let reuse = EvolverConfig {
            reuse_population: true,
            ..config(6, 1)
        };
        let second = run(&reuse, &mut graph, &mut store, "node-1").unwrap();
        let second = second.record().unwrap();

        assert_eq!(second.population(), first.population());
        assert_eq!(second.fitness(), first.fitness());
    }

    #[test]
    fn test_run_stores_record() {
        let mut graph = mixed_graph();
        let mut store = EvolutionStore::new();
        let outcome = run(&config(5, 3), &mut graph, &mut store, "node-1").unwrap();

        assert_eq!(outcome.info(), "Evolver Runned");
        assert_eq!(store.get("node-1"), outcome.record());
    }

    #[test]
    fn test_run_without_fitness_is_not_configured() {
        let mut graph = mixed_graph();
        graph.unlink_fitness();
        let mut store = EvolutionStore::new();
        let outcome = run(&config(5, 3), &mut graph, &mut store, "node-1").unwrap();

        assert_eq!(outcome, RunOutcome::NotConfigured);
        assert!(!store.has("node-1"));
    }

    #[test]
    fn test_failed_run_keeps_previous_record() {
        let mut graph = mixed_graph();
        let mut store = EvolutionStore::new();
        run(&config(5, 2), &mut graph, &mut store, "node-1").unwrap();
        let before = store.get("node-1").cloned();

        graph.add_node("score", &["x"], |_| Err("bad input".to_string()));
        let err = run(&config(5, 2), &mut graph, &mut store, "node-1").unwrap_err();
        assert!(matches!(err, EvolverError::Target(TargetError::Recompute { .. })));
        assert_eq!(store.get("node-1").cloned(), before);
    }

    #[test]
    fn test_apply_fittest_writes_best() {
        let mut graph = mixed_graph();
        let mut store = EvolutionStore::new();
        let outcome = run(&config(6, 4), &mut graph, &mut store, "node-1").unwrap();
        let record = outcome.record().unwrap();

        apply_fittest(record, &mut graph).unwrap();

        let (values, fitness) = record.fittest().unwrap();
        let GeneValue::Number(x) = values[0] else {
            panic!("x is a number gene");
        };
        let ParameterInfo::Number { value, .. } = graph.get("x").unwrap() else {
            panic!("x is a number parameter");
        };
        assert_eq!(value, x);
        assert_eq!(graph.read_fitness().unwrap().into_fitness().unwrap(), fitness);
    }
}
