//! Evolver CLI - Optimize a demo parameter graph from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use evolver::{
    compute::{
        ParameterGraph,
        evolution::{EvolutionStore, apply_fittest, run},
    },
    schema::{EvolverConfig, ListValues, NumberKind, ParameterInfo, ParameterValue, RunOutcome},
};

const RUN_ID: &str = "demo";

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [memory_dir]", args[0]);
        eprintln!();
        eprintln!("Evolve the parameters of the built-in demo graph.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to evolver configuration file");
        eprintln!("  memory_dir   Directory the run record is loaded from and saved to");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let memory_dir = args.get(2).map(PathBuf::from);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: EvolverConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let mut graph = demo_graph();
    let mut store = EvolutionStore::new();

    if let Some(dir) = &memory_dir
        && dir.join(format!("{RUN_ID}.evolver.json")).exists()
    {
        store.load(dir, RUN_ID, &graph).unwrap_or_else(|e| {
            eprintln!("Error loading run record: {}", e);
            std::process::exit(1);
        });
        println!("Loaded previous run from {}", dir.display());
    }

    println!("Evolver");
    println!("=======");
    println!("Population: {}", config.population_size);
    println!("Iterations: {}", config.iterations);
    println!("Mode: {:?}", config.mode);
    println!("Seed: {}", config.random_seed);
    println!();

    let start = Instant::now();
    let outcome = run(&config, &mut graph, &mut store, RUN_ID).unwrap_or_else(|e| {
        eprintln!("Error running evolver: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    println!("{}", outcome.info());
    let RunOutcome::Finished(record) = &outcome else {
        return;
    };

    for (i, fitness) in record.fitness_all.iter().enumerate() {
        if let Some(best) = fitness.first() {
            println!("  Generation {}: best fitness={:.6}", i, best);
        }
    }

    apply_fittest(record, &mut graph).unwrap_or_else(|e| {
        eprintln!("Error applying fittest: {}", e);
        std::process::exit(1);
    });

    println!();
    println!("Fittest parameters:");
    if let Some((values, _)) = record.fittest() {
        for (gene, value) in record.genes.iter().zip(values) {
            if let Some(parameter) = gene.to_parameter_value(value) {
                println!("  {}: {}", gene.name, describe(&parameter));
            }
        }
    }
    println!("Time: {:.2}s", elapsed.as_secs_f32());

    if let Some(dir) = &memory_dir {
        match store.save(RUN_ID, dir) {
            Ok(path) => println!("Saved run record to {}", path.display()),
            Err(e) => {
                eprintln!("Error saving run record: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Line fit plus a shortest-route ordering.
///
/// Fitness rewards `slope`/`offset` matching `y = 3x - 1` and a short
/// closed route through the waypoints.
fn demo_graph() -> ParameterGraph {
    let mut graph = ParameterGraph::new();

    for name in ["slope", "offset"] {
        graph.add_parameter(
            name,
            ParameterInfo::Number {
                kind: NumberKind::Float,
                min: -10.0,
                max: 10.0,
                value: 0.0,
            },
        );
    }
    graph.add_parameter(
        "waypoints",
        ParameterInfo::List {
            values: ListValues::Vectors(vec![
                [0.0, 0.0, 0.0],
                [4.0, 3.0, 0.0],
                [1.0, 0.0, 0.0],
                [3.0, 3.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0, 3.0, 0.0],
            ]),
        },
    );

    graph.add_node("line_error", &["slope", "offset"], |v| {
        let (slope, offset) = (v.number("slope")?, v.number("offset")?);
        let error: f64 = (0..10)
            .map(|i| {
                let x = i as f64;
                (slope * x + offset - (3.0 * x - 1.0)).powi(2)
            })
            .sum();
        Ok(vec![error])
    });
    graph.add_node("route_length", &["waypoints"], |v| {
        let points = v.vectors("waypoints")?;
        let length: f64 = points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .map(|(a, b)| ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt())
            .sum();
        Ok(vec![length])
    });
    graph.add_node("score", &["line_error", "route_length"], |v| {
        let error = v.output("line_error")?.first().copied().unwrap_or(f64::MAX);
        let length = v.output("route_length")?.first().copied().unwrap_or(f64::MAX);
        Ok(vec![1.0 / (1.0 + error) + 10.0 / length])
    });
    graph.link_fitness("score");

    graph
}

fn describe(value: &ParameterValue) -> String {
    match value {
        ParameterValue::Int(v) => v.to_string(),
        ParameterValue::Float(v) => format!("{:.4}", v),
        ParameterValue::Numbers(values) => format!("{:?}", values),
        ParameterValue::Vectors(values) => format!("{:?}", values),
    }
}

fn print_example_config() {
    let config = EvolverConfig {
        population_size: 40,
        iterations: 60,
        mutation_rate: 0.05,
        goal: Some(1.9),
        ..Default::default()
    };

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
