//! Biofilm scenario CLI
//!
//! Run colony scenarios with invariant checking, over one or many seeds.

use biofilm_sim::{
    load_overrides, ScenarioId, ScenarioResult, ScenarioRunner, SeedContext, SimExport,
};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Biofilm lattice simulator
#[derive(Parser, Debug)]
#[command(name = "biofilm-sim")]
#[command(about = "Run stochastic biofilm colony scenarios", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (baseline, antibiotic_pulse, famine, dense_biofilm,
    /// mutation_pressure, tall_column, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Time units per run
    #[arg(short = 'n', long, default_value = "100")]
    steps: u64,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// JSON file of ColonyConfig fields applied over the scenario defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export per-step summaries of a single run to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("Biofilm Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            let names: Vec<&str> = ScenarioId::all().iter().map(|s| s.name()).collect();
            eprintln!("Available scenarios: {}, all", names.join(", "));
            std::process::exit(1);
        })]
    };

    let overrides = match &args.config {
        Some(path) => load_overrides(path).unwrap_or_else(|e| {
            eprintln!("Error: failed to load {}: {}", path, e);
            std::process::exit(1);
        }),
        None => Default::default(),
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 || args.seeds > 1 {
            eprintln!("Error: --export only supports a single scenario and seed");
            std::process::exit(1);
        }

        let runner = ScenarioRunner::new(base_seed)
            .with_steps(args.steps)
            .with_overrides(overrides);
        let (result, book) = runner.run_recorded(scenarios[0]);
        let export = SimExport::from_run(&result, &book, runner.config_for(scenarios[0]).ok());

        if let Err(e) = export.write_to_file(export_path) {
            error!("Failed to write export: {}", e);
            std::process::exit(1);
        }
        info!("Exported {} frames to {}", export.frames.len(), export_path);

        report(&result, args.json);
        if !result.passed {
            std::process::exit(1);
        }
        return;
    }

    // Run simulations
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    let base = SeedContext::new(base_seed);
    for seed_offset in 0..args.seeds {
        let seed = base.sweep(seed_offset as u64).master_seed();

        let runner = ScenarioRunner::new(seed)
            .with_steps(args.steps)
            .with_overrides(overrides.clone());

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                report(&result, false);
            }
            if !result.passed {
                failed_count += 1;
            }
            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(result_json).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            for result in &all_results {
                if !result.passed {
                    error!(
                        "  - {} seed={}: {}",
                        result.scenario.name(),
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}

fn report(result: &ScenarioResult, json: bool) {
    if json {
        println!("{}", result_json(result));
        return;
    }

    let census = &result.final_census;
    if result.passed {
        info!(
            "✓ {} (seed={}) PASSED | good={} bad={} dead={} births={} peak={}",
            result.scenario.name(),
            result.seed,
            census.alive_good,
            census.alive_bad,
            census.dead(),
            result.metrics.births,
            result.metrics.peak_alive,
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

fn result_json(r: &ScenarioResult) -> serde_json::Value {
    serde_json::json!({
        "scenario": r.scenario.name(),
        "seed": r.seed,
        "passed": r.passed,
        "ticks": r.total_ticks,
        "census": r.final_census,
        "deaths": r.metrics.deaths,
        "births": r.metrics.births,
        "peak_alive": r.metrics.peak_alive,
        "mean_alive_time_good": r.metrics.mean_alive_time_good,
        "mean_alive_time_bad": r.metrics.mean_alive_time_bad,
        "mean_reproductions": r.metrics.mean_reproductions,
        "failure_reason": r.failure_reason,
    })
}
