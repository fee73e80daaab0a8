use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insure::analysis::{self, EstimateSummary};
use insure::break_even::{self, BreakEven};
use insure::config::Scenario;
use insure::lottery;
use insure::monte_carlo::{self, Agent};
use insure::solver::GoldenSection;

/// One NDJSON line per coverage grid point.
#[derive(Serialize)]
struct GridRecord {
    coverage: f64,
    premium: f64,
    expected_utility_insured: f64,
    expected_utility_uninsured: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    break_even: Option<BreakEven>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<String> = None;
    let mut seed_override: Option<u64> = None;
    let mut draws_override: Option<usize> = None;
    let mut runs_override: Option<u64> = None;
    let mut output_path: Option<String> = None;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        let value = |i: usize| {
            args.get(i + 1).with_context(|| format!("{} requires a value", args[i]))
        };
        match args[i].as_str() {
            "--config" => {
                config_path = Some(value(i)?.clone());
                i += 1;
            }
            "--seed" => {
                seed_override = Some(value(i)?.parse().context("--seed requires a u64")?);
                i += 1;
            }
            "--draws" => {
                draws_override = Some(value(i)?.parse().context("--draws requires a positive integer")?);
                i += 1;
            }
            "--runs" => {
                runs_override = Some(value(i)?.parse().context("--runs requires a positive integer")?);
                i += 1;
            }
            "--output" => {
                output_path = Some(value(i)?.clone());
                i += 1;
            }
            "--quiet" => quiet = true,
            other => warn!(argument = other, "ignoring unknown argument"),
        }
        i += 1;
    }

    let mut scenario = match config_path {
        Some(ref path) => Scenario::from_json_file(path).with_context(|| format!("loading {path}"))?,
        None => Scenario::canonical(),
    };
    if let Some(seed) = seed_override {
        scenario.seed = seed;
    }
    if let Some(draws) = draws_override {
        scenario.monte_carlo.draws = draws;
    }
    if let Some(runs) = runs_override {
        scenario.replications = runs;
    }
    info!(?scenario, "running scenario");

    let mp = scenario.params;
    let minimizer = GoldenSection::default();
    let grid = scenario.grid.points();

    // ── Two-state lottery over the coverage grid ────────────────────────────
    let uninsured = lottery::expected_utility_uninsured(&mp)?;
    let solved = break_even::solve_grid(&grid, &mp, &minimizer);
    let mut records = Vec::with_capacity(grid.len());
    for (&q, result) in grid.iter().zip(solved) {
        let break_even = match result {
            Ok(be) => Some(be),
            Err(e) => {
                warn!(coverage = q, error = %e, "break-even premium not found");
                None
            }
        };
        records.push(GridRecord {
            coverage: q,
            premium: lottery::premium(q, &mp),
            expected_utility_insured: lottery::expected_utility_insured_functional(mp.x, q, &mp)?,
            expected_utility_uninsured: uninsured,
            break_even,
        });
    }
    let optimal_q = lottery::optimal_coverage(mp.x, &mp, &minimizer)?;
    let single = break_even::solve(scenario.coverage, &mp, &minimizer)?;

    // ── Monte Carlo with Beta-distributed losses ────────────────────────────
    let mc = scenario.monte_carlo;
    let mut rng = ChaCha20Rng::seed_from_u64(scenario.seed);
    let mc_insured = mc.estimate(single.premium, &mp, Agent::Insured, &mut rng)?;
    let mc_uninsured = mc.estimate(single.premium, &mp, Agent::Uninsured, &mut rng)?;
    let mc_break_even = monte_carlo::solve_break_even(&mc, &mp, scenario.seed, &minimizer)
        .map_err(|e| warn!(error = %e, "Monte Carlo break-even premium not found"))
        .ok();

    let runs = scenario.replications;
    let seeds = analysis::replication_seeds(scenario.seed, runs);
    let insured_runs = analysis::replicate(&mc, single.premium, &mp, Agent::Insured, &seeds)?;
    let uninsured_runs = analysis::replicate(&mc, single.premium, &mp, Agent::Uninsured, &seeds)?;
    let insured_dist = analysis::summarize(&insured_runs);
    let uninsured_dist = analysis::summarize(&uninsured_runs);

    if let Some(ref path) = output_path {
        let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
        let mut writer = BufWriter::new(file);
        for record in &records {
            serde_json::to_writer(&mut writer, record)?;
            writeln!(writer)?;
        }
        writer.flush()?;
        info!(path = path.as_str(), records = records.len(), "wrote grid records");
    }

    if !quiet {
        println!("\n=== Two-state lottery (y = {}, p = {}, theta = {}, x = {}) ===", mp.y, mp.p, mp.theta, mp.x);
        println!("{:>8} | {:>9} | {:>12} | {:>12} | {:>10}", "q", "p*q", "EU insured", "EU uninsured", "Break-even");
        println!("{}", "-".repeat(62));
        for r in &records {
            let be = r
                .break_even
                .map(|b| format!("{:>10.6}", b.premium))
                .unwrap_or_else(|| format!("{:>10}", "n/a"));
            println!(
                "{:>8.4} | {:>9.6} | {:>12.6} | {:>12.6} | {be}",
                r.coverage, r.premium, r.expected_utility_insured, r.expected_utility_uninsured,
            );
        }
        println!("  Optimal coverage at the fair premium: {optimal_q:.6}");
        println!(
            "  Break-even premium at q = {}: {:.6} (fair {:.6}, residual {:.2e})",
            single.coverage, single.premium, single.fair_premium, single.residual
        );

        println!("\n=== Monte Carlo, loss ~ Beta({}, {}), N = {}, gamma = {} ===", mc.a, mc.b, mc.draws, mp.gamma);
        println!("  EU insured   at pi = {:.6}: {mc_insured:.6}", single.premium);
        println!("  EU uninsured:               {mc_uninsured:.6}");
        match mc_break_even {
            Some(be) => println!("  Break-even premium:         {:.6} (residual {:.2e})", be.x, be.value),
            None => println!("  Break-even premium:         n/a"),
        }

        match (insured_dist, uninsured_dist) {
            (Some(ins), Some(unins)) if runs >= 2 => {
                println!("\n=== Replications (runs = {runs}) ===");
                print_dist_header();
                print_dist_row("insured", &ins);
                print_dist_row("uninsured", &unins);
            }
            _ => eprintln!("Warning: Distribution requires >= 2 runs"),
        }
    }

    Ok(())
}

fn print_dist_header() {
    println!(
        "{:>9} | {:>9} | {:>9} | {:>9} | {:>9} | {:>9} | {:>9} | {:>9}",
        "Agent", "min", "median", "max", "mean", "std dev", "ci95 lo", "ci95 hi"
    );
}

fn print_dist_row(label: &str, s: &EstimateSummary) {
    let (lo, hi) = s.confidence_95();
    println!(
        "{:>9} | {:>9.5} | {:>9.5} | {:>9.5} | {:>9.5} | {:>9.2e} | {:>9.5} | {:>9.5}",
        label, s.min, s.median, s.max, s.mean, s.std_dev, lo, hi,
    );
}
