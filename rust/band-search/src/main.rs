//! band-search CLI: run a band search against one semiprime.
//!
//! Usage:
//!   band-search --n=1073217479 --delta-max=5000 --num-bands=3
//!   band-search --bits=40 --seed=7 --coverage=100
//!   band-search --n=<N> --config=params.json --log=run.jsonl
//!
//! Parameters come from `--config` (JSON, every field optional) and are then
//! overridden by individual flags. `--coverage` sizes `delta_max` and the
//! candidate budget from a target coverage. `RUST_LOG` sets log verbosity.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use band_search::calibration::{plan_budget, CalibrationCurve};
use band_search::density::predict_index_band;
use band_search::runlog::JsonlLog;
use band_search::{SearchConfig, SearchDriver, SearchReport, SearchTarget};
use factoring_core::{generate_balanced_semiprime, Semiprime};

#[derive(Parser, Debug)]
#[command(name = "band-search")]
#[command(about = "Density-prioritized divisor search near floor(sqrt(N))")]
#[command(group(ArgGroup::new("target").required(true).args(["n", "bits"])))]
struct Cli {
    /// Target semiprime, decimal
    #[arg(long)]
    n: Option<String>,

    /// Generate a balanced semiprime of this many bits instead
    #[arg(long)]
    bits: Option<u32>,

    /// Seed for --bits
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// JSON parameters file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    delta_max: Option<u64>,

    #[arg(long)]
    num_bands: Option<usize>,

    #[arg(long)]
    k_value: Option<f64>,

    #[arg(long)]
    dimensions: Option<usize>,

    #[arg(long)]
    max_candidates: Option<u64>,

    #[arg(long)]
    timeout_secs: Option<f64>,

    #[arg(long)]
    log_interval: Option<u64>,

    /// Plan delta_max and the candidate budget for this coverage
    #[arg(long)]
    coverage: Option<f64>,

    /// Calibration curve JSON, {"a": .., "b": ..}
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Write JSONL run records here
    #[arg(long)]
    log: Option<PathBuf>,
}

/// Final summary printed to stdout.
#[derive(Serialize)]
struct Summary {
    n: String,
    bits: u64,
    outcome: String,
    p: Option<String>,
    q: Option<String>,
    verified: Option<bool>,
    tested: u64,
    elapsed_secs: f64,
    last_band: Option<usize>,
    last_offset: Option<i64>,
}

fn resolve_target(cli: &Cli) -> Result<(SearchTarget, Option<Semiprime>)> {
    if let Some(n) = &cli.n {
        let target: SearchTarget = n.parse()?;
        return Ok((target, None));
    }
    let bits = cli.bits.context("either --n or --bits is required")?;
    anyhow::ensure!(bits >= 6, "--bits must be at least 6");
    let mut rng = StdRng::seed_from_u64(cli.seed);
    let semiprime = generate_balanced_semiprime(bits, &mut rng);
    log::info!(
        "generated {}-bit semiprime {} (seed {})",
        semiprime.bit_size,
        semiprime.n,
        cli.seed
    );
    let target = SearchTarget::new(semiprime.n.clone())?;
    Ok((target, Some(semiprime)))
}

fn build_config(cli: &Cli, target: &SearchTarget) -> Result<SearchConfig> {
    let mut config = match &cli.config {
        Some(path) => SearchConfig::from_json_file(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => SearchConfig::default(),
    };

    if let Some(v) = cli.num_bands {
        config.num_bands = v;
    }
    if let Some(coverage) = cli.coverage {
        let plan = plan_budget(coverage, target.sqrt_n());
        log::info!(
            "coverage {:.1}: delta_max={} budget={} (70/20/10 = {}/{}/{})",
            coverage,
            plan.delta_max,
            plan.total_budget,
            plan.high_priority,
            plan.outer_shells,
            plan.safety_net
        );
        plan.apply(&mut config);
    }
    if let Some(v) = cli.delta_max {
        config.delta_max = v;
    }
    if let Some(v) = cli.k_value {
        config.k_value = v;
    }
    if let Some(v) = cli.dimensions {
        config.dimensions = v;
    }
    if let Some(v) = cli.max_candidates {
        config.max_candidates = Some(v);
    }
    if let Some(v) = cli.timeout_secs {
        config.timeout_secs = Some(v);
    }
    if let Some(v) = cli.log_interval {
        config.log_interval = v;
    }

    config.validate()?;
    Ok(config)
}

fn run(
    target: SearchTarget,
    config: SearchConfig,
    log_path: Option<&PathBuf>,
) -> Result<SearchReport> {
    let report = match log_path {
        Some(path) => {
            let log = JsonlLog::create(path)
                .with_context(|| format!("creating run log {}", path.display()))?;
            SearchDriver::with_observer(target, config, log)?.run()?
        }
        None => SearchDriver::new(target, config)?.run()?,
    };
    Ok(report)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let (target, known) = resolve_target(&cli)?;
    let config = build_config(&cli, &target)?;

    let curve = match &cli.calibration {
        Some(path) => CalibrationCurve::from_json_file(path)
            .with_context(|| format!("loading calibration from {}", path.display()))?,
        None => CalibrationCurve::default(),
    };
    let epsilon = curve.epsilon(target.bits());
    let index_band = predict_index_band(target.sqrt_n(), epsilon);
    log::info!(
        "target {}: epsilon={:.4}, prime index band [{:.0}, {:.0}]",
        target,
        epsilon,
        index_band.lower,
        index_band.upper
    );

    let n = target.n().to_string();
    let bits = target.bits();
    let report = run(target, config, cli.log.as_ref())?;

    let factors = report.factors();
    let verified = match (&known, factors) {
        (Some(semiprime), Some((p, q))) => Some(semiprime.verify(p, q)),
        _ => None,
    };
    let summary = Summary {
        n,
        bits,
        outcome: report.outcome.label().to_string(),
        p: factors.map(|(p, _)| p.to_string()),
        q: factors.map(|(_, q)| q.to_string()),
        verified,
        tested: report.tested,
        elapsed_secs: report.elapsed.as_secs_f64(),
        last_band: report.last_band,
        last_offset: report.last_offset,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
