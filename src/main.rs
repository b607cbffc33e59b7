// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use layered_inversion::config::InversionConfig;
use layered_inversion::io;
use layered_inversion::pipeline::{self, InversionReport};
use layered_inversion::update_rules::Method;

#[derive(Parser)]
#[command(
    name = "layered-inversion",
    about = "Invert layer velocities from a travel time with gradient descent or quasi-Newton"
)]
struct Cli {
    /// TOML configuration file; command-line options override its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of layers
    #[arg(short = 'n', long)]
    layers: Option<usize>,

    /// Thickness of every layer (m)
    #[arg(long)]
    thickness: Option<f64>,

    /// True velocities, comma-separated (e.g., 1500,1800,2100)
    #[arg(long, conflicts_with = "velocity_file")]
    v_true: Option<String>,

    /// Read true velocities from a .npy or .mat file
    #[arg(long)]
    velocity_file: Option<PathBuf>,

    /// MAT variable holding the true velocities (used with --velocity-file)
    #[arg(long, default_value = "v_true")]
    velocity_var: String,

    /// Multiplicative noise level σ on the observed travel time
    #[arg(long)]
    noise: Option<f64>,

    /// Seed for the noise draw
    #[arg(long)]
    seed: Option<u64>,

    /// Optimization method: gradient-descent or quasi-newton
    #[arg(short = 'm', long)]
    method: Option<Method>,

    /// Learning rate γ
    #[arg(short = 'g', long)]
    learning_rate: Option<f64>,

    /// Number of iterations
    #[arg(short = 'i', long)]
    iterations: Option<usize>,

    /// Initial velocity for every layer (m/s)
    #[arg(long)]
    initial_velocity: Option<f64>,

    /// Regularization weight λ
    #[arg(short = 'l', long)]
    lambda: Option<f64>,

    /// Write the cost history (.npy or .mat)
    #[arg(long)]
    history_out: Option<PathBuf>,

    /// Write the estimated velocities (.npy or .mat)
    #[arg(long)]
    velocity_out: Option<PathBuf>,
}

fn parse_velocities(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("invalid --v-true: expected comma-separated floats")
}

fn build_config(cli: &Cli) -> Result<InversionConfig> {
    let mut config = match &cli.config {
        Some(path) => InversionConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => InversionConfig::default(),
    };

    let v_true = if let Some(list) = &cli.v_true {
        Some(parse_velocities(list)?)
    } else if let Some(path) = &cli.velocity_file {
        let v = io::load_vector(path, &cli.velocity_var)
            .with_context(|| format!("loading velocities from {}", path.display()))?;
        Some(v)
    } else {
        None
    };

    if let Some(v) = v_true {
        match cli.layers {
            Some(n) if n != v.len() => {
                bail!("--layers is {} but {} true velocities were given", n, v.len())
            }
            _ => config.layers = v.len(),
        }
        config.v_true = Some(v);
    } else if let Some(n) = cli.layers {
        config.layers = n;
        if config.v_true.as_ref().is_some_and(|v| v.len() != n) {
            // --layers overrides the layer count, so drop a stale profile
            config.v_true = None;
        }
    }

    if let Some(h) = cli.thickness {
        config.layer_thickness = h;
    }
    if let Some(noise) = cli.noise {
        config.noise = noise;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(method) = cli.method {
        config.method = method;
    }
    if let Some(lr) = cli.learning_rate {
        config.learning_rate = lr;
    }
    if let Some(iters) = cli.iterations {
        config.iterations = iters;
    }
    if let Some(v0) = cli.initial_velocity {
        config.initial_velocity = v0;
    }
    if let Some(lambda) = cli.lambda {
        config.lambda_reg = lambda;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn print_report(config: &InversionConfig, report: &InversionReport) {
    println!(
        "{} | layers={} γ={} iterations={} λ={}",
        config.method.label(),
        config.layers,
        config.learning_rate,
        config.iterations,
        config.lambda_reg
    );
    println!();
    println!("{:>5}  {:>14}  {:>14}", "layer", "true (m/s)", "estimate (m/s)");
    for (i, (t, e)) in report
        .true_velocity
        .iter()
        .zip(&report.trajectory.velocity)
        .enumerate()
    {
        println!("{:>5}  {:>14.3}  {:>14.3}", i + 1, t, e);
    }
    println!();
    println!("{}", report.diagnostics);
}

/// Filter from `RUST_LOG` directives, or `info` when unset or unparsable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    info!(method = %config.method, layers = config.layers, "starting inversion");

    let report = pipeline::run(&config).context("inversion failed")?;
    print_report(&config, &report);

    if let Some(path) = &cli.history_out {
        io::save_vector(path, "history", &report.trajectory.history)
            .with_context(|| format!("writing history to {}", path.display()))?;
        info!(path = %path.display(), "saved cost history");
    }
    if let Some(path) = &cli.velocity_out {
        io::save_vector(path, "velocity", &report.trajectory.velocity)
            .with_context(|| format!("writing velocities to {}", path.display()))?;
        info!(path = %path.display(), "saved estimated velocities");
    }

    Ok(())
}
