// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use tracing::{info, warn};

use crate::config::InversionConfig;
use crate::core::TravelTimeMisfit;
use crate::diagnostics::{Diagnostics, Verdict};
use crate::error::Result;
use crate::optimizer::{Optimizer, Trajectory};
use crate::synth::{seeded_rng, synthesize_observation};

/// Everything produced by one synthesize / invert / diagnose run.
#[derive(Debug, Clone)]
pub struct InversionReport {
    /// Velocities the observation was synthesized from.
    pub true_velocity: Vec<f64>,
    /// Layer thicknesses.
    pub thickness: Vec<f64>,
    /// Synthesized observed travel time.
    pub observed: f64,
    /// Optimizer output.
    pub trajectory: Trajectory,
    /// Classification and travel-time summary.
    pub diagnostics: Diagnostics,
}

/// Run the three stages described by `config`.
///
/// # Errors
/// Returns an error if the configuration is invalid.
pub fn run(config: &InversionConfig) -> Result<InversionReport> {
    config.validate()?;

    let thickness = config.thickness();
    let true_velocity = config.true_velocity();
    let mut rng = seeded_rng(config.seed);
    let observed = synthesize_observation(&true_velocity, &thickness, config.noise, &mut rng)?;

    let misfit = TravelTimeMisfit::new(thickness.clone(), observed)?
        .with_regularization(config.lambda_reg)?;
    let trajectory = Optimizer::new(config.method, config.learning_rate)?
        .with_iterations(config.iterations)?
        .run(&misfit, &config.starting_velocity())?;

    let diagnostics = Diagnostics::new(&trajectory, &thickness, observed)?;
    match diagnostics.verdict {
        Verdict::Diverged => warn!(
            method = %config.method,
            learning_rate = config.learning_rate,
            initial_cost = diagnostics.initial_cost,
            final_cost = diagnostics.final_cost,
            "run diverged"
        ),
        verdict => info!(
            method = %config.method,
            layers = config.layers,
            final_cost = diagnostics.final_cost,
            ?verdict,
            "run finished"
        ),
    }

    Ok(InversionReport {
        true_velocity,
        thickness,
        observed,
        trajectory,
        diagnostics,
    })
}
