// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::core::travel_time;
use crate::error::{InversionError, Result};

/// Deterministic random source for a given seed.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Synthesize an observed travel time from a true velocity model.
///
/// Returns `T_true * (1 + ε)` with `ε ~ Normal(0, noise)` drawn from `rng`.
/// A noise level of zero returns the exact travel time.
///
/// # Errors
/// Returns an error if lengths differ, the model is empty, any true velocity or
/// thickness is not positive and finite, or `noise` is negative or not finite.
pub fn synthesize_observation<R: Rng + ?Sized>(
    v_true: &[f64],
    d: &[f64],
    noise: f64,
    rng: &mut R,
) -> Result<f64> {
    if !noise.is_finite() || noise < 0.0 {
        return Err(InversionError::InvalidNoise(noise));
    }
    if v_true.is_empty() {
        return Err(InversionError::EmptyModel);
    }
    for (index, &value) in v_true.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(InversionError::InvalidVelocity { index, value });
        }
    }
    for (index, &value) in d.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(InversionError::InvalidThickness { index, value });
        }
    }

    let t_true = travel_time(v_true, d)?;
    let normal = Normal::new(0.0, noise).map_err(|e| InversionError::Other(e.to_string()))?;
    let epsilon = normal.sample(rng);
    let observed = t_true * (1.0 + epsilon);

    debug!(t_true, noise, epsilon, observed, "synthesized observation");
    Ok(observed)
}
