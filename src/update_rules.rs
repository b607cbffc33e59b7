// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::InversionError;

/// Update rule applied once per optimizer iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Plain gradient descent: `v := v - γ * ∇J`.
    #[default]
    GradientDescent,
    /// Diagonal-preconditioned step: `v := v - γ * H_inv ⊙ ∇J`.
    QuasiNewton,
}

impl Method {
    /// Apply one update to `v` in place.
    ///
    /// `grad` and `d` must have the same length as `v`.
    pub fn apply(self, v: &mut [f64], grad: &[f64], d: &[f64], learning_rate: f64) {
        match self {
            Method::GradientDescent => gradient_step(v, grad, learning_rate),
            Method::QuasiNewton => {
                let h_inv = diagonal_inverse_hessian(v, d);
                preconditioned_step(v, grad, &h_inv, learning_rate);
            }
        }
    }

    /// Human-readable name, as shown in reports.
    pub fn label(self) -> &'static str {
        match self {
            Method::GradientDescent => "Gradient Descent",
            Method::QuasiNewton => "Quasi-Newton",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::GradientDescent => write!(f, "gradient-descent"),
            Method::QuasiNewton => write!(f, "quasi-newton"),
        }
    }
}

impl FromStr for Method {
    type Err = InversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gradient-descent" | "gd" => Ok(Method::GradientDescent),
            "quasi-newton" | "qn" => Ok(Method::QuasiNewton),
            other => Err(InversionError::Config(format!(
                "unknown method '{}': expected 'gradient-descent' or 'quasi-newton'",
                other
            ))),
        }
    }
}

/// Elementwise inverse of the misfit curvature, `v_i^4 / d_i^2`.
///
/// Ignores cross terms and the regularization curvature. Grows as the fourth
/// power of velocity, so a large candidate produces an even larger step.
pub fn diagonal_inverse_hessian(v: &[f64], d: &[f64]) -> Vec<f64> {
    v.iter()
        .zip(d)
        .map(|(&vi, &di)| vi.powi(4) / (di * di))
        .collect()
}

/// `v := v - γ * grad`
pub fn gradient_step(v: &mut [f64], grad: &[f64], learning_rate: f64) {
    for (vi, &gi) in v.iter_mut().zip(grad) {
        *vi -= learning_rate * gi;
    }
}

/// `v := v - γ * h_inv ⊙ grad`
pub fn preconditioned_step(v: &mut [f64], grad: &[f64], h_inv: &[f64], learning_rate: f64) {
    for ((vi, &gi), &hi) in v.iter_mut().zip(grad).zip(h_inv) {
        *vi -= learning_rate * hi * gi;
    }
}
