// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Run configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file) describes the
//! five-layer demonstration model.

use std::path::Path;

use serde::Deserialize;

use crate::error::{InversionError, Result};
use crate::update_rules::Method;

/// Parameters of one synthesize / invert / diagnose run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InversionConfig {
    /// Number of layers (N).
    pub layers: usize,
    /// Thickness of every layer in meters.
    pub layer_thickness: f64,
    /// True velocities in m/s; `1500 + 300 * i` when omitted.
    pub v_true: Option<Vec<f64>>,
    /// Standard deviation of the multiplicative noise on the observation.
    pub noise: f64,
    /// Seed for the noise draw.
    pub seed: u64,
    /// Update rule.
    pub method: Method,
    /// Learning rate γ.
    pub learning_rate: f64,
    /// Number of optimizer iterations.
    pub iterations: usize,
    /// Starting velocity for every layer in m/s.
    pub initial_velocity: f64,
    /// Smoothness regularization weight λ.
    pub lambda_reg: f64,
}

impl Default for InversionConfig {
    fn default() -> Self {
        InversionConfig {
            layers: 5,
            layer_thickness: 10.0,
            v_true: None,
            noise: 0.0,
            seed: 0,
            method: Method::GradientDescent,
            learning_rate: 10.0,
            iterations: 100,
            initial_velocity: 3000.0,
            lambda_reg: 0.0,
        }
    }
}

impl InversionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    /// Returns `Config` if the text is not valid TOML or has unknown fields.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| InversionError::Config(format!("failed to parse config: {}", e)))
    }

    /// Check that every parameter is in range.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.layers == 0 {
            return Err(InversionError::EmptyModel);
        }
        if !self.layer_thickness.is_finite() || self.layer_thickness <= 0.0 {
            return Err(InversionError::InvalidThickness {
                index: 0,
                value: self.layer_thickness,
            });
        }
        if let Some(v_true) = &self.v_true {
            if v_true.len() != self.layers {
                return Err(InversionError::LengthMismatch {
                    velocity: v_true.len(),
                    thickness: self.layers,
                });
            }
            for (index, &value) in v_true.iter().enumerate() {
                if !value.is_finite() || value <= 0.0 {
                    return Err(InversionError::InvalidVelocity { index, value });
                }
            }
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err(InversionError::InvalidNoise(self.noise));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(InversionError::InvalidLearningRate(self.learning_rate));
        }
        if self.iterations == 0 {
            return Err(InversionError::InvalidIterations(self.iterations));
        }
        if !self.initial_velocity.is_finite() || self.initial_velocity <= 0.0 {
            return Err(InversionError::InvalidVelocity {
                index: 0,
                value: self.initial_velocity,
            });
        }
        if !self.lambda_reg.is_finite() || self.lambda_reg < 0.0 {
            return Err(InversionError::InvalidRegularization(self.lambda_reg));
        }
        Ok(())
    }

    /// Per-layer thickness vector.
    pub fn thickness(&self) -> Vec<f64> {
        vec![self.layer_thickness; self.layers]
    }

    /// True velocity vector, explicit or the default linear profile.
    pub fn true_velocity(&self) -> Vec<f64> {
        match &self.v_true {
            Some(v) => v.clone(),
            None => (0..self.layers).map(|i| 1500.0 + 300.0 * i as f64).collect(),
        }
    }

    /// Uniform starting model.
    pub fn starting_velocity(&self) -> Vec<f64> {
        vec![self.initial_velocity; self.layers]
    }
}
