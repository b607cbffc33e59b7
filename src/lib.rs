// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

//! Recover layer velocities from a single observed travel time.
//!
//! A stack of N layers with known thicknesses `d` and unknown velocities `v`
//! has total one-way travel time `T(v) = Σ d_i / v_i`. This library fits `v`
//! to an observed `T_obs` by minimizing a regularized least-squares misfit
//! with either plain gradient descent or a diagonal-preconditioned
//! quasi-Newton step, recording the cost at every iteration.
//!
//! A run is three independent stages: synthesize an observation from a true
//! model ([`synth`]), optimize ([`optimizer`]), and classify the outcome
//! ([`diagnostics`]). [`pipeline::run`] chains them from an
//! [`InversionConfig`].

#![warn(missing_docs)]

/// Run configuration.
pub mod config;
/// Forward model, misfit cost and gradient.
pub mod core;
/// Convergence classification and run summary.
pub mod diagnostics;
/// Error types for the library.
pub mod error;
/// File I/O for velocity profiles and cost histories.
pub mod io;
/// Fixed-iteration optimizer loop.
pub mod optimizer;
/// Synthesize, invert, diagnose.
pub mod pipeline;
/// Synthetic observation with seeded noise.
pub mod synth;
/// Per-iteration update rules.
pub mod update_rules;

pub use crate::config::InversionConfig;
pub use crate::core::{cost_function, gradient, travel_time, Objective, TravelTimeMisfit};
pub use crate::diagnostics::{classify, Diagnostics, Verdict};
pub use crate::error::{InversionError, Result};
pub use crate::optimizer::{gradient_descent, quasi_newton, Optimizer, ProgressInfo, Trajectory};
pub use crate::update_rules::Method;
