// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::core::{check_lengths, Objective, TravelTimeMisfit};
use crate::error::{InversionError, Result};
use crate::update_rules::Method;

/// Progress information passed to the optional callback after each cost evaluation.
pub struct ProgressInfo {
    /// Zero-based iteration index.
    pub iteration: usize,
    /// Cost of the candidate before this iteration's update.
    pub cost: f64,
    /// Elapsed time since the run started.
    pub elapsed: Duration,
}

/// Result of an optimizer run.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Velocity vector after the last update.
    pub velocity: Vec<f64>,
    /// Cost recorded before each update, one entry per iteration.
    ///
    /// The cost of `velocity` itself is not included.
    pub history: Vec<f64>,
}

impl Trajectory {
    /// Cost of the starting model.
    pub fn initial_cost(&self) -> Option<f64> {
        self.history.first().copied()
    }

    /// Last recorded cost (the model before the final update).
    pub fn final_cost(&self) -> Option<f64> {
        self.history.last().copied()
    }

    /// Split into `(velocity, history)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.velocity, self.history)
    }
}

/// Fixed-iteration first-order optimizer over a layered velocity model.
///
/// Runs exactly `iterations` steps with no stopping criterion and no
/// divergence guard. Non-finite values produced along the way propagate
/// into the returned trajectory.
pub struct Optimizer {
    method: Method,
    learning_rate: f64,
    iterations: usize,
    progress_callback: Option<Box<dyn Fn(ProgressInfo) + Send + Sync>>,
}

impl Optimizer {
    /// Create an optimizer with the given update rule and learning rate.
    /// Runs 100 iterations unless changed with [`Optimizer::with_iterations`].
    ///
    /// # Errors
    /// Returns an error if the learning rate is not finite.
    pub fn new(method: Method, learning_rate: f64) -> Result<Self> {
        if !learning_rate.is_finite() {
            return Err(InversionError::InvalidLearningRate(learning_rate));
        }
        Ok(Optimizer {
            method,
            learning_rate,
            iterations: 100,
            progress_callback: None,
        })
    }

    /// Set the number of iterations (builder method).
    ///
    /// # Errors
    /// Returns an error if `iterations` is zero.
    pub fn with_iterations(mut self, iterations: usize) -> Result<Self> {
        if iterations == 0 {
            return Err(InversionError::InvalidIterations(iterations));
        }
        self.iterations = iterations;
        Ok(self)
    }

    /// Set a callback invoked once per iteration (builder method).
    pub fn with_progress(mut self, callback: Box<dyn Fn(ProgressInfo) + Send + Sync>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Get the update rule.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Get the learning rate.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Get the iteration count.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Run the optimizer from `v0`, which is copied and left untouched.
    ///
    /// # Errors
    /// Returns `LengthMismatch` if `v0` does not have one entry per layer.
    pub fn run<O: Objective>(&self, objective: &O, v0: &[f64]) -> Result<Trajectory> {
        let d = objective.thickness();
        check_lengths(v0, d)?;

        let start = Instant::now();
        let mut v = v0.to_vec();
        let mut history = Vec::with_capacity(self.iterations);

        for iteration in 0..self.iterations {
            let cost = objective.cost(&v);
            history.push(cost);
            trace!(iteration, cost, "cost evaluated");

            if let Some(cb) = &self.progress_callback {
                cb(ProgressInfo {
                    iteration,
                    cost,
                    elapsed: start.elapsed(),
                });
            }

            let grad = objective.gradient(&v);
            self.method.apply(&mut v, &grad, d, self.learning_rate);
        }

        debug!(
            method = %self.method,
            iterations = self.iterations,
            learning_rate = self.learning_rate,
            initial_cost = history.first().copied().unwrap_or(f64::NAN),
            final_cost = history.last().copied().unwrap_or(f64::NAN),
            elapsed_us = start.elapsed().as_micros() as u64,
            "optimizer run finished"
        );

        Ok(Trajectory {
            velocity: v,
            history,
        })
    }
}

fn run_method(
    method: Method,
    v0: &[f64],
    d: &[f64],
    observed: f64,
    learning_rate: f64,
    iterations: usize,
    lambda: f64,
) -> Result<Trajectory> {
    check_lengths(v0, d)?;
    let misfit = TravelTimeMisfit::new(d.to_vec(), observed)?.with_regularization(lambda)?;
    Optimizer::new(method, learning_rate)?
        .with_iterations(iterations)?
        .run(&misfit, v0)
}

/// Plain gradient descent for `iterations` steps from `v0`.
///
/// # Errors
/// Returns an error if `v0` and `d` differ in length, the model is empty, any
/// thickness is not positive, `iterations` is zero, or `learning_rate`,
/// `observed` or `lambda` is out of range.
pub fn gradient_descent(
    v0: &[f64],
    d: &[f64],
    observed: f64,
    learning_rate: f64,
    iterations: usize,
    lambda: f64,
) -> Result<Trajectory> {
    run_method(
        Method::GradientDescent,
        v0,
        d,
        observed,
        learning_rate,
        iterations,
        lambda,
    )
}

/// Diagonal-preconditioned quasi-Newton descent for `iterations` steps from `v0`.
///
/// # Errors
/// Same conditions as [`gradient_descent`].
pub fn quasi_newton(
    v0: &[f64],
    d: &[f64],
    observed: f64,
    learning_rate: f64,
    iterations: usize,
    lambda: f64,
) -> Result<Trajectory> {
    run_method(
        Method::QuasiNewton,
        v0,
        d,
        observed,
        learning_rate,
        iterations,
        lambda,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{cost_function, gradient, travel_time};
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const D: [f64; 2] = [10.0, 10.0];

    fn observed() -> f64 {
        travel_time(&[1500.0, 1800.0], &D).unwrap()
    }

    #[test]
    fn history_length_equals_iterations() {
        for n in [1, 7, 100] {
            let gd = gradient_descent(&[3000.0, 3000.0], &D, observed(), 10.0, n, 0.0).unwrap();
            let qn = quasi_newton(&[3000.0, 3000.0], &D, observed(), 0.1, n, 0.0).unwrap();
            assert_eq!(gd.history.len(), n);
            assert_eq!(qn.history.len(), n);
        }
    }

    #[test]
    fn single_iteration_records_initial_cost() {
        let v0 = [3000.0, 2000.0];
        let t = observed();
        let traj = gradient_descent(&v0, &D, t, 10.0, 1, 0.1).unwrap();
        assert_eq!(traj.history, vec![cost_function(&v0, &D, t, 0.1).unwrap()]);

        let g = gradient(&v0, &D, t, 0.1).unwrap();
        assert_relative_eq!(traj.velocity[0], v0[0] - 10.0 * g[0], max_relative = 1e-15);
        assert_relative_eq!(traj.velocity[1], v0[1] - 10.0 * g[1], max_relative = 1e-15);
    }

    #[test]
    fn final_velocity_cost_is_never_recorded() {
        let v0 = [3000.0, 3000.0];
        let t = observed();
        let short = quasi_newton(&v0, &D, t, 0.1, 5, 0.0).unwrap();
        let long = quasi_newton(&v0, &D, t, 0.1, 6, 0.0).unwrap();
        assert_eq!(&long.history[..5], &short.history[..]);
        assert_eq!(long.history[5], cost_function(&short.velocity, &D, t, 0.0).unwrap());
    }

    #[test]
    fn caller_vector_is_not_mutated() {
        let v0 = vec![3000.0, 3000.0];
        let before = v0.clone();
        let _ = quasi_newton(&v0, &D, observed(), 0.1, 10, 0.0).unwrap();
        assert_eq!(v0, before);
    }

    #[test]
    fn quasi_newton_first_step_uses_inverse_hessian() {
        let v0 = [3000.0, 3000.0];
        let t = observed();
        let traj = quasi_newton(&v0, &D, t, 0.1, 1, 0.0).unwrap();
        let g = gradient(&v0, &D, t, 0.0).unwrap();
        let h_inv = 3000.0f64.powi(4) / 100.0;
        assert_relative_eq!(
            traj.velocity[0],
            3000.0 - 0.1 * h_inv * g[0],
            max_relative = 1e-12
        );
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let result = gradient_descent(&[3000.0], &D, observed(), 10.0, 10, 0.0);
        assert!(matches!(
            result,
            Err(InversionError::LengthMismatch {
                velocity: 1,
                thickness: 2
            })
        ));
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let v0 = [3000.0, 3000.0];
        assert!(matches!(
            gradient_descent(&v0, &D, observed(), 10.0, 0, 0.0),
            Err(InversionError::InvalidIterations(0))
        ));
        assert!(matches!(
            quasi_newton(&v0, &D, observed(), f64::INFINITY, 10, 0.0),
            Err(InversionError::InvalidLearningRate(_))
        ));
        assert!(matches!(
            quasi_newton(&v0, &D, observed(), 1.0, 10, -0.1),
            Err(InversionError::InvalidRegularization(_))
        ));
        assert!(matches!(
            gradient_descent(&[], &[], 0.0, 1.0, 10, 0.0),
            Err(InversionError::EmptyModel)
        ));
    }

    #[test]
    fn zero_velocity_propagates_non_finite_cost() {
        let traj = gradient_descent(&[0.0, 3000.0], &D, observed(), 10.0, 3, 0.0).unwrap();
        assert!(!traj.history[0].is_finite());
    }

    #[test]
    fn progress_callback_called_every_iteration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let misfit = TravelTimeMisfit::new(D.to_vec(), observed()).unwrap();
        let optimizer = Optimizer::new(Method::GradientDescent, 10.0)
            .unwrap()
            .with_iterations(25)
            .unwrap()
            .with_progress(Box::new(move |info: ProgressInfo| {
                assert_eq!(info.iteration, counter.fetch_add(1, Ordering::SeqCst));
                assert!(info.cost >= 0.0);
            }));
        let traj = optimizer.run(&misfit, &[3000.0, 3000.0]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 25);
        assert_eq!(traj.history.len(), 25);
    }

    #[test]
    fn optimizer_run_checks_start_length() {
        let misfit = TravelTimeMisfit::new(D.to_vec(), observed()).unwrap();
        let optimizer = Optimizer::new(Method::QuasiNewton, 0.1).unwrap();
        assert_eq!(optimizer.iterations(), 100);
        assert!(matches!(
            optimizer.run(&misfit, &[3000.0, 3000.0, 3000.0]),
            Err(InversionError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn trajectory_accessors() {
        let traj = Trajectory {
            velocity: vec![1.0],
            history: vec![3.0, 2.0, 1.0],
        };
        assert_eq!(traj.initial_cost(), Some(3.0));
        assert_eq!(traj.final_cost(), Some(1.0));
        let (v, h) = traj.into_parts();
        assert_eq!(v, vec![1.0]);
        assert_eq!(h.len(), 3);
    }
}
