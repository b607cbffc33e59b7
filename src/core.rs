// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{InversionError, Result};

/// A differentiable misfit over a layered velocity model.
///
/// Implementors score a candidate velocity vector and return its analytic
/// gradient. Callers guarantee `v.len() == self.num_layers()`.
pub trait Objective {
    /// Get the per-layer thickness vector.
    fn thickness(&self) -> &[f64];

    /// Get the number of layers.
    fn num_layers(&self) -> usize {
        self.thickness().len()
    }

    /// Evaluate the scalar cost at `v`.
    fn cost(&self, v: &[f64]) -> f64;

    /// Evaluate the gradient of the cost with respect to each `v[i]`.
    fn gradient(&self, v: &[f64]) -> Vec<f64>;
}

/// Regularized least-squares misfit between a predicted and an observed
/// total travel time through a stack of constant-velocity layers.
///
/// `J(v) = 0.5 * (Σ d_i / v_i - T_obs)^2 + λ * Σ (v[i] - v[i-1])^2`
#[derive(Debug, Clone)]
pub struct TravelTimeMisfit {
    thickness: Vec<f64>,
    observed: f64,
    lambda: f64,
}

impl TravelTimeMisfit {
    /// Create an unregularized misfit for the given thicknesses and observed travel time.
    ///
    /// # Errors
    /// Returns an error if `thickness` is empty, any thickness is not positive and
    /// finite, or `observed` is not finite.
    pub fn new(thickness: Vec<f64>, observed: f64) -> Result<Self> {
        if thickness.is_empty() {
            return Err(InversionError::EmptyModel);
        }
        for (index, &value) in thickness.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(InversionError::InvalidThickness { index, value });
            }
        }
        if !observed.is_finite() {
            return Err(InversionError::InvalidObservation(observed));
        }
        Ok(TravelTimeMisfit {
            thickness,
            observed,
            lambda: 0.0,
        })
    }

    /// Set the smoothness regularization weight (builder method).
    ///
    /// # Errors
    /// Returns an error if `lambda` is negative or not finite.
    pub fn with_regularization(mut self, lambda: f64) -> Result<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(InversionError::InvalidRegularization(lambda));
        }
        self.lambda = lambda;
        Ok(self)
    }

    /// Get the observed travel time.
    pub fn observed(&self) -> f64 {
        self.observed
    }

    /// Get the regularization weight.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Travel time predicted by `v` through this stack.
    pub fn predicted(&self, v: &[f64]) -> f64 {
        sum_travel_time(v, &self.thickness)
    }
}

impl Objective for TravelTimeMisfit {
    fn thickness(&self) -> &[f64] {
        &self.thickness
    }

    fn cost(&self, v: &[f64]) -> f64 {
        misfit_cost(v, &self.thickness, self.observed, self.lambda)
    }

    fn gradient(&self, v: &[f64]) -> Vec<f64> {
        misfit_gradient(v, &self.thickness, self.observed, self.lambda)
    }
}

/// Total one-way travel time `Σ d_i / v_i` through the layer stack.
///
/// Velocities are not validated: a zero entry yields a non-finite result.
///
/// # Errors
/// Returns `LengthMismatch` if `v` and `d` differ in length, or
/// `EmptyModel` if both are empty.
pub fn travel_time(v: &[f64], d: &[f64]) -> Result<f64> {
    check_lengths(v, d)?;
    Ok(sum_travel_time(v, d))
}

/// Regularized misfit cost `0.5 * residual^2 + λ * Σ (v[i] - v[i-1])^2`.
///
/// # Errors
/// Returns `LengthMismatch` if `v` and `d` differ in length, or
/// `EmptyModel` if both are empty.
pub fn cost_function(v: &[f64], d: &[f64], observed: f64, lambda: f64) -> Result<f64> {
    check_lengths(v, d)?;
    Ok(misfit_cost(v, d, observed, lambda))
}

/// Analytic gradient of [`cost_function`] with respect to each velocity.
///
/// # Errors
/// Returns `LengthMismatch` if `v` and `d` differ in length, or
/// `EmptyModel` if both are empty.
pub fn gradient(v: &[f64], d: &[f64], observed: f64, lambda: f64) -> Result<Vec<f64>> {
    check_lengths(v, d)?;
    Ok(misfit_gradient(v, d, observed, lambda))
}

pub(crate) fn check_lengths(v: &[f64], d: &[f64]) -> Result<()> {
    if v.len() != d.len() {
        return Err(InversionError::LengthMismatch {
            velocity: v.len(),
            thickness: d.len(),
        });
    }
    if v.is_empty() {
        return Err(InversionError::EmptyModel);
    }
    Ok(())
}

fn sum_travel_time(v: &[f64], d: &[f64]) -> f64 {
    v.iter().zip(d).map(|(&vi, &di)| di / vi).sum()
}

/// Sum of squared differences between adjacent layer velocities.
fn roughness(v: &[f64]) -> f64 {
    v.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum()
}

fn misfit_cost(v: &[f64], d: &[f64], observed: f64, lambda: f64) -> f64 {
    let residual = sum_travel_time(v, d) - observed;
    0.5 * residual * residual + lambda * roughness(v)
}

fn misfit_gradient(v: &[f64], d: &[f64], observed: f64, lambda: f64) -> Vec<f64> {
    let residual = sum_travel_time(v, d) - observed;

    let mut grad: Vec<f64> = v
        .iter()
        .zip(d)
        .map(|(&vi, &di)| residual * (-di / (vi * vi)))
        .collect();

    // Each adjacent pair contributes to both of its members; interior
    // layers accumulate two contributions, endpoints one.
    let mut grad_reg = vec![0.0; v.len()];
    for i in 0..v.len().saturating_sub(1) {
        grad_reg[i] += 2.0 * (v[i] - v[i + 1]);
        grad_reg[i + 1] += 2.0 * (v[i + 1] - v[i]);
    }

    for (g, r) in grad.iter_mut().zip(&grad_reg) {
        *g += lambda * r;
    }
    grad
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn travel_time_sums_layers() {
        let t = travel_time(&[1500.0, 1800.0], &[10.0, 10.0]).unwrap();
        assert_relative_eq!(t, 10.0 / 1500.0 + 10.0 / 1800.0, epsilon = 1e-15);
        assert_relative_eq!(t, 0.012222222222222223, epsilon = 1e-15);
    }

    #[test]
    fn travel_time_length_mismatch() {
        let result = travel_time(&[1500.0, 1800.0], &[10.0]);
        assert!(matches!(
            result,
            Err(InversionError::LengthMismatch {
                velocity: 2,
                thickness: 1
            })
        ));
    }

    #[test]
    fn empty_model_is_rejected() {
        assert!(matches!(travel_time(&[], &[]), Err(InversionError::EmptyModel)));
        assert!(matches!(
            cost_function(&[], &[], 0.01, 0.0),
            Err(InversionError::EmptyModel)
        ));
        assert!(matches!(
            gradient(&[], &[], 0.01, 0.5),
            Err(InversionError::EmptyModel)
        ));
    }

    #[test]
    fn zero_velocity_is_not_finite() {
        let t = travel_time(&[0.0, 1800.0], &[10.0, 10.0]).unwrap();
        assert!(!t.is_finite());
    }

    #[test]
    fn cost_without_regularization_is_half_squared_residual() {
        let v = [2000.0, 2500.0, 3000.0];
        let d = [10.0, 20.0, 30.0];
        let observed = 0.02;
        let residual = travel_time(&v, &d).unwrap() - observed;
        let j = cost_function(&v, &d, observed, 0.0).unwrap();
        assert_relative_eq!(j, 0.5 * residual * residual, max_relative = 1e-14);
    }

    #[test]
    fn regularization_applied_once_to_whole_sum() {
        let v = [1000.0, 1001.0, 1003.0];
        let d = [1.0, 1.0, 1.0];
        let observed = travel_time(&v, &d).unwrap();
        // residual is zero, so only λ * (1 + 4) remains
        let j = cost_function(&v, &d, observed, 0.5).unwrap();
        assert_relative_eq!(j, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn single_layer_has_no_regularization() {
        let v = [2000.0];
        let d = [10.0];
        let observed = 0.004;
        let plain = cost_function(&v, &d, observed, 0.0).unwrap();
        let heavy = cost_function(&v, &d, observed, 100.0).unwrap();
        assert_eq!(plain, heavy);

        let g_plain = gradient(&v, &d, observed, 0.0).unwrap();
        let g_heavy = gradient(&v, &d, observed, 100.0).unwrap();
        assert_eq!(g_plain, g_heavy);
    }

    #[test]
    fn identical_neighbors_have_zero_regularization() {
        let v = [2500.0; 4];
        let d = [10.0; 4];
        let observed = 0.01;
        let plain = cost_function(&v, &d, observed, 0.0).unwrap();
        let reg = cost_function(&v, &d, observed, 0.7).unwrap();
        assert_eq!(plain, reg);
        assert_eq!(
            gradient(&v, &d, observed, 0.0).unwrap(),
            gradient(&v, &d, observed, 0.7).unwrap()
        );
    }

    #[test]
    fn regularization_gradient_accumulates_pairwise() {
        // Zero residual isolates the regularization part.
        let v = [1.0, 3.0, 2.0];
        let d = [1.0, 1.0, 1.0];
        let observed = travel_time(&v, &d).unwrap();
        let g = gradient(&v, &d, observed, 1.0).unwrap();
        // pair (0,1): +2*(1-3) to 0, +2*(3-1) to 1
        // pair (1,2): +2*(3-2) to 1, +2*(2-3) to 2
        assert_relative_eq!(g[0], -4.0, epsilon = 1e-12);
        assert_relative_eq!(g[1], 6.0, epsilon = 1e-12);
        assert_relative_eq!(g[2], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn data_gradient_matches_closed_form() {
        let v = [1500.0, 1800.0];
        let d = [10.0, 20.0];
        let observed = 0.01;
        let residual = travel_time(&v, &d).unwrap() - observed;
        let g = gradient(&v, &d, observed, 0.0).unwrap();
        for i in 0..2 {
            assert_relative_eq!(
                g[i],
                residual * (-d[i] / (v[i] * v[i])),
                max_relative = 1e-14
            );
        }
    }

    #[test]
    fn misfit_validates_inputs() {
        assert!(matches!(
            TravelTimeMisfit::new(vec![], 0.1),
            Err(InversionError::EmptyModel)
        ));
        assert!(matches!(
            TravelTimeMisfit::new(vec![10.0, 0.0], 0.1),
            Err(InversionError::InvalidThickness { index: 1, .. })
        ));
        assert!(matches!(
            TravelTimeMisfit::new(vec![10.0], f64::NAN),
            Err(InversionError::InvalidObservation(_))
        ));
        let misfit = TravelTimeMisfit::new(vec![10.0], 0.1).unwrap();
        assert!(matches!(
            misfit.with_regularization(-1.0),
            Err(InversionError::InvalidRegularization(_))
        ));
    }

    #[test]
    fn objective_agrees_with_free_functions() {
        let d = vec![10.0, 15.0, 20.0];
        let v = [1700.0, 2100.0, 2600.0];
        let misfit = TravelTimeMisfit::new(d.clone(), 0.02)
            .unwrap()
            .with_regularization(0.05)
            .unwrap();
        assert_eq!(misfit.num_layers(), 3);
        assert_eq!(misfit.cost(&v), cost_function(&v, &d, 0.02, 0.05).unwrap());
        assert_eq!(
            misfit.gradient(&v),
            gradient(&v, &d, 0.02, 0.05).unwrap()
        );
        assert_eq!(misfit.predicted(&v), travel_time(&v, &d).unwrap());
    }

    fn layer_case() -> impl Strategy<Value = (Vec<f64>, Vec<f64>, Vec<f64>, f64)> {
        (1usize..8).prop_flat_map(|n| {
            (
                prop::collection::vec(500.0f64..5000.0, n),
                prop::collection::vec(500.0f64..5000.0, n),
                prop::collection::vec(1.0f64..100.0, n),
                0.0f64..1.0,
            )
        })
    }

    proptest! {
        #[test]
        fn gradient_matches_central_difference((v, v_true, d, lambda) in layer_case()) {
            let observed = travel_time(&v_true, &d).unwrap();
            let g = gradient(&v, &d, observed, lambda).unwrap();
            let scale = g.iter().fold(0.0f64, |m, x| m.max(x.abs()));

            for i in 0..v.len() {
                let h = 1e-6 * v[i];
                let mut plus = v.clone();
                let mut minus = v.clone();
                plus[i] += h;
                minus[i] -= h;
                let fd = (cost_function(&plus, &d, observed, lambda).unwrap()
                    - cost_function(&minus, &d, observed, lambda).unwrap())
                    / (2.0 * h);
                let tol = 1e-4 * g[i].abs().max(scale) + 1e-18;
                prop_assert!(
                    (fd - g[i]).abs() <= tol,
                    "component {}: fd={} analytic={}", i, fd, g[i]
                );
            }
        }

        #[test]
        fn cost_is_non_negative((v, v_true, d, lambda) in layer_case()) {
            let observed = travel_time(&v_true, &d).unwrap();
            prop_assert!(cost_function(&v, &d, observed, lambda).unwrap() >= 0.0);
        }
    }
}
