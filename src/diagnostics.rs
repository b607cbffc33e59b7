// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

use crate::core::travel_time;
use crate::error::{InversionError, Result};
use crate::optimizer::Trajectory;

/// Final cost below which a run counts as converged.
pub const CONVERGENCE_THRESHOLD: f64 = 1e-6;

/// Outcome class of an optimizer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Final cost fell below [`CONVERGENCE_THRESHOLD`].
    Converged,
    /// Final cost ended above the initial cost, or is not finite.
    Diverged,
    /// Cost did not grow but stayed above the threshold.
    Partial,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Converged => write!(f, "Convergence achieved."),
            Verdict::Diverged => write!(f, "Divergence detected."),
            Verdict::Partial => write!(f, "Partial convergence."),
        }
    }
}

/// Classify a cost history by comparing its last entry to its first.
///
/// # Errors
/// Returns `EmptyHistory` if `history` has no entries.
pub fn classify(history: &[f64]) -> Result<Verdict> {
    let (first, last) = match (history.first(), history.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(InversionError::EmptyHistory),
    };

    if !last.is_finite() || last > first {
        Ok(Verdict::Diverged)
    } else if last < CONVERGENCE_THRESHOLD {
        Ok(Verdict::Converged)
    } else {
        Ok(Verdict::Partial)
    }
}

/// Summary of a finished run: observed vs predicted travel time and verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    /// Observed travel time the run was fitted to.
    pub observed: f64,
    /// Travel time predicted by the final velocity vector.
    pub predicted: f64,
    /// Cost of the starting model.
    pub initial_cost: f64,
    /// Last recorded cost.
    pub final_cost: f64,
    /// Outcome class.
    pub verdict: Verdict,
}

impl Diagnostics {
    /// Build diagnostics for `trajectory` fitted against `observed` through `thickness`.
    ///
    /// # Errors
    /// Returns an error if the history is empty or the final velocity length
    /// does not match `thickness`.
    pub fn new(trajectory: &Trajectory, thickness: &[f64], observed: f64) -> Result<Self> {
        let verdict = classify(&trajectory.history)?;
        let predicted = travel_time(&trajectory.velocity, thickness)?;
        let initial_cost = trajectory.initial_cost().ok_or(InversionError::EmptyHistory)?;
        let final_cost = trajectory.final_cost().ok_or(InversionError::EmptyHistory)?;
        Ok(Diagnostics {
            observed,
            predicted,
            initial_cost,
            final_cost,
            verdict,
        })
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Observed Travel Time: {:.6}", self.observed)?;
        writeln!(f, "Predicted Travel Time: {:.6}", self.predicted)?;
        writeln!(f, "Final Cost: {:.6e}", self.final_cost)?;
        write!(f, "{}", self.verdict)
    }
}
