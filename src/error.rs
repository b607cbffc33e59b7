// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

/// Errors that can occur while setting up, running, or exporting an inversion.
#[derive(Debug)]
pub enum InversionError {
    /// Velocity and thickness vectors have different lengths.
    LengthMismatch {
        /// Length of the velocity vector.
        velocity: usize,
        /// Length of the thickness vector.
        thickness: usize,
    },
    /// The layer stack has no layers.
    EmptyModel,
    /// Layer thickness is not positive and finite.
    InvalidThickness {
        /// The layer index.
        index: usize,
        /// The invalid value.
        value: f64,
    },
    /// Velocity value is not positive and finite.
    InvalidVelocity {
        /// The layer index.
        index: usize,
        /// The invalid value.
        value: f64,
    },
    /// Observed travel time is not finite.
    InvalidObservation(f64),
    /// Learning rate is not finite (or not positive, where required).
    InvalidLearningRate(f64),
    /// Iteration count is zero.
    InvalidIterations(usize),
    /// Regularization weight is negative or not finite.
    InvalidRegularization(f64),
    /// Noise level is negative or not finite.
    InvalidNoise(f64),
    /// A cost history with no entries was passed to diagnostics.
    EmptyHistory,
    /// Configuration could not be parsed or is inconsistent.
    Config(String),
    /// Unsupported data type in file.
    UnsupportedDtype(String),
    /// Unsupported file format (unrecognized extension).
    UnsupportedFileFormat(String),
    /// Expected MAT variable not found in file.
    MatVariableNotFound {
        /// The variable name that was requested.
        expected: String,
        /// The variable names that are available.
        available: Vec<String>,
    },
    /// I/O error occurred.
    IoError(std::io::Error),
    /// Other error with a descriptive message.
    Other(String),
}

impl fmt::Display for InversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InversionError::LengthMismatch {
                velocity,
                thickness,
            } => {
                write!(
                    f,
                    "length mismatch: velocity has {} layers but thickness has {}",
                    velocity, thickness
                )
            }
            InversionError::EmptyModel => write!(f, "layer model is empty (need at least 1 layer)"),
            InversionError::InvalidThickness { index, value } => {
                write!(
                    f,
                    "invalid thickness at layer {}: {} (must be positive and finite)",
                    index, value
                )
            }
            InversionError::InvalidVelocity { index, value } => {
                write!(
                    f,
                    "invalid velocity at layer {}: {} (must be positive and finite)",
                    index, value
                )
            }
            InversionError::InvalidObservation(t) => {
                write!(f, "invalid observed travel time: {} (must be finite)", t)
            }
            InversionError::InvalidLearningRate(lr) => {
                write!(f, "invalid learning rate: {}", lr)
            }
            InversionError::InvalidIterations(n) => {
                write!(f, "invalid iteration count: {} (must be >= 1)", n)
            }
            InversionError::InvalidRegularization(lambda) => {
                write!(
                    f,
                    "invalid regularization weight: {} (must be non-negative and finite)",
                    lambda
                )
            }
            InversionError::InvalidNoise(sigma) => {
                write!(
                    f,
                    "invalid noise level: {} (must be non-negative and finite)",
                    sigma
                )
            }
            InversionError::EmptyHistory => write!(f, "cost history is empty"),
            InversionError::Config(msg) => write!(f, "config error: {}", msg),
            InversionError::UnsupportedDtype(dtype) => {
                write!(f, "unsupported dtype: {}", dtype)
            }
            InversionError::UnsupportedFileFormat(ext) => {
                write!(f, "unsupported file format: {}", ext)
            }
            InversionError::MatVariableNotFound {
                expected,
                available,
            } => {
                write!(
                    f,
                    "MAT variable '{}' not found; available variables: {:?}",
                    expected, available
                )
            }
            InversionError::IoError(e) => write!(f, "I/O error: {}", e),
            InversionError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for InversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InversionError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InversionError {
    fn from(e: std::io::Error) -> Self {
        InversionError::IoError(e)
    }
}

/// Convenience type alias for Results with InversionError.
pub type Result<T> = std::result::Result<T, InversionError>;
