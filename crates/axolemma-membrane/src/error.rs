// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for membrane parameter validation

/// Rejection reasons for membrane parameters.
///
/// Values are never clamped: anything outside its domain is reported and the
/// caller's state is left as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be > 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub type Result<T> = core::result::Result<T, ParameterError>;

/// Reject NaN and infinities.
pub fn require_finite(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::NonFinite { field, value })
    }
}

/// Finite and strictly positive.
pub fn require_positive(field: &'static str, value: f64) -> Result<f64> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::NotPositive { field, value })
    }
}

/// Finite and >= 0.
pub fn require_non_negative(field: &'static str, value: f64) -> Result<f64> {
    require_finite(field, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::Negative { field, value })
    }
}

/// Finite fraction in [0, 1].
pub fn require_fraction(field: &'static str, value: f64) -> Result<f64> {
    require_finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ParameterError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}
