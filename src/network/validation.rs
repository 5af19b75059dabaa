//! Input validation for client-reported coordinates.
//!
//! Rules:
//! - NaN/Inf: DROP + LOG
//! - |value| above the configured limit: DROP + LOG
//!
//! Missing or non-numeric fields never get this far; they fail to parse.
//! Values inside the limit are accepted as-is, even outside the arena.

use thiserror::Error;

/// Default bound on the absolute value of any reported coordinate.
pub const MAX_ABS_COORDINATE: f64 = 100_000.0;

/// Validation configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationConfig {
    /// Largest accepted absolute coordinate or offset.
    pub max_abs_coordinate: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_abs_coordinate: MAX_ABS_COORDINATE,
        }
    }
}

/// Why a payload was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// NaN or infinite value.
    #[error("{field} is not finite")]
    NotFinite {
        /// Offending field.
        field: &'static str,
    },
    /// Value beyond the configured limit.
    #[error("{field} = {value} exceeds limit {limit}")]
    OutOfRange {
        /// Offending field.
        field: &'static str,
        /// Reported value.
        value: f64,
        /// Configured limit.
        limit: f64,
    },
}

impl ValidationConfig {
    /// Check a single numeric field.
    pub fn check(&self, field: &'static str, value: f64) -> Result<f64, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value.abs() > self.max_abs_coordinate {
            return Err(ValidationError::OutOfRange {
                field,
                value,
                limit: self.max_abs_coordinate,
            });
        }
        Ok(value)
    }

    /// Check a `move` payload.
    pub fn check_move(&self, x: f64, y: f64) -> Result<(f64, f64), ValidationError> {
        Ok((self.check("x", x)?, self.check("y", y)?))
    }

    /// Check a `jump` payload.
    pub fn check_jump(&self, xy: f64) -> Result<f64, ValidationError> {
        self.check("xy", xy)
    }
}
