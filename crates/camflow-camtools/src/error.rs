//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for strategy parameter validation and
//! G-code export.

use std::io;
use thiserror::Error;

/// Errors that can occur while writing G-code.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Errors related to strategy parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: f64,
        /// Inclusive lower limit.
        min: f64,
        /// Upper limit.
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_error_display() {
        let err = ParameterError::OutOfRange {
            name: "overlap".to_string(),
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'overlap' out of range: 1.5 (valid: 0..1)"
        );

        let err = ParameterError::InvalidValue {
            name: "step_down".to_string(),
            reason: "expected a number, got \"2\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for 'step_down': expected a number, got \"2\""
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let err: CamToolError = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert_eq!(err.to_string(), "I/O error: closed");
    }
}
