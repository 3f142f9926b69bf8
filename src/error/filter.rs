// Filter design and filtering error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Filter error code constants
///
/// Error code range: 1001-1002
pub struct FilterErrorCodes {}

impl FilterErrorCodes {
    /// Band, sampling rate or derived order violates the design constraints
    pub const INVALID_FILTER_SPECIFICATION: i32 = 1001;

    /// Signal is too short for the forward-backward padding
    pub const INSUFFICIENT_SIGNAL_LENGTH: i32 = 1002;
}

/// Log a filter error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_filter_error(err: &FilterError, context: &str) {
    error!(
        "Filter error in {}: code={}, component=FilterDesigner, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while designing or applying the band-pass filter
///
/// Both variants stem from invalid input and are never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Band edges, sampling rate or derived order are infeasible
    InvalidFilterSpecification { reason: String },

    /// Signal length does not exceed the required padding length
    InsufficientSignalLength { required: usize, actual: usize },
}

impl ErrorCode for FilterError {
    fn code(&self) -> i32 {
        match self {
            FilterError::InvalidFilterSpecification { .. } => {
                FilterErrorCodes::INVALID_FILTER_SPECIFICATION
            }
            FilterError::InsufficientSignalLength { .. } => {
                FilterErrorCodes::INSUFFICIENT_SIGNAL_LENGTH
            }
        }
    }

    fn message(&self) -> String {
        match self {
            FilterError::InvalidFilterSpecification { reason } => {
                format!("Invalid filter specification: {}", reason)
            }
            FilterError::InsufficientSignalLength { required, actual } => {
                format!(
                    "Signal too short for zero-phase filtering: need more than {} samples, got {}",
                    required, actual
                )
            }
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FilterError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for FilterError {}
