// Error types for the whisk decomposition library
//
// This module defines typed errors for the filtering and envelope stages,
// each carrying a stable numeric code so fixture reports and the CLI can
// surface failures consistently.

mod envelope;
mod filter;

pub use envelope::{log_envelope_error, EnvelopeError, EnvelopeErrorCodes};
pub use filter::{log_filter_error, FilterError, FilterErrorCodes};

use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Any failure of the full phase/amplitude/offset decomposition
#[derive(Debug, Clone, PartialEq)]
pub enum WhiskError {
    Filter(FilterError),
    Envelope(EnvelopeError),
}

impl ErrorCode for WhiskError {
    fn code(&self) -> i32 {
        match self {
            WhiskError::Filter(err) => err.code(),
            WhiskError::Envelope(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            WhiskError::Filter(err) => err.message(),
            WhiskError::Envelope(err) => err.message(),
        }
    }
}

impl fmt::Display for WhiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhiskError::Filter(err) => err.fmt(f),
            WhiskError::Envelope(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for WhiskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WhiskError::Filter(err) => Some(err),
            WhiskError::Envelope(err) => Some(err),
        }
    }
}

impl From<FilterError> for WhiskError {
    fn from(err: FilterError) -> Self {
        WhiskError::Filter(err)
    }
}

impl From<EnvelopeError> for WhiskError {
    fn from(err: EnvelopeError) -> Self {
        WhiskError::Envelope(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait() {
        let filter_err: &dyn ErrorCode = &FilterError::InsufficientSignalLength {
            required: 25,
            actual: 10,
        };
        assert_eq!(filter_err.code(), 1002);

        let envelope_err: &dyn ErrorCode = &EnvelopeError::LengthMismatch {
            signal: 4,
            phase: 3,
        };
        assert_eq!(envelope_err.code(), 2002);
    }

    #[test]
    fn test_whisk_error_wraps_codes() {
        let err: WhiskError = FilterError::InvalidFilterSpecification {
            reason: "band".to_string(),
        }
        .into();
        assert_eq!(err.code(), FilterErrorCodes::INVALID_FILTER_SPECIFICATION);
        assert!(err.to_string().contains("FilterError"));

        let err: WhiskError = EnvelopeError::StatisticEvaluation {
            start: 0,
            end: 0,
            reason: "empty".to_string(),
        }
        .into();
        assert_eq!(err.code(), EnvelopeErrorCodes::STATISTIC_EVALUATION);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), FilterError> {
            Err(FilterError::InsufficientSignalLength {
                required: 25,
                actual: 3,
            })
        }

        fn caller() -> Result<(), WhiskError> {
            may_fail()?;
            Ok(())
        }

        assert!(matches!(caller(), Err(WhiskError::Filter(_))));
    }
}
