// Envelope reconstruction error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Envelope error code constants
///
/// Error code range: 2001-2002
pub struct EnvelopeErrorCodes {}

impl EnvelopeErrorCodes {
    /// The per-cycle statistic failed on a segment
    pub const STATISTIC_EVALUATION: i32 = 2001;

    /// Signal and phase arrays differ in length
    pub const LENGTH_MISMATCH: i32 = 2002;
}

/// Log an envelope error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_envelope_error(err: &EnvelopeError, context: &str) {
    error!(
        "Envelope error in {}: code={}, component=EnvelopeReconstructor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while reconstructing a slowly-varying envelope
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeError {
    /// Statistic failed (or returned a non-finite value) on `signal[start..end]`
    StatisticEvaluation {
        start: usize,
        end: usize,
        reason: String,
    },

    /// Phase array does not cover the signal sample-for-sample
    LengthMismatch { signal: usize, phase: usize },
}

impl ErrorCode for EnvelopeError {
    fn code(&self) -> i32 {
        match self {
            EnvelopeError::StatisticEvaluation { .. } => EnvelopeErrorCodes::STATISTIC_EVALUATION,
            EnvelopeError::LengthMismatch { .. } => EnvelopeErrorCodes::LENGTH_MISMATCH,
        }
    }

    fn message(&self) -> String {
        match self {
            EnvelopeError::StatisticEvaluation { start, end, reason } => {
                format!(
                    "Statistic failed on segment [{}, {}): {}",
                    start, end, reason
                )
            }
            EnvelopeError::LengthMismatch { signal, phase } => {
                format!(
                    "Signal and phase lengths differ: signal={}, phase={}",
                    signal, phase
                )
            }
        }
    }
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EnvelopeError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for EnvelopeError {}
