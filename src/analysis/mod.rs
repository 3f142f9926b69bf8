// Analysis module - whisk decomposition pipeline
//
// A raw whisker-angle trace is split into a fast variable (instantaneous
// phase) and slow variables (amplitude and set-point envelopes).
//
// Architecture:
// - filter_design: minimum-order Butterworth band-pass design
// - filtfilt: zero-phase forward/backward filtering
// - fft / phase: analytic signal and its argument
// - envelope / statistic: per-cycle statistics joined into envelopes
// - WhiskDecomposer: runs the whole pipeline for one trace

use serde::Serialize;

use crate::config::AppConfig;
use crate::error::{log_envelope_error, log_filter_error, WhiskError};

pub mod envelope;
pub mod fft;
pub mod filter_design;
pub mod filtfilt;
pub mod phase;
pub mod statistic;


pub use envelope::{reconstruct_envelope, Envelope};
pub use filter_design::{design, FilterCoefficients, FrequencyBand};
pub use phase::{extract_phase, PhaseExtraction};
pub use statistic::{SegmentStatistic, Statistic};

/// Full decomposition of one whisker-angle trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    pub sample_rate: f64,
    pub band: FrequencyBand,
    /// Instantaneous phase in (-pi, pi]
    pub phase: Vec<f64>,
    /// Band-passed angle the phase was taken from
    pub filtered: Vec<f64>,
    /// Amplitude envelope
    pub amplitude: Vec<f64>,
    /// Set-point envelope
    pub offset: Vec<f64>,
    /// Sample indices `i` where the phase crosses 0 between `i` and `i + 1`
    pub tops: Vec<usize>,
    /// Sample indices `i` where the phase wraps between `i` and `i + 1`
    pub bottoms: Vec<usize>,
}

/// Phase/envelope decomposer bound to a sampling rate
///
/// Stateless between calls; the same input always yields the same output.
#[derive(Debug, Clone)]
pub struct WhiskDecomposer {
    sample_rate: f64,
    band: FrequencyBand,
    amplitude: Statistic,
    offset: Statistic,
}

impl WhiskDecomposer {
    /// Create a decomposer with the default 6-30 Hz band
    ///
    /// # Arguments
    /// * `sample_rate` - Sampling rate of the traces in Hz
    pub fn new(sample_rate: f64) -> Self {
        Self::from_config(sample_rate, &AppConfig::default())
    }

    /// Create a decomposer from loaded configuration
    pub fn from_config(sample_rate: f64, config: &AppConfig) -> Self {
        Self {
            sample_rate,
            band: config.filter.band(),
            amplitude: config.envelope.amplitude,
            offset: config.envelope.offset,
        }
    }

    /// Override the pass band
    pub fn with_band(mut self, band: FrequencyBand) -> Self {
        self.band = band;
        self
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn band(&self) -> FrequencyBand {
        self.band
    }

    /// Decompose `signal` into phase, amplitude and set-point
    ///
    /// Envelopes are evaluated on the raw signal, cycles delimited by the
    /// phase of the band-passed one.
    ///
    /// # Errors
    /// Filter errors for an infeasible band or a too-short signal; envelope
    /// errors if a statistic fails on a cycle.
    pub fn decompose(&self, signal: &[f64]) -> Result<Decomposition, WhiskError> {
        let PhaseExtraction { phase, filtered } =
            extract_phase(signal, self.sample_rate, &self.band).inspect_err(|err| {
                log_filter_error(err, "WhiskDecomposer::decompose");
            })?;

        let amplitude = reconstruct_envelope(signal, &phase, &self.amplitude)
            .inspect_err(|err| log_envelope_error(err, "WhiskDecomposer::amplitude"))?;
        let offset = reconstruct_envelope(signal, &phase, &self.offset)
            .inspect_err(|err| log_envelope_error(err, "WhiskDecomposer::offset"))?;

        let tops = mask_indices(&amplitude.tops);
        let bottoms = mask_indices(&amplitude.bottoms);

        tracing::debug!(
            "[WhiskDecomposer] samples={} tops={} bottoms={} band={:.1}-{:.1} Hz",
            signal.len(),
            tops.len(),
            bottoms.len(),
            self.band.low_hz,
            self.band.high_hz
        );

        Ok(Decomposition {
            sample_rate: self.sample_rate,
            band: self.band,
            phase,
            filtered,
            amplitude: amplitude.values,
            offset: offset.values,
            tops,
            bottoms,
        })
    }
}

fn mask_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &hit)| hit.then_some(i))
        .collect()
}
