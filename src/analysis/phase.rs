// Phase module - instantaneous whisk phase from the analytic signal
//
// The raw angle trace is band-pass filtered without phase distortion,
// turned into its analytic signal, and the argument of every sample is
// taken as the oscillation phase. Phase 0 is the top of a protraction,
// +/-pi the bottom of a retraction.
//
// References:
// - Hill, D. N., Curtis, J. C., Moore, J. D., & Kleinfeld, D. (2011).
//   Primary motor cortex reports efferent control of vibrissa motion on
//   multiple timescales. Neuron.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use serde::Serialize;

use crate::analysis::fft::FftProcessor;
use crate::analysis::filter_design::{design, FrequencyBand};
use crate::analysis::filtfilt::filtfilt;
use crate::error::FilterError;

/// Phase and band-passed waveform, both the length of the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseExtraction {
    /// Instantaneous phase in (-pi, pi]
    pub phase: Vec<f64>,
    /// Zero-phase band-passed signal
    pub filtered: Vec<f64>,
}

/// Extract the instantaneous phase of `signal`
///
/// # Arguments
/// * `signal` - Uniformly sampled whisker angle
/// * `sampling_rate` - Sampling rate in Hz
/// * `band` - Pass band; `FrequencyBand::default()` is 6-30 Hz
///
/// # Errors
/// * `InvalidFilterSpecification` - band/sampling rate infeasible
/// * `InsufficientSignalLength` - signal not longer than the filter padding
pub fn extract_phase(
    signal: &[f64],
    sampling_rate: f64,
    band: &FrequencyBand,
) -> Result<PhaseExtraction, FilterError> {
    let coeffs = design(band, sampling_rate)?;
    let filtered = filtfilt(&coeffs, signal)?;

    let mut fft = FftProcessor::new();
    let analytic = fft.analytic_signal(&filtered);
    let phase = instantaneous_phase(&analytic);

    tracing::debug!(
        "[PhaseExtractor] samples={} taps={} padding={}",
        signal.len(),
        coeffs.taps(),
        coeffs.padding_len()
    );

    Ok(PhaseExtraction { phase, filtered })
}

/// Argument of each sample, folded into (-pi, pi]
pub fn instantaneous_phase(analytic: &[Complex<f64>]) -> Vec<f64> {
    analytic
        .iter()
        .map(|c| {
            let angle = c.arg();
            // atan2 yields -pi for a negative real axis approached from below
            if angle <= -PI {
                PI
            } else {
                angle
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_sine_wave(sample_rate: f64, frequency: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_lengths_match_input() {
        let signal = generate_sine_wave(500.0, 12.0, 333);
        let result = extract_phase(&signal, 500.0, &FrequencyBand::default()).unwrap();
        assert_eq!(result.phase.len(), signal.len());
        assert_eq!(result.filtered.len(), signal.len());
    }

    #[test]
    fn test_phase_range() {
        let signal = generate_sine_wave(500.0, 12.0, 500);
        let result = extract_phase(&signal, 500.0, &FrequencyBand::default()).unwrap();
        for &p in &result.phase {
            assert!(p > -PI && p <= PI, "phase {} out of range", p);
        }
    }

    #[test]
    fn test_negative_real_axis_maps_to_pi() {
        let phase = instantaneous_phase(&[
            Complex::new(-1.0, -0.0),
            Complex::new(-1.0, 0.0),
            Complex::new(1.0, 0.0),
        ]);
        assert_eq!(phase, vec![PI, PI, 0.0]);
    }

    #[test]
    fn test_phase_advances_at_whisk_frequency() {
        // A 10 Hz whisk at 500 Hz should complete a cycle every 50 samples
        let fs = 500.0;
        let signal = generate_sine_wave(fs, 10.0, 1000);
        let result = extract_phase(&signal, fs, &FrequencyBand::default()).unwrap();

        let wraps = result
            .phase
            .windows(2)
            .filter(|w| w[0] > PI / 2.0 && w[1] < -PI / 2.0)
            .count();
        assert!((19..=21).contains(&wraps), "expected ~20 cycles, got {}", wraps);
    }

    #[test]
    fn test_phase_zero_at_protraction_peak() {
        // sin(wt) has analytic phase wt - pi/2, so phase 0 sits on the peaks
        let fs = 500.0;
        let signal = generate_sine_wave(fs, 10.0, 1000);
        let result = extract_phase(&signal, fs, &FrequencyBand::default()).unwrap();

        // Peaks fall at i = 12.5 + 50k
        let peak = 512;
        assert!(
            result.phase[peak].abs() < 0.2,
            "phase at sine peak: {}",
            result.phase[peak]
        );
    }

    #[test]
    fn test_idempotent() {
        let signal = generate_sine_wave(299.0, 9.0, 200);
        let first = extract_phase(&signal, 299.0, &FrequencyBand::default()).unwrap();
        let second = extract_phase(&signal, 299.0, &FrequencyBand::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_input_untouched() {
        let signal = generate_sine_wave(299.0, 9.0, 200);
        let copy = signal.clone();
        let _ = extract_phase(&signal, 299.0, &FrequencyBand::default()).unwrap();
        assert_eq!(signal, copy);
    }

    #[test]
    fn test_short_signal_fails() {
        let signal = generate_sine_wave(299.0, 9.0, 10);
        let err = extract_phase(&signal, 299.0, &FrequencyBand::default()).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InsufficientSignalLength {
                required: 24,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_invalid_band_fails_before_filtering() {
        let signal = vec![0.0; 10];
        let err = extract_phase(&signal, 299.0, &FrequencyBand::new(30.0, 6.0)).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFilterSpecification { .. }));
    }
}
