// Zero-phase filtering - forward-backward IIR application
//
// The signal is extended at both ends by odd reflection, filtered forward
// from steady-state initial conditions, reversed, filtered again, reversed
// back, and trimmed. The net response is |H|^2 with zero group delay.

use crate::analysis::filter_design::FilterCoefficients;
use crate::error::FilterError;

/// Apply `coeffs` forward then backward over `signal`
///
/// Edges are padded with `coeffs.padding_len()` odd-reflected samples on
/// each side. Fails with `InsufficientSignalLength` unless the signal is
/// strictly longer than the padding.
pub fn filtfilt(coeffs: &FilterCoefficients, signal: &[f64]) -> Result<Vec<f64>, FilterError> {
    let pad = coeffs.padding_len();
    if signal.len() <= pad {
        return Err(FilterError::InsufficientSignalLength {
            required: pad,
            actual: signal.len(),
        });
    }

    let extended = odd_extension(signal, pad);
    let zi = lfilter_zi(coeffs);

    let initial: Vec<f64> = zi.iter().map(|z| z * extended[0]).collect();
    let mut forward = lfilter(coeffs, &extended, &initial);
    forward.reverse();

    let initial: Vec<f64> = zi.iter().map(|z| z * forward[0]).collect();
    let mut backward = lfilter(coeffs, &forward, &initial);
    backward.reverse();

    Ok(backward[pad..backward.len() - pad].to_vec())
}

/// Odd extension: `2*x[0] - x[pad..0]` before, `2*x[n-1] - x[n-2..]` after
///
/// Requires `pad < signal.len()`.
pub fn odd_extension(signal: &[f64], pad: usize) -> Vec<f64> {
    let n = signal.len();
    let mut extended = Vec::with_capacity(n + 2 * pad);
    if n == 0 {
        return extended;
    }

    let first = signal[0];
    let last = signal[n - 1];
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    extended.extend_from_slice(signal);
    extended.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));
    extended
}

/// Direct form II transposed IIR filter with initial state `zi`
///
/// Coefficients are normalized by `a[0]`; the shorter polynomial is
/// zero-padded. `zi` must hold `taps - 1` values.
pub fn lfilter(coeffs: &FilterCoefficients, input: &[f64], zi: &[f64]) -> Vec<f64> {
    let (b, a) = normalized(coeffs);
    let taps = b.len();
    if taps < 2 {
        return input.iter().map(|x| b[0] * x).collect();
    }

    let mut state = zi.to_vec();
    state.resize(taps - 1, 0.0);

    let mut output = Vec::with_capacity(input.len());
    for &x in input {
        let y = b[0] * x + state[0];
        for i in 0..taps - 2 {
            state[i] = b[i + 1] * x + state[i + 1] - a[i + 1] * y;
        }
        state[taps - 2] = b[taps - 1] * x - a[taps - 1] * y;
        output.push(y);
    }
    output
}

/// Initial state for a unit step response already at steady state
///
/// Solves `(I - A^T) zi = b[1..] - a[1..] * b[0]` where `A` is the
/// companion matrix of `a`. The system is bidiagonal apart from its first
/// column, so summing the rows yields `zi[0]` and the rest follows by
/// forward substitution.
pub fn lfilter_zi(coeffs: &FilterCoefficients) -> Vec<f64> {
    let (b, a) = normalized(coeffs);
    let taps = b.len();
    if taps < 2 {
        return Vec::new();
    }

    let rhs: Vec<f64> = (1..taps).map(|i| b[i] - a[i] * b[0]).collect();
    let first = rhs.iter().sum::<f64>() / (1.0 + a[1..].iter().sum::<f64>());

    let mut zi = Vec::with_capacity(taps - 1);
    zi.push(first);
    let mut a_acc = 1.0;
    let mut rhs_acc = 0.0;
    for k in 1..taps - 1 {
        a_acc += a[k];
        rhs_acc += rhs[k - 1];
        zi.push(a_acc * first - rhs_acc);
    }
    zi
}

fn normalized(coeffs: &FilterCoefficients) -> (Vec<f64>, Vec<f64>) {
    let taps = coeffs.taps();
    let a0 = coeffs.a.first().copied().unwrap_or(1.0);
    let scale = |c: &[f64]| {
        let mut v: Vec<f64> = c.iter().map(|x| x / a0).collect();
        v.resize(taps, 0.0);
        v
    };
    (scale(&coeffs.b), scale(&coeffs.a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::filter_design::{design, FrequencyBand};

    fn first_order_lowpass() -> FilterCoefficients {
        // y[n] = 0.2 x[n] + 0.3 x[n-1] + 0.5 y[n-1], unity DC gain
        FilterCoefficients {
            b: vec![0.2, 0.3],
            a: vec![1.0, -0.5],
        }
    }

    fn generate_sine_wave(sample_rate: f64, frequency: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * frequency * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_odd_extension() {
        let signal = [1.0, 2.0, 4.0, 7.0, 11.0];
        let extended = odd_extension(&signal, 2);
        assert_eq!(
            extended,
            vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 11.0, 15.0, 18.0]
        );
    }

    #[test]
    fn test_odd_extension_no_padding() {
        let signal = [1.0, 2.0, 3.0];
        assert_eq!(odd_extension(&signal, 0), signal.to_vec());
    }

    #[test]
    fn test_lfilter_impulse_response() {
        let coeffs = first_order_lowpass();
        let out = lfilter(&coeffs, &[1.0, 0.0, 0.0, 0.0], &[0.0]);
        let expected = [0.2, 0.4, 0.2, 0.1];
        for (o, e) in out.iter().zip(expected.iter()) {
            assert!((o - e).abs() < 1e-12, "{:?}", out);
        }
    }

    #[test]
    fn test_lfilter_normalizes_leading_denominator() {
        let scaled = FilterCoefficients {
            b: vec![0.4, 0.6],
            a: vec![2.0, -1.0],
        };
        let reference = lfilter(&first_order_lowpass(), &[1.0, -1.0, 0.5], &[0.0]);
        let out = lfilter(&scaled, &[1.0, -1.0, 0.5], &[0.0]);
        for (o, r) in out.iter().zip(reference.iter()) {
            assert!((o - r).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lfilter_zi_is_steady_state() {
        let coeffs = first_order_lowpass();
        let zi = lfilter_zi(&coeffs);
        let out = lfilter(&coeffs, &[1.0; 16], &zi);
        for y in out {
            assert!((y - 1.0).abs() < 1e-12, "step response not settled: {}", y);
        }
    }

    #[test]
    fn test_lfilter_zi_bandpass_steady_state() {
        let coeffs = design(&FrequencyBand::default(), 299.0).unwrap();
        let zi = lfilter_zi(&coeffs);
        assert_eq!(zi.len(), coeffs.taps() - 1);

        // Band-pass has zero DC gain: a settled step stays at zero
        let out = lfilter(&coeffs, &[3.0; 64], &zi.iter().map(|z| z * 3.0).collect::<Vec<_>>());
        for y in out {
            assert!(y.abs() < 1e-9, "{}", y);
        }
    }

    #[test]
    fn test_filtfilt_preserves_length() {
        let coeffs = design(&FrequencyBand::default(), 299.0).unwrap();
        let signal = generate_sine_wave(299.0, 10.0, 100);
        let filtered = filtfilt(&coeffs, &signal).unwrap();
        assert_eq!(filtered.len(), signal.len());
    }

    #[test]
    fn test_filtfilt_rejects_short_signal() {
        let coeffs = design(&FrequencyBand::default(), 299.0).unwrap();
        let signal = vec![0.0; 24];
        let err = filtfilt(&coeffs, &signal).unwrap_err();
        assert_eq!(
            err,
            FilterError::InsufficientSignalLength {
                required: 24,
                actual: 24
            }
        );

        let signal = vec![0.0; 25];
        assert!(filtfilt(&coeffs, &signal).is_ok());
    }

    #[test]
    fn test_filtfilt_removes_constant_offset() {
        let coeffs = design(&FrequencyBand::default(), 299.0).unwrap();
        let filtered = filtfilt(&coeffs, &[42.0; 120]).unwrap();
        for y in filtered {
            assert!(y.abs() < 1e-6, "{}", y);
        }
    }

    #[test]
    fn test_filtfilt_zero_phase_in_band() {
        let fs = 299.0;
        let coeffs = design(&FrequencyBand::default(), fs).unwrap();
        let signal = generate_sine_wave(fs, 13.4, 600);
        let filtered = filtfilt(&coeffs, &signal).unwrap();

        // Interior samples pass through untouched: unity gain, no delay
        for i in 200..400 {
            assert!(
                (filtered[i] - signal[i]).abs() < 0.05,
                "sample {}: {} vs {}",
                i,
                filtered[i],
                signal[i]
            );
        }
    }

    #[test]
    fn test_filtfilt_attenuates_out_of_band() {
        let fs = 299.0;
        let coeffs = design(&FrequencyBand::default(), fs).unwrap();
        let signal = generate_sine_wave(fs, 80.0, 600);
        let filtered = filtfilt(&coeffs, &signal).unwrap();
        let peak = filtered[200..400]
            .iter()
            .fold(0.0f64, |acc, &y| acc.max(y.abs()));
        assert!(peak < 0.05, "80 Hz leaked through with peak {}", peak);
    }
}
