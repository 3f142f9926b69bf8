// Filter design module - minimum-order Butterworth band-pass
//
// The pass band is given in Hz and normalized to fractions of Nyquist.
// The stop band is derived from it by a fixed widening factor, the
// minimum Butterworth order meeting the ripple/attenuation pair is
// computed, and the band-pass coefficients are built through the
// analog prototype -> band-pass -> bilinear chain.
//
// References:
// - Oppenheim, A. & Schafer, R. (2009). Discrete-Time Signal Processing, ch. 7
// - Parks, T. & Burrus, C. (1987). Digital Filter Design

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Maximum pass-band attenuation in dB
pub const PASSBAND_RIPPLE_DB: f64 = 3.0;

/// Minimum stop-band attenuation in dB
pub const STOPBAND_ATTENUATION_DB: f64 = 20.0;

/// Stop-band edges relative to the pass-band edges (low, high)
pub const STOPBAND_SCALE: [f64; 2] = [0.5, 1.5];

/// Sampling frequency used for the bilinear prewarp of normalized frequencies
const BILINEAR_FS: f64 = 2.0;

/// Pass band in Hz
///
/// Defaults to 6-30 Hz, the whisking band used by Chen, Augustine &
/// Chadderton (2016).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self {
            low_hz: 6.0,
            high_hz: 30.0,
        }
    }
}

impl FrequencyBand {
    pub fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    /// Check the band against the sampling rate
    ///
    /// Both edges must be finite, strictly positive, ordered, and below
    /// Nyquist.
    pub fn validate(&self, sampling_rate: f64) -> Result<(), FilterError> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(invalid(format!(
                "sampling rate must be finite and positive (got {})",
                sampling_rate
            )));
        }
        if !self.low_hz.is_finite() || !self.high_hz.is_finite() {
            return Err(invalid(format!(
                "band edges must be finite (got [{}, {}])",
                self.low_hz, self.high_hz
            )));
        }
        if self.low_hz <= 0.0 {
            return Err(invalid(format!(
                "low band edge must be positive (got {})",
                self.low_hz
            )));
        }
        if self.low_hz >= self.high_hz {
            return Err(invalid(format!(
                "band edges must be ordered (got [{}, {}])",
                self.low_hz, self.high_hz
            )));
        }
        let nyquist = sampling_rate / 2.0;
        if self.high_hz >= nyquist {
            return Err(invalid(format!(
                "high band edge {} Hz must lie below Nyquist ({} Hz)",
                self.high_hz, nyquist
            )));
        }
        Ok(())
    }

    /// Band edges as fractions of Nyquist
    pub fn normalized(&self, sampling_rate: f64) -> [f64; 2] {
        [
            self.low_hz * 2.0 / sampling_rate,
            self.high_hz * 2.0 / sampling_rate,
        ]
    }
}

/// Order and natural frequencies of the Butterworth prototype
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterSpec {
    /// Prototype order; the band-pass filter has order `2 * order`
    pub order: usize,
    /// Natural (-3 dB) frequencies as fractions of Nyquist, in (0, 1)
    pub critical: [f64; 2],
}

/// Transfer function coefficients, `a[0] == 1`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCoefficients {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl FilterCoefficients {
    /// Number of taps of the longer polynomial
    pub fn taps(&self) -> usize {
        self.b.len().max(self.a.len())
    }

    /// Edge padding used by forward-backward filtering
    pub fn padding_len(&self) -> usize {
        3 * self.taps().saturating_sub(1)
    }

    /// Magnitude of the frequency response at `freq_hz`
    pub fn gain_at(&self, freq_hz: f64, sampling_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sampling_rate;
        let z_inv = Complex::from_polar(1.0, -omega);
        let eval = |coeffs: &[f64]| {
            coeffs
                .iter()
                .rev()
                .fold(Complex::new(0.0, 0.0), |acc, &c| acc * z_inv + c)
        };
        (eval(&self.b) / eval(&self.a)).norm()
    }

    /// Gain at `freq_hz` in dB
    pub fn gain_db_at(&self, freq_hz: f64, sampling_rate: f64) -> f64 {
        20.0 * self.gain_at(freq_hz, sampling_rate).log10()
    }
}

/// Design the band-pass filter for `band` at `sampling_rate`
pub fn design(band: &FrequencyBand, sampling_rate: f64) -> Result<FilterCoefficients, FilterError> {
    let spec = minimum_order(band, sampling_rate)?;
    let coeffs = butter_bandpass(&spec)?;

    tracing::debug!(
        "[FilterDesign] band=[{}, {}] Hz fs={} order={} wn=[{:.6}, {:.6}]",
        band.low_hz,
        band.high_hz,
        sampling_rate,
        spec.order,
        spec.critical[0],
        spec.critical[1]
    );

    Ok(coeffs)
}

/// Minimum Butterworth order meeting the ripple/attenuation pair
///
/// Pass edges `wp = band * 2 / fs`, stop edges `ws = wp * [0.5, 1.5]`,
/// 3 dB ripple and 20 dB attenuation. The natural frequencies are chosen
/// so the response is exactly -3 dB at the pass edges.
pub fn minimum_order(band: &FrequencyBand, sampling_rate: f64) -> Result<FilterSpec, FilterError> {
    band.validate(sampling_rate)?;

    let wp = band.normalized(sampling_rate);
    let ws = [wp[0] * STOPBAND_SCALE[0], wp[1] * STOPBAND_SCALE[1]];
    if ws.iter().any(|&w| w <= 0.0 || w >= 1.0) {
        return Err(invalid(format!(
            "stop band [{:.4}, {:.4}] leaves (0, 1); high edge too close to Nyquist",
            ws[0], ws[1]
        )));
    }

    let passb = wp.map(prewarp);
    let stopb = ws.map(prewarp);

    let nat = stopb
        .iter()
        .map(|&s| ((s * s - passb[0] * passb[1]) / (s * (passb[0] - passb[1]))).abs())
        .fold(f64::INFINITY, f64::min);

    let gstop = 10f64.powf(0.1 * STOPBAND_ATTENUATION_DB);
    let gpass = 10f64.powf(0.1 * PASSBAND_RIPPLE_DB);
    let order = (((gstop - 1.0) / (gpass - 1.0)).log10() / (2.0 * nat.log10())).ceil();
    if !order.is_finite() || order < 1.0 {
        return Err(invalid(format!(
            "derived filter order is infeasible (got {})",
            order
        )));
    }
    let order = order as usize;

    // Natural frequency of the low-pass prototype giving exactly `gpass` at the pass edges
    let w0 = (gpass - 1.0).powf(-1.0 / (2.0 * order as f64));

    // Band-pass back-transform of the prototype frequency `w0`
    let width = passb[1] - passb[0];
    let discr = (w0 * w0 * width * width / 4.0 + passb[0] * passb[1]).sqrt();
    let mut natural = [
        (w0 * width / 2.0 + discr).abs(),
        (-w0 * width / 2.0 + discr).abs(),
    ];
    natural.sort_by(f64::total_cmp);

    let critical = natural.map(|w| 2.0 / PI * w.atan());
    Ok(FilterSpec { order, critical })
}

/// Butterworth band-pass coefficients for `spec`
pub fn butter_bandpass(spec: &FilterSpec) -> Result<FilterCoefficients, FilterError> {
    let [low, high] = spec.critical;
    if spec.order == 0 {
        return Err(invalid("filter order must be at least 1".to_string()));
    }
    if !(low > 0.0 && low < high && high < 1.0) {
        return Err(invalid(format!(
            "critical frequencies must satisfy 0 < low < high < 1 (got [{}, {}])",
            low, high
        )));
    }

    let n = spec.order;
    let warped = spec.critical.map(|w| 2.0 * BILINEAR_FS * (PI * w / BILINEAR_FS).tan());
    let bandwidth = warped[1] - warped[0];
    let center = (warped[0] * warped[1]).sqrt();

    // Analog prototype: poles on the left half of the unit circle, no zeros
    let prototype: Vec<Complex<f64>> = (0..n)
        .map(|k| {
            let m = 2.0 * k as f64 - (n as f64 - 1.0);
            -Complex::from_polar(1.0, PI * m / (2.0 * n as f64))
        })
        .collect();

    // Low-pass -> band-pass: each pole splits into a pair, n zeros land at the origin
    let scaled: Vec<Complex<f64>> = prototype.iter().map(|&p| p * (bandwidth / 2.0)).collect();
    let shifts: Vec<Complex<f64>> = scaled
        .iter()
        .map(|&p| (p * p - center * center).sqrt())
        .collect();
    let analog_poles: Vec<Complex<f64>> = scaled
        .iter()
        .zip(&shifts)
        .map(|(&p, &s)| p + s)
        .chain(scaled.iter().zip(&shifts).map(|(&p, &s)| p - s))
        .collect();
    let analog_zeros = vec![Complex::new(0.0, 0.0); n];
    let analog_gain = bandwidth.powi(n as i32);

    // Bilinear transform; the surplus poles map their zeros to z = -1
    let fs2 = 2.0 * BILINEAR_FS;
    let digital_zeros: Vec<Complex<f64>> = analog_zeros
        .iter()
        .map(|&z| (fs2 + z) / (fs2 - z))
        .chain(std::iter::repeat(Complex::new(-1.0, 0.0)).take(analog_poles.len() - n))
        .collect();
    let digital_poles: Vec<Complex<f64>> = analog_poles
        .iter()
        .map(|&p| (fs2 + p) / (fs2 - p))
        .collect();
    let zero_prod: Complex<f64> = analog_zeros.iter().map(|&z| fs2 - z).product();
    let pole_prod: Complex<f64> = analog_poles.iter().map(|&p| fs2 - p).product();
    let gain = analog_gain * (zero_prod / pole_prod).re;

    let b = poly(&digital_zeros).iter().map(|c| gain * c.re).collect();
    let a = poly(&digital_poles).iter().map(|c| c.re).collect();

    Ok(FilterCoefficients { b, a })
}

fn prewarp(w: f64) -> f64 {
    (PI * w / 2.0).tan()
}

/// Monic polynomial coefficients (highest power first) with the given roots
fn poly(roots: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for root in roots {
        let mut next = vec![Complex::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * *root;
        }
        coeffs = next;
    }
    coeffs
}

fn invalid(reason: String) -> FilterError {
    FilterError::InvalidFilterSpecification { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 299.0;

    #[test]
    fn test_default_band() {
        let band = FrequencyBand::default();
        assert_eq!(band.low_hz, 6.0);
        assert_eq!(band.high_hz, 30.0);
    }

    #[test]
    fn test_minimum_order_whisk_band() {
        let spec = minimum_order(&FrequencyBand::default(), FS).unwrap();
        assert_eq!(spec.order, 4);
        assert!((spec.critical[0] - 0.0401177264).abs() < 1e-9, "{:?}", spec);
        assert!((spec.critical[1] - 0.2007441750).abs() < 1e-9, "{:?}", spec);
    }

    #[test]
    fn test_coefficient_shape() {
        let coeffs = design(&FrequencyBand::default(), FS).unwrap();
        assert_eq!(coeffs.b.len(), 9);
        assert_eq!(coeffs.a.len(), 9);
        assert_eq!(coeffs.a[0], 1.0);
        assert_eq!(coeffs.padding_len(), 24);

        // Band-pass numerator is k * (1 - z^-2)^n: odd taps vanish, symmetric
        for i in (1..9).step_by(2) {
            assert!(coeffs.b[i].abs() < 1e-12);
        }
        assert!((coeffs.b[0] - coeffs.b[8]).abs() < 1e-12);
        assert!((coeffs.b[0] - 0.00226558596).abs() < 1e-10, "b0 = {}", coeffs.b[0]);
        assert!((coeffs.a[1] + 6.41777485).abs() < 1e-7, "a1 = {}", coeffs.a[1]);
    }

    #[test]
    fn test_response_meets_edges() {
        let coeffs = design(&FrequencyBand::default(), FS).unwrap();

        // No more than the 3 dB ripple at the pass edges, and no less
        for edge in [6.0, 30.0] {
            let gain = coeffs.gain_db_at(edge, FS);
            assert!(gain >= -3.0 - 1e-6, "gain at {} Hz: {}", edge, gain);
            assert!(gain <= -3.0 + 1e-6, "gain at {} Hz: {}", edge, gain);
        }

        // At least 20 dB down at the stop edges
        assert!(coeffs.gain_db_at(3.0, FS) <= -20.0);
        assert!(coeffs.gain_db_at(45.0, FS) <= -20.0);

        // Unity at the geometric centre of the prewarped band
        let spec = minimum_order(&FrequencyBand::default(), FS).unwrap();
        let centre = (prewarp(spec.critical[0]) * prewarp(spec.critical[1])).sqrt();
        let centre_hz = centre.atan() / PI * FS;
        assert!((coeffs.gain_at(centre_hz, FS) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_unordered_band() {
        let err = design(&FrequencyBand::new(30.0, 6.0), FS).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFilterSpecification { .. }));
    }

    #[test]
    fn test_rejects_band_above_nyquist() {
        let err = design(&FrequencyBand::new(6.0, 160.0), FS).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFilterSpecification { .. }));
    }

    #[test]
    fn test_rejects_stop_band_past_nyquist() {
        // 120 Hz is below Nyquist, but 1.5 * 120 is not
        let err = design(&FrequencyBand::new(6.0, 120.0), FS).unwrap_err();
        match err {
            FilterError::InvalidFilterSpecification { reason } => {
                assert!(reason.contains("Nyquist"), "{}", reason)
            }
            other => panic!("Expected InvalidFilterSpecification, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        assert!(design(&FrequencyBand::new(0.0, 30.0), FS).is_err());
        assert!(design(&FrequencyBand::new(-1.0, 30.0), FS).is_err());
        assert!(design(&FrequencyBand::default(), 0.0).is_err());
        assert!(design(&FrequencyBand::default(), f64::NAN).is_err());
        assert!(design(&FrequencyBand::new(6.0, f64::INFINITY), FS).is_err());
    }

    #[test]
    fn test_butter_bandpass_rejects_bad_spec() {
        let spec = FilterSpec {
            order: 2,
            critical: [0.3, 0.1],
        };
        assert!(butter_bandpass(&spec).is_err());

        let spec = FilterSpec {
            order: 0,
            critical: [0.1, 0.3],
        };
        assert!(butter_bandpass(&spec).is_err());
    }

    #[test]
    fn test_other_sampling_rates() {
        let cases = [
            (500.0, 5, [0.0239923730, 0.1200372850]),
            (1000.0, 5, [0.0119961973, 0.0600189113]),
        ];
        for (fs, order, critical) in cases {
            let spec = minimum_order(&FrequencyBand::default(), fs).unwrap();
            assert_eq!(spec.order, order, "fs={}", fs);
            assert!((spec.critical[0] - critical[0]).abs() < 1e-9, "fs={} {:?}", fs, spec);
            assert!((spec.critical[1] - critical[1]).abs() < 1e-9, "fs={} {:?}", fs, spec);

            // Order-10 polynomials lose a little precision near z = 1
            let coeffs = design(&FrequencyBand::default(), fs).unwrap();
            assert!((coeffs.gain_db_at(6.0, fs) + 3.0).abs() < 0.05, "fs={}", fs);
            assert!((coeffs.gain_db_at(30.0, fs) + 3.0).abs() < 0.05, "fs={}", fs);
        }
    }
}
