// FFT module - analytic signal computation
//
// This module turns a real signal into its analytic counterpart by
// discarding the negative-frequency half of its spectrum. The planner is
// owned by the processor so repeated calls of equal length reuse plans.

use rustfft::{num_complex::Complex, FftPlanner};

/// First spectral bin zeroed for a transform of `len` points
///
/// Bins `1 + ceil(len / 2)` onward are dropped. For even lengths this
/// keeps the Nyquist bin, matching the historical reference traces.
pub fn negative_frequency_cutoff(len: usize) -> usize {
    1 + len.div_ceil(2)
}

/// FFT processor computing analytic signals
pub struct FftProcessor {
    planner: FftPlanner<f64>,
}

impl FftProcessor {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Compute the analytic signal of `signal`
    ///
    /// Forward transform, zero bins from `negative_frequency_cutoff(n)`,
    /// inverse transform scaled by `1 / n`. Positive-frequency bins are
    /// not doubled, so the real part is not the input; only the argument
    /// is meaningful.
    ///
    /// # Returns
    /// Complex analytic signal (same length as `signal`)
    pub fn analytic_signal(&mut self, signal: &[f64]) -> Vec<Complex<f64>> {
        let len = signal.len();
        if len == 0 {
            return Vec::new();
        }

        let mut buffer: Vec<Complex<f64>> =
            signal.iter().map(|&x| Complex::new(x, 0.0)).collect();

        let forward = self.planner.plan_fft_forward(len);
        forward.process(&mut buffer);

        for bin in buffer.iter_mut().skip(negative_frequency_cutoff(len)) {
            *bin = Complex::new(0.0, 0.0);
        }

        let inverse = self.planner.plan_fft_inverse(len);
        inverse.process(&mut buffer);

        let scale = 1.0 / len as f64;
        buffer.iter().map(|&c| c * scale).collect()
    }
}

impl Default for FftProcessor {
    fn default() -> Self {
        Self::new()
    }
}
