// Statistic module - scalar summaries of one whisk cycle
//
// The envelope reconstructor evaluates a statistic over the samples
// between consecutive crossings. The built-in statistics cover the usual
// whisking decomposition (amplitude and set-point); any closure returning
// a `Result` can be used as well.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar summary of a non-empty segment of samples
pub trait SegmentStatistic {
    /// Evaluate over `segment`, returning a reason on failure
    fn evaluate(&self, segment: &[f64]) -> Result<f64, String>;
}

impl<F, E> SegmentStatistic for F
where
    F: Fn(&[f64]) -> Result<f64, E>,
    E: fmt::Display,
{
    fn evaluate(&self, segment: &[f64]) -> Result<f64, String> {
        self(segment).map_err(|err| err.to_string())
    }
}

/// Built-in per-cycle statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// `max - min`: whisk amplitude
    PeakToPeak,
    /// `(max + min) / 2`: whisk set-point (offset)
    Midpoint,
    /// Arithmetic mean
    Mean,
}

impl Statistic {
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::PeakToPeak => "peak_to_peak",
            Statistic::Midpoint => "midpoint",
            Statistic::Mean => "mean",
        }
    }
}

impl SegmentStatistic for Statistic {
    fn evaluate(&self, segment: &[f64]) -> Result<f64, String> {
        if segment.is_empty() {
            return Err(format!("{} of an empty segment", self.name()));
        }

        let value = match self {
            Statistic::PeakToPeak => {
                let (min, max) = min_max(segment);
                max - min
            }
            Statistic::Midpoint => {
                let (min, max) = min_max(segment);
                (max + min) / 2.0
            }
            Statistic::Mean => segment.iter().sum::<f64>() / segment.len() as f64,
        };
        Ok(value)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extremes of `segment`; a NaN sample makes both NaN
fn min_max(segment: &[f64]) -> (f64, f64) {
    if segment.iter().any(|x| x.is_nan()) {
        return (f64::NAN, f64::NAN);
    }
    segment
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &x| {
            (min.min(x), max.max(x))
        })
}
