// Envelope module - slowly varying whisk statistics from phase crossings
//
// Whisk cycles are delimited twice: top-to-top (phase rising through 0)
// and bottom-to-bottom (phase wrapping from +pi to -pi). A statistic is
// evaluated over every cycle and pinned at the cycle's midpoint; the knots
// from both delimitations are merged and joined by straight lines.
//
// References:
// - Hill, D. N., Curtis, J. C., Moore, J. D., & Kleinfeld, D. (2011).
//   Primary motor cortex reports efferent control of vibrissa motion on
//   multiple timescales. Neuron.

use std::f64::consts::FRAC_PI_2;

use serde::Serialize;

use crate::analysis::statistic::SegmentStatistic;
use crate::error::EnvelopeError;

/// Reconstructed envelope plus the crossing masks it was built from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Piecewise-linear statistic, one value per input sample
    pub values: Vec<f64>,
    /// `tops[i]`: phase rises through 0 between samples `i` and `i + 1`
    pub tops: Vec<bool>,
    /// `bottoms[i]`: phase wraps from `>= pi/2` to `<= -pi/2` between `i` and `i + 1`
    pub bottoms: Vec<bool>,
}

/// A statistic value pinned at a sample position
#[derive(Debug, Clone, Copy, PartialEq)]
struct Knot {
    position: usize,
    value: f64,
}

/// Ascending zero-crossings of the phase (length `n - 1`)
pub fn top_crossings(phase: &[f64]) -> Vec<bool> {
    phase.windows(2).map(|w| w[0] < 0.0 && w[1] >= 0.0).collect()
}

/// Wrap-around crossings from the upper to the lower half-plane (length `n - 1`)
pub fn bottom_crossings(phase: &[f64]) -> Vec<bool> {
    phase
        .windows(2)
        .map(|w| w[0] >= FRAC_PI_2 && w[1] <= -FRAC_PI_2)
        .collect()
}

/// Reconstruct the envelope of `signal` from its `phase`
///
/// # Arguments
/// * `signal` - Raw whisker angle
/// * `phase` - Instantaneous phase of `signal`, same length
/// * `statistic` - Per-cycle statistic (e.g. `Statistic::PeakToPeak`)
///
/// # Returns
/// Envelope values (length of `signal`) and the tops/bottoms masks
///
/// # Errors
/// * `LengthMismatch` - `signal` and `phase` differ in length
/// * `StatisticEvaluation` - the statistic failed or returned a non-finite value
pub fn reconstruct_envelope<S>(
    signal: &[f64],
    phase: &[f64],
    statistic: &S,
) -> Result<Envelope, EnvelopeError>
where
    S: SegmentStatistic + ?Sized,
{
    if signal.len() != phase.len() {
        return Err(EnvelopeError::LengthMismatch {
            signal: signal.len(),
            phase: phase.len(),
        });
    }

    let tops = top_crossings(phase);
    let bottoms = bottom_crossings(phase);

    let mut knots = cycle_knots(signal, &crossing_indices(&tops), statistic)?;
    knots.extend(cycle_knots(signal, &crossing_indices(&bottoms), statistic)?);
    // Stable: knots sharing a position keep tops-before-bottoms order
    knots.sort_by_key(|knot| knot.position);

    tracing::debug!(
        "[EnvelopeReconstructor] samples={} tops={} bottoms={} knots={}",
        signal.len(),
        tops.iter().filter(|&&t| t).count(),
        bottoms.iter().filter(|&&b| b).count(),
        knots.len()
    );

    let anchors = match (knots.first(), knots.last()) {
        (Some(first), Some(last)) => {
            let mut anchors = Vec::with_capacity(knots.len() + 2);
            anchors.push(Knot {
                position: 0,
                value: first.value,
            });
            anchors.extend_from_slice(&knots);
            anchors.push(Knot {
                position: signal.len(),
                value: last.value,
            });
            anchors
        }
        _ => {
            let value = evaluate(statistic, signal, 0, signal.len())?;
            vec![
                Knot { position: 0, value },
                Knot {
                    position: signal.len(),
                    value,
                },
            ]
        }
    };

    Ok(Envelope {
        values: interpolate(&anchors, signal.len()),
        tops,
        bottoms,
    })
}

fn crossing_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &hit)| hit.then_some(i))
        .collect()
}

/// One knot per pair of consecutive crossings
fn cycle_knots<S>(
    signal: &[f64],
    crossings: &[usize],
    statistic: &S,
) -> Result<Vec<Knot>, EnvelopeError>
where
    S: SegmentStatistic + ?Sized,
{
    crossings
        .windows(2)
        .map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            Ok(Knot {
                position: cycle_midpoint(start, end),
                value: evaluate(statistic, signal, start, end)?,
            })
        })
        .collect()
}

/// `start + (end - start) / 2`, exact halves rounded to the even neighbour
fn cycle_midpoint(start: usize, end: usize) -> usize {
    let span = end - start;
    let floor = start + span / 2;
    if span % 2 == 1 && floor % 2 == 1 {
        floor + 1
    } else {
        floor
    }
}

fn evaluate<S>(statistic: &S, signal: &[f64], start: usize, end: usize) -> Result<f64, EnvelopeError>
where
    S: SegmentStatistic + ?Sized,
{
    let failure = |reason: String| EnvelopeError::StatisticEvaluation { start, end, reason };

    let value = statistic.evaluate(&signal[start..end]).map_err(failure)?;
    if !value.is_finite() {
        return Err(failure(format!("non-finite result {}", value)));
    }
    Ok(value)
}

/// Linear ramps between consecutive anchors
///
/// Each span `[p0, p1)` runs from `v0` to exactly `v1` on its last sample;
/// a one-sample span takes `v1`, an empty span writes nothing.
fn interpolate(anchors: &[Knot], len: usize) -> Vec<f64> {
    let mut out = vec![0.0; len];

    for pair in anchors.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let span = to.position.saturating_sub(from.position);
        match span {
            0 => {}
            1 => out[from.position] = to.value,
            _ => {
                let step = (to.value - from.value) / (span - 1) as f64;
                for k in 0..span - 1 {
                    out[from.position + k] = k as f64 * step + from.value;
                }
                out[to.position - 1] = to.value;
            }
        }
    }

    out
}
