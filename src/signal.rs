//! Generic numeric primitives for gait-event detection.
//!
//! This module provides the low-level signal operations every detection
//! method composes:
//! - Peak finding with minimum-separation and height-band constraints
//! - Discrete differentiation (forward finite difference)
//! - Vector-angle computation for the pelvis plausibility filter
//! - Centered moving-average smoothing for velocity signals
//!
//! All operations are pure functions over in-memory slices. No I/O, no
//! shared state, no allocation beyond the returned vectors.

use std::cmp::Ordering;

use crate::types::{GaitError, GaitResult};

/// A candidate event produced by raw peak detection: a frame index and the
/// signal amplitude at that frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Frame index of the peak (0-based, always within the signal).
    pub index: usize,
    /// Signal amplitude at the peak. May be sign-inverted relative to the
    /// raw marker signal when detection ran on a negated signal.
    pub value: f64,
}

/// Find local maxima of `signal` within an inclusive height band, at least
/// `min_distance` samples apart.
///
/// A sample is a candidate when it strictly exceeds both neighbors and its
/// value lies in `[height_lo, height_hi]`. An exactly flat plateau has no
/// such sample and yields no candidate; measured float signals do not hold
/// exact ties across frames. The minimum-distance constraint is enforced by
/// priority: candidates are visited in order of descending height, and each
/// accepted peak suppresses every remaining candidate closer than
/// `min_distance` samples, so when two candidates fall inside one window
/// the higher survives. Equal heights tie-break toward the lower index. The
/// returned peaks are sorted by index.
///
/// Fails with `EmptySignal` on zero-length input.
pub fn find_peaks(
    signal: &[f64],
    min_distance: usize,
    height_lo: f64,
    height_hi: f64,
) -> GaitResult<Vec<Peak>> {
    if signal.is_empty() {
        return Err(GaitError::EmptySignal);
    }

    let mut candidates: Vec<Peak> = Vec::new();
    for i in 1..signal.len().saturating_sub(1) {
        let v = signal[i];
        if v > signal[i - 1] && v > signal[i + 1] && v >= height_lo && v <= height_hi {
            candidates.push(Peak { index: i, value: v });
        }
    }

    if min_distance > 1 && candidates.len() > 1 {
        // Visit candidates from highest to lowest; an accepted peak knocks
        // out everything within min_distance of it.
        let mut priority: Vec<usize> = (0..candidates.len()).collect();
        priority.sort_by(|&a, &b| {
            candidates[b]
                .value
                .partial_cmp(&candidates[a].value)
                .unwrap_or(Ordering::Equal)
                .then(candidates[a].index.cmp(&candidates[b].index))
        });

        let mut keep = vec![true; candidates.len()];
        for &k in &priority {
            if !keep[k] {
                continue;
            }
            let center = candidates[k].index;
            for (j, cand) in candidates.iter().enumerate() {
                if j != k && keep[j] && cand.index.abs_diff(center) < min_distance {
                    keep[j] = false;
                }
            }
        }

        candidates = candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(peak, kept)| kept.then_some(peak))
            .collect();
    }

    Ok(candidates)
}

/// Forward finite difference scaled by the sampling rate.
///
/// Output length is `signal.len() - 1` (empty for inputs shorter than two
/// samples). Units: signal units per second.
pub fn derivative(signal: &[f64], fs: f64) -> Vec<f64> {
    signal.windows(2).map(|w| (w[1] - w[0]) * fs).collect()
}

/// Angle between two 2D vectors in degrees, in `[0, 180]`.
///
/// Returns 0.0 when either vector's norm is below 1e-12 (degenerate-vector
/// guard, avoids division by zero on coincident pelvis markers).
pub fn vector_angle_deg(v1: [f64; 2], v2: [f64; 2]) -> f64 {
    let norm1 = (v1[0] * v1[0] + v1[1] * v1[1]).sqrt();
    let norm2 = (v2[0] * v2[0] + v2[1] * v2[1]).sqrt();
    if norm1 < 1e-12 || norm2 < 1e-12 {
        return 0.0;
    }
    let dot = v1[0] * v2[0] + v1[1] * v2[1];
    let cos = (dot / (norm1 * norm2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Centered moving average with shrinking windows at the signal edges.
///
/// Output length equals input length. A `window` of 0 or 1 returns the
/// signal unchanged.
pub fn moving_average(signal: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return signal.to_vec();
    }
    let half = window / 2;
    (0..signal.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(signal.len());
            signal[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}
