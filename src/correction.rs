//! Toe-off timing corrections for metatarsal marker substitutes.
//!
//! When a trial has no true toe marker, the metatarsal marker stands in for
//! it and the raw peak timing on its height signal lags true toe-off. Two
//! alternative post-hoc refinements compensate:
//!
//! - **EricLauren**: scan forward from each candidate on the toe vertical
//!   velocity until it exceeds a threshold; the crossing becomes the event.
//! - **Vu**: extrapolate each candidate forward along the local velocity
//!   slope toward the nearest later velocity maximum.
//!
//! Both are pure functions of the candidate list, the toe height signal, and
//! the sampling rate; no state is shared between calls.

use serde::{Deserialize, Serialize};

use crate::signal::{derivative, find_peaks, Peak};
use crate::types::GaitResult;

/// Tunable parameters for the correction strategies.
///
/// Every threshold lives on an explicit config so it is testable and
/// overridable per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionConfig {
    /// Toe vertical velocity (units/s) above which the foot is considered
    /// to have left the ground. Used by EricLauren.
    pub velocity_threshold: f64,
    /// Multiplicative gain applied to the local velocity slope when
    /// extrapolating a refined index. Used by Vu.
    pub extrapolation_gain: f64,
    /// Maximum lead time (seconds) between a raw candidate and the next
    /// velocity maximum for the Vu extrapolation to apply; farther maxima
    /// leave the raw index unchanged.
    pub max_peak_lead_s: f64,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.2,
            extrapolation_gain: 100.0,
            max_peak_lead_s: 0.2,
        }
    }
}

/// EricLauren correction: velocity-threshold crossing.
///
/// For each raw candidate, the first sample at or after its index where the
/// toe vertical velocity exceeds `velocity_threshold` becomes the corrected
/// index; the candidate value is unchanged. A candidate with no crossing
/// before signal end has no defensible corrected position and contributes
/// nothing.
pub fn eric_lauren(
    candidates: &[Peak],
    toe_marker_y: &[f64],
    fs: f64,
    config: &CorrectionConfig,
) -> Vec<Peak> {
    let velocity = derivative(toe_marker_y, fs);

    let mut refined = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let crossing = (candidate.index..velocity.len())
            .find(|&g| velocity[g] > config.velocity_threshold);
        if let Some(index) = crossing {
            refined.push(Peak {
                index,
                value: candidate.value,
            });
        }
    }
    retain_strictly_increasing(refined)
}

/// Vu correction: slope extrapolation toward the next velocity maximum.
///
/// The last raw candidate is always dropped. For each remaining candidate,
/// the nearest later local maximum of the toe velocity is located; when it
/// lies within `max_peak_lead_s * fs` samples, the corrected index is the
/// raw index shifted by `extrapolation_gain * slope` (slope between the
/// candidate and that maximum, truncated toward zero and clamped into the
/// signal range). Otherwise, including when no later maximum exists, the
/// raw index is kept.
pub fn vu(
    candidates: &[Peak],
    toe_marker_y: &[f64],
    fs: f64,
    config: &CorrectionConfig,
) -> GaitResult<Vec<Peak>> {
    if candidates.len() < 2 {
        return Ok(Vec::new());
    }

    let velocity = derivative(toe_marker_y, fs);
    let velocity_peaks = find_peaks(&velocity, 1, 0.0, f64::INFINITY)?;
    let window = config.max_peak_lead_s * fs;
    let last_frame = toe_marker_y.len() as isize - 1;

    let mut refined = Vec::with_capacity(candidates.len() - 1);
    for candidate in &candidates[..candidates.len() - 1] {
        let next_max = velocity_peaks.iter().find(|p| p.index > candidate.index);
        let index = match next_max {
            Some(peak) if ((peak.index - candidate.index) as f64) < window => {
                let gap = (peak.index - candidate.index) as f64;
                let slope = (velocity[peak.index] - velocity[candidate.index]) / gap;
                let shift = (config.extrapolation_gain * slope) as isize;
                (candidate.index as isize + shift).clamp(0, last_frame) as usize
            }
            _ => candidate.index,
        };
        refined.push(Peak {
            index,
            value: candidate.value,
        });
    }
    Ok(retain_strictly_increasing(refined))
}

/// Drop any refined candidate whose index does not strictly exceed its
/// predecessor's, preserving the strict-increase invariant of event lists.
pub(crate) fn retain_strictly_increasing(peaks: Vec<Peak>) -> Vec<Peak> {
    let mut out: Vec<Peak> = Vec::with_capacity(peaks.len());
    for peak in peaks {
        match out.last() {
            Some(last) if peak.index <= last.index => {}
            _ => out.push(peak),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(index: usize, value: f64) -> Peak {
        Peak { index, value }
    }

    /// Build a height signal whose forward-difference velocity matches
    /// `velocity` at fs = 100 Hz.
    fn height_from_velocity(velocity: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0];
        for &v in velocity {
            let next = y.last().copied().unwrap_or(0.0) + v / 100.0;
            y.push(next);
        }
        y
    }

    #[test]
    fn test_eric_lauren_moves_to_first_crossing() {
        // Flat toe height for 10 frames, then a steady rise: velocity is
        // 0 until index 9, then 1.0 units/s.
        let mut toe_y = vec![0.1; 10];
        for i in 0..20 {
            toe_y.push(0.1 + 0.01 * (i + 1) as f64);
        }
        let config = CorrectionConfig::default();
        let refined = eric_lauren(&[peak(5, -0.1)], &toe_y, 100.0, &config);

        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].index, 9);
        assert_eq!(refined[0].value, -0.1);
    }

    #[test]
    fn test_eric_lauren_drops_candidate_without_crossing() {
        // Toe height never rises: no crossing, candidate contributes nothing.
        let toe_y = vec![0.1; 30];
        let config = CorrectionConfig::default();
        let refined = eric_lauren(&[peak(5, -0.1)], &toe_y, 100.0, &config);
        assert!(refined.is_empty());
    }

    #[test]
    fn test_eric_lauren_deduplicates_shared_crossing() {
        // Two candidates ahead of the same single rise both map to frame 9;
        // only the first survives the monotonicity pass.
        let mut toe_y = vec![0.1; 10];
        for i in 0..20 {
            toe_y.push(0.1 + 0.01 * (i + 1) as f64);
        }
        let config = CorrectionConfig::default();
        let refined = eric_lauren(&[peak(3, -0.1), peak(6, -0.2)], &toe_y, 100.0, &config);
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].index, 9);
    }

    #[test]
    fn test_vu_extrapolates_along_slope() {
        // Velocity ramps to a strict maximum at index 8 while the candidate
        // sits at index 5 where velocity is 0. All values are dyadic
        // fractions so the slope arithmetic is exact: slope to the maximum
        // is 0.78125 per sample, and gain 100 shifts the index by 78.
        let step = 0.78125;
        let mut velocity = vec![0.0; 6];
        velocity.extend([step, 2.0 * step, 3.0 * step, 2.0 * step, step]);
        velocity.extend(vec![0.0; 88]);
        let toe_y = height_from_velocity(&velocity);

        let config = CorrectionConfig::default();
        let refined = vu(&[peak(5, -0.1), peak(95, -0.2)], &toe_y, 100.0, &config).unwrap();

        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].index, 5 + 78);
        assert_eq!(refined[0].value, -0.1);
    }

    #[test]
    fn test_vu_keeps_raw_index_when_maximum_is_far() {
        // Velocity maximum 51 samples after the candidate, beyond the
        // 0.2 s * 100 Hz window: the raw index is kept.
        let mut velocity = vec![0.0; 55];
        velocity.extend([0.3, 0.6, 0.3]);
        velocity.extend(vec![0.0; 10]);
        let toe_y = height_from_velocity(&velocity);

        let config = CorrectionConfig::default();
        let refined = vu(&[peak(5, -0.1), peak(60, -0.2)], &toe_y, 100.0, &config).unwrap();

        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].index, 5);
    }

    #[test]
    fn test_vu_without_any_velocity_maximum() {
        // Strictly linear rise: the velocity is constant, so there is no
        // interior maximum and every processed candidate keeps its index.
        let toe_y: Vec<f64> = (0..40).map(|i| 0.01 * i as f64).collect();
        let config = CorrectionConfig::default();
        let refined = vu(&[peak(5, -0.1), peak(20, -0.2)], &toe_y, 100.0, &config).unwrap();
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].index, 5);
    }

    #[test]
    fn test_vu_drops_last_and_handles_short_lists() {
        let toe_y = vec![0.1; 30];
        let config = CorrectionConfig::default();
        assert!(vu(&[], &toe_y, 100.0, &config).unwrap().is_empty());
        assert!(vu(&[peak(5, -0.1)], &toe_y, 100.0, &config)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_retain_strictly_increasing() {
        let peaks = vec![peak(3, 0.1), peak(3, 0.2), peak(2, 0.3), peak(7, 0.4)];
        let kept = retain_strictly_increasing(peaks);
        assert_eq!(
            kept.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![3, 7]
        );
    }
}
