//! Pelvis-orientation plausibility filter for candidate gait events.
//!
//! Frame-level peaks in heel/toe height signals are contaminated by
//! low-amplitude noise during swing phase. Restricting the pelvis
//! orientation change between consecutive accepted events to a
//! physiologically plausible delta removes those double counts: between two
//! genuine same-side events the pelvis keeps facing roughly the same way,
//! while spurious swing-phase peaks pair with arbitrary orientations.
//!
//! Boundary rule: the first candidate is never evaluated against a
//! predecessor and is implicitly dropped, so filtered event lists start from
//! the second raw candidate. Callers treat this as part of the filter's
//! contract.

use crate::signal::{vector_angle_deg, Peak};

/// Default angular-change threshold in degrees.
pub const DEFAULT_ANGLE_THRESHOLD_DEG: f64 = 90.0;

/// Borrowed view of the two pelvis marker coordinate sequences used to build
/// orientation vectors.
///
/// All four slices have the trial's frame count; the equal-length invariant
/// of `MarkerTrajectory` guarantees any candidate index is valid here.
#[derive(Debug, Clone, Copy)]
pub struct PelvisFrame<'a> {
    /// First pelvis marker, lateral axis.
    pub sac1_x: &'a [f64],
    /// First pelvis marker, progression axis.
    pub sac1_z: &'a [f64],
    /// Second pelvis marker, lateral axis.
    pub sac2_x: &'a [f64],
    /// Second pelvis marker, progression axis.
    pub sac2_z: &'a [f64],
}

impl PelvisFrame<'_> {
    /// The 2D pelvis orientation vector at a frame: `sac1 - sac2` in the
    /// lateral/progression plane.
    pub fn orientation_at(&self, index: usize) -> [f64; 2] {
        [
            self.sac1_x[index] - self.sac2_x[index],
            self.sac1_z[index] - self.sac2_z[index],
        ]
    }
}

/// Filter candidate events by pelvis orientation change.
///
/// Single left-to-right pass, no candidate re-entry: each candidate after
/// the first is kept only if the angle between the orientation vector at the
/// previously *accepted* index and at the candidate's index is strictly
/// below `angle_thresh_deg`. Rejected candidates do not become the
/// comparison reference. Candidate values travel with their indices, so the
/// output stays index/value aligned.
pub fn filter_candidates(
    frame: &PelvisFrame<'_>,
    candidates: &[Peak],
    angle_thresh_deg: f64,
) -> Vec<Peak> {
    let mut kept = Vec::new();
    let Some(first) = candidates.first() else {
        return kept;
    };

    let mut last_accepted = first.index;
    for candidate in &candidates[1..] {
        let prev_vec = frame.orientation_at(last_accepted);
        let curr_vec = frame.orientation_at(candidate.index);
        if vector_angle_deg(prev_vec, curr_vec) < angle_thresh_deg {
            kept.push(*candidate);
            last_accepted = candidate.index;
        }
    }
    kept
}
