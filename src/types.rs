//! Core data types for the gait-event detection engine.
//!
//! This module defines the fundamental types used throughout the event
//! extraction pipeline: marker trajectories in, gait-event sets out, plus the
//! enums that select a detection method, a correction strategy, and a task.
//!
//! Design principle: Types should make intent obvious. If a concept exists,
//! it gets a type. Never pass raw tuples or untyped collections across
//! boundaries. Signal roles are a closed enum rather than strings so that a
//! missing marker is a typed, reportable error instead of a silent lookup
//! failure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Result type for gait-event operations.
pub type GaitResult<T> = Result<T, GaitError>;

/// Errors that can occur during gait-event detection.
///
/// Every fatal condition carries enough context (role name, method name) to
/// fix the upstream data. Soft conditions (no events found, a toe-off with
/// no preceding heel contact) are never errors: the former is an empty
/// result, the latter a logged diagnostic.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GaitError {
    #[error("peak detection invoked on an empty signal")]
    EmptySignal,

    #[error("marker role {role:?} is required by the {method:?} method but absent from the trajectory")]
    MissingMarkerRole {
        role: SignalRole,
        method: DetectionMethod,
    },

    #[error("signal for role {role:?} has {actual} frames, expected {expected}")]
    LengthMismatch {
        role: SignalRole,
        expected: usize,
        actual: usize,
    },

    #[error("invalid sampling rate: {0} Hz. Must be finite and positive")]
    InvalidSamplingRate(f64),

    #[error("method {method:?} is not supported for {operation}")]
    UnsupportedMethod {
        method: DetectionMethod,
        operation: &'static str,
    },

    #[error("column {0:?} is missing from the synchronized dataset")]
    MissingColumn(String),
}

/// Named 1D signal roles a detection method can require.
///
/// Axis convention follows the capture system: Y is vertical (height above
/// the floor), Z is the direction of progression. The two pelvis markers
/// (`Sacrum1*`, `Sacrum2*`) span the orientation vector used by the angle
/// filter; `SacrumZ` is the single pelvis progression signal used by the
/// distance-based methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalRole {
    /// Heel marker height.
    HeelY,
    /// Toe (or metatarsal substitute) marker height.
    ToeY,
    /// Heel marker position along the direction of progression.
    HeelZ,
    /// Toe (or metatarsal substitute) position along the direction of progression.
    ToeZ,
    /// Pelvis position along the direction of progression.
    SacrumZ,
    /// First pelvis marker, lateral axis.
    Sacrum1X,
    /// First pelvis marker, progression axis.
    Sacrum1Z,
    /// Second pelvis marker, lateral axis.
    Sacrum2X,
    /// Second pelvis marker, progression axis.
    Sacrum2Z,
}

/// A mapping from signal roles to equal-length sample sequences for one trial.
///
/// All sequences share the trial's sampling rate and frame count; the
/// equal-length invariant is enforced at insertion time. The trajectory is
/// constructed once by an external loader and is read-only for the core;
/// no detection method mutates it.
#[derive(Debug, Clone, Default)]
pub struct MarkerTrajectory {
    signals: BTreeMap<SignalRole, Vec<f64>>,
}

impl MarkerTrajectory {
    /// Create an empty trajectory.
    pub fn new() -> Self {
        Self {
            signals: BTreeMap::new(),
        }
    }

    /// Insert a signal for the given role.
    ///
    /// Fails with `LengthMismatch` if the sequence length differs from the
    /// sequences already present. Inserting the same role twice replaces the
    /// previous sequence.
    pub fn insert(&mut self, role: SignalRole, samples: Vec<f64>) -> GaitResult<()> {
        if let Some(expected) = self.signals.values().map(Vec::len).next() {
            if samples.len() != expected {
                return Err(GaitError::LengthMismatch {
                    role,
                    expected,
                    actual: samples.len(),
                });
            }
        }
        self.signals.insert(role, samples);
        Ok(())
    }

    /// Look up a signal by role.
    pub fn get(&self, role: SignalRole) -> Option<&[f64]> {
        self.signals.get(&role).map(Vec::as_slice)
    }

    /// Look up a signal required by `method`, failing fast when absent.
    pub fn require(&self, role: SignalRole, method: DetectionMethod) -> GaitResult<&[f64]> {
        self.get(role)
            .ok_or(GaitError::MissingMarkerRole { role, method })
    }

    /// True if a signal is present for the given role.
    pub fn contains(&self, role: SignalRole) -> bool {
        self.signals.contains_key(&role)
    }

    /// Number of frames in the trial (0 for an empty trajectory).
    pub fn num_frames(&self) -> usize {
        self.signals.values().map(Vec::len).next().unwrap_or(0)
    }

    /// Iterate over the roles present in this trajectory.
    pub fn roles(&self) -> impl Iterator<Item = SignalRole> + '_ {
        self.signals.keys().copied()
    }
}

/// The public result of one detection call.
///
/// Four parallel sequences: heel-contact and toe-off frame indices with their
/// aligned signal amplitudes. Index sequences are strictly increasing;
/// `hc_index`/`hc_value` and `to_index`/`to_value` always have matching
/// lengths. Sequences may be empty but are never partially filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GaitEventSet {
    /// Heel-contact frame indices (0-based, strictly increasing).
    pub hc_index: Vec<usize>,
    /// Signal amplitude at each heel contact.
    pub hc_value: Vec<f64>,
    /// Toe-off frame indices (0-based, strictly increasing).
    pub to_index: Vec<usize>,
    /// Signal amplitude at each toe-off.
    pub to_value: Vec<f64>,
}

impl GaitEventSet {
    /// Create an empty event set.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no events of either kind were detected.
    pub fn is_empty(&self) -> bool {
        self.hc_index.is_empty() && self.to_index.is_empty()
    }

    /// Number of heel-contact events.
    pub fn num_heel_contacts(&self) -> usize {
        self.hc_index.len()
    }

    /// Number of toe-off events.
    pub fn num_toe_offs(&self) -> usize {
        self.to_index.len()
    }

    /// The first full gait cycle: the first heel contact paired with the
    /// first toe-off occurring after it.
    ///
    /// Returns `None` when either event list is empty or no toe-off follows
    /// the first heel contact. Callers extracting a cycle treat `None` as a
    /// reportable, non-fatal condition.
    pub fn first_cycle(&self) -> Option<(usize, usize)> {
        let first_hc = *self.hc_index.first()?;
        let first_to = self.to_index.iter().copied().find(|&to| to > first_hc)?;
        Some((first_hc, first_to))
    }
}

/// Interchangeable gait-event detection algorithms.
///
/// Each variant names the derived signals it peaks on and the marker roles it
/// requires; see the `detection` module for the per-method semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// Minima of heel and toe heights, angle-filtered.
    HeelToeHeight,
    /// Same as `HeelToeHeight` but honoring a toe-off correction strategy.
    HeelToeHeightCorrected,
    /// Heel-height minima for HC, toe-to-pelvis progression distance for TO.
    Mix,
    /// Heel/toe distance to the pelvis along the direction of progression.
    HeelToeSacrumDistance,
    /// Vertical foot-center velocity with toe-off peak enhancement.
    FootVelocity,
    /// Velocity sign crossings of heel and toe over a fixed window.
    HeelToeVelocity,
}

/// Post-hoc toe-off refinement applied when a metatarsal marker substitutes
/// for a true toe marker (the raw peak timing then lags true toe-off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionKind {
    /// No refinement; raw toe-off candidates are reported.
    None,
    /// Velocity-threshold crossing correction.
    EricLauren,
    /// Slope-extrapolation correction.
    Vu,
}

/// Walking task, selecting overground or treadmill signal conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Overground walking.
    Walking,
    /// Treadmill walking.
    TreadmillWalking,
}

/// Validate a sampling rate before any signal processing.
pub(crate) fn validate_sampling_rate(fs: f64) -> GaitResult<f64> {
    if fs.is_finite() && fs > 0.0 {
        Ok(fs)
    } else {
        Err(GaitError::InvalidSamplingRate(fs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trajectory_enforces_equal_lengths() {
        let mut traj = MarkerTrajectory::new();
        traj.insert(SignalRole::HeelY, vec![0.0; 10]).unwrap();
        let err = traj.insert(SignalRole::ToeY, vec![0.0; 8]).unwrap_err();
        assert!(matches!(
            err,
            GaitError::LengthMismatch {
                role: SignalRole::ToeY,
                expected: 10,
                actual: 8,
            }
        ));
    }

    #[test]
    fn test_trajectory_require_missing_role() {
        let traj = MarkerTrajectory::new();
        let err = traj
            .require(SignalRole::ToeY, DetectionMethod::HeelToeHeight)
            .unwrap_err();
        assert!(matches!(
            err,
            GaitError::MissingMarkerRole {
                role: SignalRole::ToeY,
                method: DetectionMethod::HeelToeHeight,
            }
        ));
    }

    #[test]
    fn test_trajectory_num_frames() {
        let mut traj = MarkerTrajectory::new();
        assert_eq!(traj.num_frames(), 0);
        traj.insert(SignalRole::HeelY, vec![0.0; 42]).unwrap();
        assert_eq!(traj.num_frames(), 42);
    }

    #[test]
    fn test_first_cycle_pairs_hc_with_following_to() {
        let events = GaitEventSet {
            hc_index: vec![50, 150],
            hc_value: vec![0.1, 0.1],
            to_index: vec![30, 110, 210],
            to_value: vec![0.2, 0.2, 0.2],
        };
        // The toe-off at frame 30 precedes the first heel contact and must
        // be skipped.
        assert_eq!(events.first_cycle(), Some((50, 110)));
    }

    #[test]
    fn test_first_cycle_absent() {
        let empty = GaitEventSet::new();
        assert_eq!(empty.first_cycle(), None);

        let no_following_to = GaitEventSet {
            hc_index: vec![100],
            hc_value: vec![0.1],
            to_index: vec![40],
            to_value: vec![0.2],
        };
        assert_eq!(no_following_to.first_cycle(), None);
    }

    #[test]
    fn test_sampling_rate_validation() {
        assert!(validate_sampling_rate(100.0).is_ok());
        assert!(matches!(
            validate_sampling_rate(0.0),
            Err(GaitError::InvalidSamplingRate(_))
        ));
        assert!(matches!(
            validate_sampling_rate(-50.0),
            Err(GaitError::InvalidSamplingRate(_))
        ));
        assert!(matches!(
            validate_sampling_rate(f64::NAN),
            Err(GaitError::InvalidSamplingRate(_))
        ));
    }
}
