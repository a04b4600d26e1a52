//! Method selection and dispatch.
//!
//! `select_method` implements the marker-availability policy: true toe
//! markers allow the heel/toe height method, otherwise the mix method
//! substitutes the toe-to-pelvis distance. `dispatch` routes a call to the
//! matching detection algorithm with its parameters.
//!
//! Marker naming conventions are an explicit `MarkerNaming` record passed
//! into selection and assembly rather than module-level constants, so a
//! dataset with different labels configures the engine instead of patching
//! it.

use serde::{Deserialize, Serialize};

use crate::correction::CorrectionConfig;
use crate::detection::{
    foot_velocity, heel_toe_height, heel_toe_height_corrected, heel_toe_sacrum_distance,
    heel_toe_velocity, mix, FootVelocityConfig, HeightEventConfig, MixEventConfig,
    SacrumDistanceConfig, VelocityCrossingConfig,
};
use crate::types::{CorrectionKind, DetectionMethod, GaitEventSet, GaitResult, MarkerTrajectory, Task};

/// Marker label tokens for a capture session.
///
/// Matching is case-insensitive; the defaults follow the lab convention
/// (calcaneus, toe, second metatarsal, posterior superior iliac spine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerNaming {
    /// Token identifying a heel (calcaneus) marker.
    pub heel_token: String,
    /// Token identifying a true toe marker.
    pub toe_token: String,
    /// Token identifying the metatarsal substitute marker.
    pub metatarsal_token: String,
    /// Token identifying the pelvis markers.
    pub sacrum_token: String,
}

impl Default for MarkerNaming {
    fn default() -> Self {
        Self {
            heel_token: "CAL".to_string(),
            toe_token: "TOE".to_string(),
            metatarsal_token: "MT2".to_string(),
            sacrum_token: "PS2".to_string(),
        }
    }
}

/// Bundled per-method parameters for one dispatch call.
///
/// Defaults reproduce the validated thresholds; any field can be overridden
/// per call for sensitivity analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Heel/toe height method parameters.
    pub height: HeightEventConfig,
    /// Mix method parameters.
    pub mix: MixEventConfig,
    /// Pelvis-distance method parameters.
    pub sacrum_distance: SacrumDistanceConfig,
    /// Foot-velocity method parameters.
    pub foot_velocity: FootVelocityConfig,
    /// Velocity-crossing method parameters.
    pub velocity_crossing: VelocityCrossingConfig,
    /// Toe-off correction parameters.
    pub correction: CorrectionConfig,
}

/// Select a detection method from the available marker labels.
///
/// Returns `HeelToeHeight` when any label contains the toe token
/// (case-insensitive), `Mix` otherwise.
pub fn select_method<S: AsRef<str>>(marker_names: &[S], naming: &MarkerNaming) -> DetectionMethod {
    let toe_token = naming.toe_token.to_ascii_uppercase();
    let toe_available = marker_names
        .iter()
        .any(|name| name.as_ref().to_ascii_uppercase().contains(&toe_token));

    if toe_available {
        DetectionMethod::HeelToeHeight
    } else {
        DetectionMethod::Mix
    }
}

/// Route a detection call to the matching algorithm.
///
/// `task` is honored by the mix method only; `correction` by the corrected
/// height method only (plain `HeelToeHeight` always runs uncorrected). The
/// call is a pure function of its inputs: identical arguments yield
/// identical event sets.
pub fn dispatch(
    method: DetectionMethod,
    traj: &MarkerTrajectory,
    fs: f64,
    task: Task,
    correction: CorrectionKind,
    config: &DetectionConfig,
) -> GaitResult<GaitEventSet> {
    match method {
        DetectionMethod::HeelToeHeight => heel_toe_height(traj, fs, &config.height),
        DetectionMethod::HeelToeHeightCorrected => {
            heel_toe_height_corrected(traj, fs, correction, &config.height, &config.correction)
        }
        DetectionMethod::Mix => mix(traj, fs, task, &config.mix),
        DetectionMethod::HeelToeSacrumDistance => {
            heel_toe_sacrum_distance(traj, fs, &config.sacrum_distance)
        }
        DetectionMethod::FootVelocity => foot_velocity(traj, fs, &config.foot_velocity),
        DetectionMethod::HeelToeVelocity => heel_toe_velocity(traj, fs, &config.velocity_crossing),
    }
}
