//! The five gait-event detection methods.
//!
//! Each method is a pure function `(MarkerTrajectory, fs, params) ->
//! GaitEventSet` composing the signal primitives, the pelvis angle filter,
//! and (for the height method) the toe-off correction strategies. No state
//! persists across calls; required marker roles are checked before any
//! signal processing.
//!
//! Every tunable threshold lives on an explicit per-method config struct so
//! it can be overridden and tested per call.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::angle_filter::{filter_candidates, PelvisFrame, DEFAULT_ANGLE_THRESHOLD_DEG};
use crate::correction::{eric_lauren, vu, CorrectionConfig};
use crate::signal::{derivative, find_peaks, moving_average, Peak};
use crate::types::{
    validate_sampling_rate, CorrectionKind, DetectionMethod, GaitEventSet, GaitResult,
    MarkerTrajectory, SignalRole, Task,
};

/// Parameters for the heel/toe height method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightEventConfig {
    /// Minimum time between two events of the same kind, in seconds.
    pub min_event_interval_s: f64,
    /// Inclusive height band applied to the negated height signal.
    pub height_lo: f64,
    /// Upper edge of the height band on the negated signal.
    pub height_hi: f64,
    /// Pelvis orientation-change threshold in degrees.
    pub angle_thresh_deg: f64,
}

impl Default for HeightEventConfig {
    fn default() -> Self {
        Self {
            min_event_interval_s: 0.6,
            height_lo: -1.0,
            height_hi: 0.0,
            angle_thresh_deg: DEFAULT_ANGLE_THRESHOLD_DEG,
        }
    }
}

/// Parameters for the mix method (heel height + toe-to-pelvis distance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixEventConfig {
    /// Minimum time between two events of the same kind, in seconds.
    pub min_event_interval_s: f64,
    /// Inclusive band on the negated heel height signal.
    pub hc_height_lo: f64,
    /// Upper edge of the heel-contact band.
    pub hc_height_hi: f64,
    /// Toe-off band on the signed pelvis-to-toe distance (treadmill).
    pub treadmill_to_lo: f64,
    /// Upper edge of the treadmill toe-off band.
    pub treadmill_to_hi: f64,
    /// Toe-off band on the absolute pelvis-to-toe distance (overground).
    pub overground_to_lo: f64,
    /// Upper edge of the overground toe-off band.
    pub overground_to_hi: f64,
    /// Pelvis orientation-change threshold in degrees.
    pub angle_thresh_deg: f64,
}

impl Default for MixEventConfig {
    fn default() -> Self {
        Self {
            min_event_interval_s: 0.5,
            hc_height_lo: -1.0,
            hc_height_hi: 0.0,
            treadmill_to_lo: 0.0,
            treadmill_to_hi: 1.0,
            overground_to_lo: 0.05,
            overground_to_hi: 0.2,
            angle_thresh_deg: DEFAULT_ANGLE_THRESHOLD_DEG,
        }
    }
}

/// Parameters for the pure pelvis-distance method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SacrumDistanceConfig {
    /// Minimum time between two events of the same kind, in seconds.
    pub min_event_interval_s: f64,
    /// Inclusive band on both distance signals.
    pub height_lo: f64,
    /// Upper edge of the distance band.
    pub height_hi: f64,
}

impl Default for SacrumDistanceConfig {
    fn default() -> Self {
        Self {
            min_event_interval_s: 0.5,
            height_lo: 0.0,
            height_hi: 1.0,
        }
    }
}

/// Parameters for the vertical foot-velocity method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootVelocityConfig {
    /// Moving-average window (samples) applied to the raw velocity.
    pub smoothing_window: usize,
    /// Gain growth per sample during the toe-off enhancement pass.
    pub gain_increment: f64,
    /// Minimum separation between heel-contact candidates, in seconds.
    pub hc_min_interval_s: f64,
    /// Heel-contact band on the negated enhanced velocity.
    pub hc_height_lo: f64,
    /// Upper edge of the heel-contact band.
    pub hc_height_hi: f64,
    /// Minimum separation between toe-off events, in seconds.
    pub to_min_interval_s: f64,
    /// Minimum enhanced velocity for a toe-off peak (no upper bound).
    pub to_height_min: f64,
}

impl Default for FootVelocityConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 7,
            gain_increment: 0.05,
            hc_min_interval_s: 0.1,
            hc_height_lo: 0.1,
            hc_height_hi: 1.0,
            to_min_interval_s: 0.5,
            to_height_min: 0.1,
        }
    }
}

/// Parameters for the velocity-sign-crossing method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityCrossingConfig {
    /// Number of consecutive velocity samples a crossing must hold.
    pub window: usize,
    /// Velocity threshold separating stance from swing, in units/s.
    pub threshold: f64,
}

impl Default for VelocityCrossingConfig {
    fn default() -> Self {
        Self {
            window: 20,
            threshold: 0.0,
        }
    }
}

/// Borrow the four pelvis coordinate sequences required by the angle filter.
fn pelvis_frame(
    traj: &MarkerTrajectory,
    method: DetectionMethod,
) -> GaitResult<PelvisFrame<'_>> {
    Ok(PelvisFrame {
        sac1_x: traj.require(SignalRole::Sacrum1X, method)?,
        sac1_z: traj.require(SignalRole::Sacrum1Z, method)?,
        sac2_x: traj.require(SignalRole::Sacrum2X, method)?,
        sac2_z: traj.require(SignalRole::Sacrum2Z, method)?,
    })
}

/// Find peaks of the negated signal and report them with un-negated values,
/// so minima of the original signal come back with their true amplitudes.
fn find_minima(
    signal: &[f64],
    min_distance: usize,
    height_lo: f64,
    height_hi: f64,
) -> GaitResult<Vec<Peak>> {
    let negated: Vec<f64> = signal.iter().map(|v| -v).collect();
    let peaks = find_peaks(&negated, min_distance, height_lo, height_hi)?;
    Ok(peaks
        .into_iter()
        .map(|p| Peak {
            index: p.index,
            value: -p.value,
        })
        .collect())
}

fn assemble_events(hc: Vec<Peak>, to: Vec<Peak>) -> GaitEventSet {
    let mut events = GaitEventSet::new();
    for peak in hc {
        events.hc_index.push(peak.index);
        events.hc_value.push(peak.value);
    }
    for peak in to {
        events.to_index.push(peak.index);
        events.to_value.push(peak.value);
    }
    events
}

fn min_distance_samples(interval_s: f64, fs: f64) -> usize {
    (interval_s * fs).round() as usize
}

/// Heel/toe height method.
///
/// Heel contacts are minima of the heel height, toe-offs minima of the toe
/// height; both lists are pruned by the pelvis angle filter. Raw toe-off
/// candidates are reported as-is; see `heel_toe_height_corrected` for the
/// metatarsal-substitute variant.
pub fn heel_toe_height(
    traj: &MarkerTrajectory,
    fs: f64,
    config: &HeightEventConfig,
) -> GaitResult<GaitEventSet> {
    detect_height_events(
        traj,
        fs,
        DetectionMethod::HeelToeHeight,
        CorrectionKind::None,
        config,
        &CorrectionConfig::default(),
    )
}

/// Heel/toe height method with toe-off refinement.
///
/// Candidate extraction is identical to `heel_toe_height`; when a metatarsal
/// marker substitutes for the toe marker, the chosen correction strategy
/// refines the surviving toe-off candidates.
pub fn heel_toe_height_corrected(
    traj: &MarkerTrajectory,
    fs: f64,
    correction: CorrectionKind,
    config: &HeightEventConfig,
    correction_config: &CorrectionConfig,
) -> GaitResult<GaitEventSet> {
    detect_height_events(
        traj,
        fs,
        DetectionMethod::HeelToeHeightCorrected,
        correction,
        config,
        correction_config,
    )
}

fn detect_height_events(
    traj: &MarkerTrajectory,
    fs: f64,
    method: DetectionMethod,
    correction: CorrectionKind,
    config: &HeightEventConfig,
    correction_config: &CorrectionConfig,
) -> GaitResult<GaitEventSet> {
    let fs = validate_sampling_rate(fs)?;

    let heel_y = traj.require(SignalRole::HeelY, method)?;
    let toe_y = traj.require(SignalRole::ToeY, method)?;
    let frame = pelvis_frame(traj, method)?;
    let min_distance = min_distance_samples(config.min_event_interval_s, fs);

    let hc_raw = find_minima(heel_y, min_distance, config.height_lo, config.height_hi)?;
    let hc = filter_candidates(&frame, &hc_raw, config.angle_thresh_deg);

    let to_raw = find_minima(toe_y, min_distance, config.height_lo, config.height_hi)?;
    let to_filtered = filter_candidates(&frame, &to_raw, config.angle_thresh_deg);

    let to = match correction {
        CorrectionKind::None => to_filtered,
        CorrectionKind::EricLauren => eric_lauren(&to_filtered, toe_y, fs, correction_config),
        CorrectionKind::Vu => vu(&to_filtered, toe_y, fs, correction_config)?,
    };

    Ok(assemble_events(hc, to))
}

/// Mix method: heel height for HC, toe-to-pelvis progression distance for TO.
///
/// Overground walking uses the absolute pelvis-to-toe distance with a tight
/// band; treadmill walking uses the signed distance. Both event lists are
/// angle-filtered.
pub fn mix(
    traj: &MarkerTrajectory,
    fs: f64,
    task: Task,
    config: &MixEventConfig,
) -> GaitResult<GaitEventSet> {
    let fs = validate_sampling_rate(fs)?;
    let method = DetectionMethod::Mix;

    let heel_y = traj.require(SignalRole::HeelY, method)?;
    let toe_z = traj.require(SignalRole::ToeZ, method)?;
    let sacrum_z = traj.require(SignalRole::SacrumZ, method)?;
    let frame = pelvis_frame(traj, method)?;
    let min_distance = min_distance_samples(config.min_event_interval_s, fs);

    let hc_raw = find_minima(heel_y, min_distance, config.hc_height_lo, config.hc_height_hi)?;
    let hc = filter_candidates(&frame, &hc_raw, config.angle_thresh_deg);

    let (to_signal, to_lo, to_hi): (Vec<f64>, f64, f64) = match task {
        Task::TreadmillWalking => (
            sacrum_z
                .iter()
                .zip(toe_z)
                .map(|(s, t)| s - t)
                .collect(),
            config.treadmill_to_lo,
            config.treadmill_to_hi,
        ),
        Task::Walking => (
            sacrum_z
                .iter()
                .zip(toe_z)
                .map(|(s, t)| (s - t).abs())
                .collect(),
            config.overground_to_lo,
            config.overground_to_hi,
        ),
    };
    let to_raw = find_peaks(&to_signal, min_distance, to_lo, to_hi)?;
    let to = filter_candidates(&frame, &to_raw, config.angle_thresh_deg);

    Ok(assemble_events(hc, to))
}

/// Pure pelvis-distance method: peaks of the heel-to-pelvis and
/// pelvis-to-toe progression distances. No angle filter, no correction.
pub fn heel_toe_sacrum_distance(
    traj: &MarkerTrajectory,
    fs: f64,
    config: &SacrumDistanceConfig,
) -> GaitResult<GaitEventSet> {
    let fs = validate_sampling_rate(fs)?;
    let method = DetectionMethod::HeelToeSacrumDistance;

    let heel_z = traj.require(SignalRole::HeelZ, method)?;
    let toe_z = traj.require(SignalRole::ToeZ, method)?;
    let sacrum_z = traj.require(SignalRole::SacrumZ, method)?;
    let min_distance = min_distance_samples(config.min_event_interval_s, fs);

    let heel_distance: Vec<f64> = heel_z.iter().zip(sacrum_z).map(|(h, s)| h - s).collect();
    let hc = find_peaks(&heel_distance, min_distance, config.height_lo, config.height_hi)?;

    let toe_distance: Vec<f64> = sacrum_z.iter().zip(toe_z).map(|(s, t)| s - t).collect();
    let to = find_peaks(&toe_distance, min_distance, config.height_lo, config.height_hi)?;

    Ok(assemble_events(hc, to))
}

/// Gain-enhancement pass sharpening toe-off peaks in the foot velocity.
///
/// Pure forward scan, no backtracking: while the instantaneous velocity is
/// non-negative the gain changes by `increment` per sample (growing while
/// the velocity is non-decreasing, shrinking while it falls) and resets to
/// 1.0 whenever the velocity goes negative. Each output sample is the
/// velocity scaled by the gain at that sample. Output length is input
/// length − 1 (the scan needs one sample of lookahead).
pub(crate) fn enhance_toe_off_peaks(velocity: &[f64], increment: f64) -> Vec<f64> {
    let mut gain = 1.0;
    let mut direction = 1.0;
    let mut enhanced = Vec::with_capacity(velocity.len().saturating_sub(1));

    for window in velocity.windows(2) {
        let (curr, next) = (window[0], window[1]);
        if curr >= 0.0 {
            gain += increment * direction;
            direction = if next - curr >= 0.0 { 1.0 } else { -1.0 };
        } else {
            gain = 1.0;
        }
        enhanced.push(curr * gain);
    }
    enhanced
}

/// Vertical foot-velocity method.
///
/// The foot-center height (mean of heel and toe heights) is differentiated,
/// smoothed, and gain-enhanced. Toe-offs are peaks of the enhanced velocity;
/// heel-contact candidates are peaks of its negation. The final heel-contact
/// list is derived by pairing each toe-off with the most recent candidate
/// strictly before it; a toe-off with no prior candidate is a mid-swing
/// artifact; it is logged and keeps no heel-contact entry rather than
/// aborting the run.
pub fn foot_velocity(
    traj: &MarkerTrajectory,
    fs: f64,
    config: &FootVelocityConfig,
) -> GaitResult<GaitEventSet> {
    let fs = validate_sampling_rate(fs)?;
    let method = DetectionMethod::FootVelocity;

    let heel_y = traj.require(SignalRole::HeelY, method)?;
    let toe_y = traj.require(SignalRole::ToeY, method)?;

    let foot_center: Vec<f64> = heel_y
        .iter()
        .zip(toe_y)
        .map(|(h, t)| (h + t) / 2.0)
        .collect();
    let velocity = moving_average(&derivative(&foot_center, fs), config.smoothing_window);
    let enhanced = enhance_toe_off_peaks(&velocity, config.gain_increment);

    let hc_candidates = find_minima(
        &enhanced,
        min_distance_samples(config.hc_min_interval_s, fs),
        config.hc_height_lo,
        config.hc_height_hi,
    )?;
    let to_peaks = find_peaks(
        &enhanced,
        min_distance_samples(config.to_min_interval_s, fs),
        config.to_height_min,
        f64::INFINITY,
    )?;

    let mut events = GaitEventSet::new();
    for to_peak in &to_peaks {
        match hc_candidates
            .iter()
            .rev()
            .find(|hc| hc.index < to_peak.index)
        {
            Some(hc) => {
                // A pairing that repeats the previous heel contact is
                // skipped so hc_index stays strictly increasing.
                if events.hc_index.last() != Some(&hc.index) {
                    events.hc_index.push(hc.index);
                    events.hc_value.push(hc.value);
                }
            }
            None => warn!(
                "mid-swing toe-off at frame {}: no stance following, no heel contact paired",
                to_peak.index
            ),
        }
        events.to_index.push(to_peak.index);
        events.to_value.push(to_peak.value);
    }

    Ok(events)
}

/// Velocity-sign-crossing method.
///
/// Heel and toe progression velocities are scanned with a fixed window: a
/// toe-off is a falling-then-rising crossing of the toe velocity (below
/// threshold at one sample, above it for the whole following window); a
/// heel contact is a rising-then-falling crossing of the heel velocity
/// (above threshold for a full window, then below). Event values are 0.0;
/// the crossings carry timing only.
pub fn heel_toe_velocity(
    traj: &MarkerTrajectory,
    fs: f64,
    config: &VelocityCrossingConfig,
) -> GaitResult<GaitEventSet> {
    let fs = validate_sampling_rate(fs)?;
    let method = DetectionMethod::HeelToeVelocity;

    let heel_z = traj.require(SignalRole::HeelZ, method)?;
    let toe_z = traj.require(SignalRole::ToeZ, method)?;

    let heel_vel = derivative(heel_z, fs);
    let toe_vel = derivative(toe_z, fs);
    let window = config.window;
    let threshold = config.threshold;

    let mut events = GaitEventSet::new();
    if heel_vel.len() <= window {
        return Ok(events);
    }

    for i in 0..heel_vel.len() - window {
        if toe_vel[i] < threshold && toe_vel[i + 1..i + window].iter().all(|&v| v > threshold) {
            events.to_index.push(i + 2);
            events.to_value.push(0.0);
        }

        if heel_vel[i..i + window].iter().all(|&v| v > threshold) && heel_vel[i + window] < threshold
        {
            events.hc_index.push(i + window + 1);
            events.hc_value.push(0.0);
        }
    }

    Ok(events)
}
