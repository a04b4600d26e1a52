//! Marker-trajectory assembly from a synchronized tabular dataset.
//!
//! External loaders produce a table of named columns (one per marker axis,
//! all synchronized to the trial's sampling rate). This module slices that
//! table into the `MarkerTrajectory` a detection method needs, for both the
//! target leg and the adjacent leg, following the column naming convention
//! `{LEG}{TOKEN} {AXIS}` (for example `LCAL Y` for the left heel height).
//!
//! The pelvis orientation frame is always built from both legs' sacrum
//! markers: the target leg's marker is `sacrum1`, the adjacent leg's
//! `sacrum2`, the same frame for both output trajectories.

use std::collections::BTreeMap;

use crate::dispatch::MarkerNaming;
use crate::types::{DetectionMethod, GaitError, GaitResult, MarkerTrajectory, SignalRole};

/// A synchronized tabular dataset: named columns of equal-rate samples.
#[derive(Debug, Clone, Default)]
pub struct SyncedTable {
    columns: BTreeMap<String, Vec<f64>>,
}

impl SyncedTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            columns: BTreeMap::new(),
        }
    }

    /// Insert a column, replacing any previous column with the same name.
    pub fn insert(&mut self, name: impl Into<String>, samples: Vec<f64>) {
        self.columns.insert(name.into(), samples);
    }

    /// Look up a column, failing fast when absent.
    pub fn column(&self, name: &str) -> GaitResult<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| GaitError::MissingColumn(name.to_string()))
    }

    /// Column names present in the table.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

fn column_name(leg: &str, token: &str, axis: &str) -> String {
    format!("{}{} {}", leg.to_ascii_uppercase(), token, axis)
}

/// Build the target-leg and adjacent-leg marker trajectories for a method.
///
/// Only the two selectable methods have an assembly recipe: `HeelToeHeight`
/// reads true toe heights, `Mix` reads metatarsal progression positions and
/// the two-leg mean pelvis progression. Any other method fails with
/// `UnsupportedMethod` before touching the table.
pub fn assemble_marker_trajectories(
    table: &SyncedTable,
    method: DetectionMethod,
    target_leg: &str,
    adjacent_leg: &str,
    naming: &MarkerNaming,
) -> GaitResult<(MarkerTrajectory, MarkerTrajectory)> {
    match method {
        DetectionMethod::HeelToeHeight | DetectionMethod::Mix => {}
        other => {
            return Err(GaitError::UnsupportedMethod {
                method: other,
                operation: "marker trajectory assembly",
            })
        }
    }

    let heel_y_target = table.column(&column_name(target_leg, &naming.heel_token, "Y"))?;
    let heel_y_adjacent = table.column(&column_name(adjacent_leg, &naming.heel_token, "Y"))?;

    let sacrum_x_target = table.column(&column_name(target_leg, &naming.sacrum_token, "X"))?;
    let sacrum_z_target = table.column(&column_name(target_leg, &naming.sacrum_token, "Z"))?;
    let sacrum_x_adjacent = table.column(&column_name(adjacent_leg, &naming.sacrum_token, "X"))?;
    let sacrum_z_adjacent = table.column(&column_name(adjacent_leg, &naming.sacrum_token, "Z"))?;

    let mut target = MarkerTrajectory::new();
    let mut adjacent = MarkerTrajectory::new();

    target.insert(SignalRole::HeelY, heel_y_target.to_vec())?;
    adjacent.insert(SignalRole::HeelY, heel_y_adjacent.to_vec())?;

    // Both trajectories share the same pelvis orientation frame.
    for traj in [&mut target, &mut adjacent] {
        traj.insert(SignalRole::Sacrum1X, sacrum_x_target.to_vec())?;
        traj.insert(SignalRole::Sacrum1Z, sacrum_z_target.to_vec())?;
        traj.insert(SignalRole::Sacrum2X, sacrum_x_adjacent.to_vec())?;
        traj.insert(SignalRole::Sacrum2Z, sacrum_z_adjacent.to_vec())?;
    }

    match method {
        DetectionMethod::HeelToeHeight => {
            let toe_y_target = table.column(&column_name(target_leg, &naming.toe_token, "Y"))?;
            let toe_y_adjacent =
                table.column(&column_name(adjacent_leg, &naming.toe_token, "Y"))?;
            target.insert(SignalRole::ToeY, toe_y_target.to_vec())?;
            adjacent.insert(SignalRole::ToeY, toe_y_adjacent.to_vec())?;
        }
        DetectionMethod::Mix => {
            let toe_z_target =
                table.column(&column_name(target_leg, &naming.metatarsal_token, "Z"))?;
            let toe_z_adjacent =
                table.column(&column_name(adjacent_leg, &naming.metatarsal_token, "Z"))?;

            // The pelvis progression signal is the two-leg mean of the
            // sacrum markers.
            let sacrum_z_mean: Vec<f64> = sacrum_z_target
                .iter()
                .zip(sacrum_z_adjacent)
                .map(|(a, b)| (a + b) / 2.0)
                .collect();

            target.insert(SignalRole::ToeZ, toe_z_target.to_vec())?;
            target.insert(SignalRole::SacrumZ, sacrum_z_mean.clone())?;
            adjacent.insert(SignalRole::ToeZ, toe_z_adjacent.to_vec())?;
            adjacent.insert(SignalRole::SacrumZ, sacrum_z_mean)?;
        }
        _ => unreachable!("guarded above"),
    }

    Ok((target, adjacent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table_for(method: DetectionMethod, len: usize) -> SyncedTable {
        let mut table = SyncedTable::new();
        for leg in ["L", "R"] {
            table.insert(format!("{leg}CAL Y"), vec![0.1; len]);
            table.insert(format!("{leg}PS2 X"), vec![0.2; len]);
            table.insert(format!("{leg}PS2 Z"), vec![0.3; len]);
            match method {
                DetectionMethod::HeelToeHeight => {
                    table.insert(format!("{leg}TOE Y"), vec![0.05; len]);
                }
                DetectionMethod::Mix => {
                    table.insert(format!("{leg}MT2 Z"), vec![0.4; len]);
                }
                _ => {}
            }
        }
        table
    }

    #[test]
    fn test_assemble_heel_toe_height_roles() {
        let table = table_for(DetectionMethod::HeelToeHeight, 50);
        let (target, adjacent) = assemble_marker_trajectories(
            &table,
            DetectionMethod::HeelToeHeight,
            "l",
            "r",
            &MarkerNaming::default(),
        )
        .unwrap();

        for traj in [&target, &adjacent] {
            assert!(traj.contains(SignalRole::HeelY));
            assert!(traj.contains(SignalRole::ToeY));
            assert!(traj.contains(SignalRole::Sacrum1X));
            assert!(traj.contains(SignalRole::Sacrum2Z));
            assert!(!traj.contains(SignalRole::SacrumZ));
            assert_eq!(traj.num_frames(), 50);
        }
    }

    #[test]
    fn test_assemble_mix_builds_mean_sacrum() {
        let mut table = table_for(DetectionMethod::Mix, 50);
        table.insert("LPS2 Z", vec![0.2; 50]);
        table.insert("RPS2 Z", vec![0.4; 50]);

        let (target, _) = assemble_marker_trajectories(
            &table,
            DetectionMethod::Mix,
            "L",
            "R",
            &MarkerNaming::default(),
        )
        .unwrap();

        let sacrum_z = target.get(SignalRole::SacrumZ).unwrap();
        for &v in sacrum_z {
            assert_relative_eq!(v, 0.3, max_relative = 1e-12);
        }
        assert!(target.contains(SignalRole::ToeZ));
        assert!(!target.contains(SignalRole::ToeY));
    }

    #[test]
    fn test_assemble_missing_column() {
        let mut table = table_for(DetectionMethod::HeelToeHeight, 50);
        // Remove the adjacent leg's toe column by rebuilding without it.
        let mut trimmed = SyncedTable::new();
        for name in table.column_names() {
            if name != "RTOE Y" {
                trimmed.insert(name.to_string(), table.column(name).unwrap().to_vec());
            }
        }
        table = trimmed;

        let err = assemble_marker_trajectories(
            &table,
            DetectionMethod::HeelToeHeight,
            "L",
            "R",
            &MarkerNaming::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GaitError::MissingColumn(name) if name == "RTOE Y"));
    }

    #[test]
    fn test_assemble_unsupported_method() {
        let table = table_for(DetectionMethod::HeelToeHeight, 50);
        let err = assemble_marker_trajectories(
            &table,
            DetectionMethod::FootVelocity,
            "L",
            "R",
            &MarkerNaming::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GaitError::UnsupportedMethod {
                method: DetectionMethod::FootVelocity,
                ..
            }
        ));
    }
}
