//! Gait-Event Detection Engine
//!
//! A pipeline that turns motion-capture marker trajectories (1D signal roles
//! sampled at a shared rate) into discrete heel-contact and toe-off events
//! using peak detection on derived signals, a pelvis-orientation
//! plausibility filter, and method-specific correction heuristics.
//!
//! # Design Philosophy
//!
//! - **Pure core**: every detection call is a deterministic function of its
//!   inputs. No I/O, no hidden state, no retained references, so batch
//!   processing across trials parallelizes trivially in the caller.
//! - **Fail-loud behavior**: a missing marker role or an invalid sampling
//!   rate is a typed error raised before any signal processing, never a
//!   silent lookup failure.
//! - **Soft degradation**: finding no events is an empty result, not an
//!   error; a toe-off with no preceding heel contact is logged and skipped.
//! - **Explicit parameters**: every threshold lives on a config struct that
//!   can be overridden per call.
//!
//! # Example
//!
//! ```ignore
//! use gait_events::{dispatch, DetectionConfig, DetectionMethod};
//! use gait_events::{CorrectionKind, MarkerTrajectory, SignalRole, Task};
//!
//! let mut traj = MarkerTrajectory::new();
//! traj.insert(SignalRole::HeelY, heel_height_samples)?;
//! traj.insert(SignalRole::ToeY, toe_height_samples)?;
//! // ... pelvis marker roles ...
//!
//! let events = dispatch(
//!     DetectionMethod::HeelToeHeight,
//!     &traj,
//!     100.0,
//!     Task::Walking,
//!     CorrectionKind::None,
//!     &DetectionConfig::default(),
//! )?;
//! if let Some((hc, to)) = events.first_cycle() {
//!     println!("first gait cycle: frames {hc} -> {to}");
//! }
//! ```

pub mod angle_filter;
pub mod assembly;
pub mod correction;
pub mod detection;
pub mod dispatch;
pub mod signal;
pub mod types;


pub use assembly::{assemble_marker_trajectories, SyncedTable};
pub use correction::CorrectionConfig;
pub use detection::{
    FootVelocityConfig, HeightEventConfig, MixEventConfig, SacrumDistanceConfig,
    VelocityCrossingConfig,
};
pub use dispatch::{dispatch, select_method, DetectionConfig, MarkerNaming};
pub use signal::Peak;
pub use types::{
    CorrectionKind, DetectionMethod, GaitError, GaitEventSet, GaitResult, MarkerTrajectory,
    SignalRole, Task,
};
