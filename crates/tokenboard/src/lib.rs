//! High-level facade crate for the `tokenboard-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying crates
//! - the stage-gated [`Pipeline`] that wires the board calibrator and
//!   the token tracker into one per-frame entry point
//!
//! ## API map
//! - `tokenboard::core`: extents, remapping, token types, frames.
//! - `tokenboard::calib`: board calibration from corner fiducials.
//! - `tokenboard::track`: token lifecycle tracker, space registry and
//!   remote reconciliation.

pub use tokenboard_calib as calib;
pub use tokenboard_core as core;
pub use tokenboard_track as track;

pub use tokenboard_calib::{BoardDetector, CalibrationParams, CalibrationPhase, MarkerFinder};
pub use tokenboard_core::{Extent, TokenColor, TokenShape, TokenStatus, TrackedToken};
pub use tokenboard_track::{
    HitTester, ProgramStage, RemoteAuthority, SpaceRegistry, SyncWorker, TokenTracker,
    TrackerParams,
};

mod pipeline;
pub use pipeline::Pipeline;
