//! Token lifecycle tracking and remote reconciliation.
//!
//! The [`TokenTracker`] turns noisy per-frame candidate detections into
//! a stable confirmed set with hysteresis on both appearance and
//! disappearance, classifies tokens as on-table UI controls or
//! geographic tokens, and mirrors the geographic ones to a remote
//! planning authority through the [`RemoteAuthority`] boundary. The
//! [`SyncWorker`] periodically pulls the authority's full object list
//! and reconciles it under the same lock the frame loop uses.

mod boundary;
mod params;
mod spaces;
mod stage;
mod sync;
mod tracker;

pub use boundary::{HitTester, RemoteAuthority, RemoteError, RemoteToken};
pub use params::{TrackerParams, TrackerParamsError};
pub use spaces::SpaceRegistry;
pub use stage::{DetectMode, ProgramStage};
pub use sync::SyncWorker;
pub use tracker::TokenTracker;
