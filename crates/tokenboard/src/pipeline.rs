use std::sync::{Arc, Mutex};

use log::warn;

use tokenboard_calib::{BoardDetector, CalibrationPhase, MarkerFinder};
use tokenboard_core::{FrameView, TrackedToken};
use tokenboard_track::{ProgramStage, SpaceRegistry, TokenTracker};

/// Stage-gated frame pipeline.
///
/// The calibrator runs during the first two program stages, the tracker
/// only once `Detecting` is reached; calibration completion advances
/// the stage and publishes the board extent. The stage never moves
/// backwards; recalibration is an explicit operator action on the
/// detector, not something a frame can trigger.
pub struct Pipeline {
    stage: ProgramStage,
    detector: BoardDetector,
    tracker: Arc<Mutex<TokenTracker>>,
    spaces: Arc<SpaceRegistry>,
}

impl Pipeline {
    pub fn new(
        detector: BoardDetector,
        tracker: Arc<Mutex<TokenTracker>>,
        spaces: Arc<SpaceRegistry>,
    ) -> Self {
        Self {
            stage: ProgramStage::WhiteBalance,
            detector,
            tracker,
            spaces,
        }
    }

    #[inline]
    pub fn stage(&self) -> ProgramStage {
        self.stage
    }

    pub fn detector(&self) -> &BoardDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut BoardDetector {
        &mut self.detector
    }

    /// Drive one camera frame through whichever component the current
    /// stage enables. Returns the confirmed tokens when tracking ran,
    /// an empty list while calibrating.
    pub fn process_frame(
        &mut self,
        frame: &FrameView<'_>,
        finder: &dyn MarkerFinder,
        candidates: &[TrackedToken],
    ) -> Vec<TrackedToken> {
        if self.stage.runs_calibration() {
            match self.detector.process(frame, finder) {
                CalibrationPhase::AwaitingBackground => {}
                CalibrationPhase::AwaitingCorners => {
                    if self.stage == ProgramStage::WhiteBalance {
                        self.stage = self.stage.advance();
                    }
                }
                CalibrationPhase::Calibrated => {
                    if let Some(board) = self.detector.board() {
                        self.spaces.set_board(board.extent());
                    }
                    while self.stage.runs_calibration() {
                        self.stage = self.stage.advance();
                    }
                }
            }
            return Vec::new();
        }

        match self.tracker.lock() {
            Ok(mut tracker) => tracker.update(candidates).to_vec(),
            Err(_) => {
                warn!("tracker lock poisoned; dropping frame");
                Vec::new()
            }
        }
    }
}
