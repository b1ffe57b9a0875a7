use std::collections::HashMap;

use log::{debug, info, warn};

use tokenboard_core::FrameView;

use crate::background::BackgroundModel;
use crate::board::Board;
use crate::corners::derive_board_corners;
use crate::marker::{CornerMarker, CornerTag, MarkerFinder};
use crate::params::{CalibParamsError, CalibrationParams};
use crate::rectify::BoardRectifier;
use crate::threshold::ThresholdSearch;

/// Calibration progress, surfaced to the UI as "not yet calibrated"
/// until the final phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CalibrationPhase {
    AwaitingBackground,
    AwaitingCorners,
    Calibrated,
}

/// Board calibration state machine.
///
/// Feed camera frames until `Calibrated`; markers found along the way
/// are cached permanently (first detection wins), and a frame with
/// missing markers only advances the threshold search. There is no
/// failure state and no timeout.
pub struct BoardDetector {
    params: CalibrationParams,
    phase: CalibrationPhase,
    background: BackgroundModel,
    search: ThresholdSearch,
    markers: HashMap<CornerTag, CornerMarker>,
    board: Option<Board>,
    rectifier: Option<BoardRectifier>,
}

impl BoardDetector {
    pub fn new(params: CalibrationParams) -> Result<Self, CalibParamsError> {
        params.validate()?;
        let background = BackgroundModel::new(params.background_frames, params.stability_eps);
        let search = ThresholdSearch::new(params.initial_threshold, params.threshold_step);
        Ok(Self {
            params,
            phase: CalibrationPhase::AwaitingBackground,
            background,
            search,
            markers: HashMap::new(),
            board: None,
            rectifier: None,
        })
    }

    #[inline]
    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn rectifier(&self) -> Option<&BoardRectifier> {
        self.rectifier.as_ref()
    }

    pub fn markers_found(&self) -> usize {
        self.markers.len()
    }

    /// Feed one camera frame. Returns the phase after the frame.
    pub fn process(&mut self, frame: &FrameView<'_>, finder: &dyn MarkerFinder) -> CalibrationPhase {
        match self.phase {
            CalibrationPhase::AwaitingBackground => {
                if self.background.accumulate(frame) {
                    info!(
                        "background plate ready after {} frames",
                        self.background.frames_seen()
                    );
                    self.phase = CalibrationPhase::AwaitingCorners;
                }
            }
            CalibrationPhase::AwaitingCorners => self.search_corners(frame, finder),
            CalibrationPhase::Calibrated => {}
        }
        self.phase
    }

    fn search_corners(&mut self, frame: &FrameView<'_>, finder: &dyn MarkerFinder) {
        let Some(delta) = self.background.subtract(frame) else {
            return;
        };
        let binary = delta.binarize(self.search.value());

        for marker in finder.find_markers(&binary.view()) {
            if !self.markers.contains_key(&marker.tag) {
                info!(
                    "fiducial {:?} located at threshold {}",
                    marker.tag,
                    self.search.value()
                );
                self.search.mark_marker_seen();
                self.markers.insert(marker.tag, marker);
            }
        }

        if self.markers.len() == CornerTag::ALL.len() {
            if let Some(corners) = derive_board_corners(&self.markers) {
                match Board::from_corners(corners, self.search.value()) {
                    Some(board) => match BoardRectifier::new(&board) {
                        Ok(rectifier) => {
                            info!(
                                "board calibrated: {}x{} px, corners {:?}",
                                board.width, board.height, board.corners
                            );
                            self.rectifier = Some(rectifier);
                            self.board = Some(board);
                            self.phase = CalibrationPhase::Calibrated;
                            return;
                        }
                        Err(err) => warn!("board corners rejected: {err}"),
                    },
                    None => warn!("board corners collapsed to a degenerate box"),
                }
                // A frozen marker set that cannot produce a board will
                // never improve; re-detect from scratch.
                self.markers.clear();
            }
        }

        self.search.advance();
        debug!("corner search continues at threshold {}", self.search.value());
    }

    /// Restart calibration from scratch (operator-driven recalibration).
    pub fn reset(&mut self) {
        self.phase = CalibrationPhase::AwaitingBackground;
        self.background.reset();
        self.search =
            ThresholdSearch::new(self.params.initial_threshold, self.params.threshold_step);
        self.markers.clear();
        self.board = None;
        self.rectifier = None;
    }
}
