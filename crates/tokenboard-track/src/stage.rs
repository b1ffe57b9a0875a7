use serde::{Deserialize, Serialize};

/// What the operator is doing within the detection stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DetectMode {
    Evaluation,
    Planning,
}

/// Top-level program stage, strictly forward.
///
/// Calibration success drives `advance`; nothing regresses the stage
/// automatically. The calibrator runs only in the first two stages,
/// the tracker only in `Detecting`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ProgramStage {
    WhiteBalance,
    FindCorners,
    Detecting(DetectMode),
}

impl ProgramStage {
    pub fn advance(self) -> ProgramStage {
        match self {
            ProgramStage::WhiteBalance => ProgramStage::FindCorners,
            ProgramStage::FindCorners => ProgramStage::Detecting(DetectMode::Evaluation),
            done @ ProgramStage::Detecting(_) => done,
        }
    }

    /// Switch the detection mode. A no-op before `Detecting`; the
    /// stage itself never moves backwards.
    pub fn with_mode(self, mode: DetectMode) -> ProgramStage {
        match self {
            ProgramStage::Detecting(_) => ProgramStage::Detecting(mode),
            earlier => earlier,
        }
    }

    #[inline]
    pub fn runs_calibration(self) -> bool {
        matches!(
            self,
            ProgramStage::WhiteBalance | ProgramStage::FindCorners
        )
    }

    #[inline]
    pub fn runs_tracking(self) -> bool {
        matches!(self, ProgramStage::Detecting(_))
    }
}
