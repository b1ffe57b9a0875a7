use serde::{Deserialize, Serialize};

/// Configuration for the board calibration state machine.
///
/// All fields have serde defaults so partial JSON configs load; invalid
/// values fail at construction, not deep inside the frame loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Frames blended into the background plate before the corner
    /// search starts.
    #[serde(default = "default_background_frames")]
    pub background_frames: u32,
    /// Early-exit bound: mean absolute per-pixel delta under which the
    /// plate counts as stable.
    #[serde(default = "default_stability_eps")]
    pub stability_eps: f32,
    /// Starting binarization threshold for the marker search.
    #[serde(default = "default_initial_threshold")]
    pub initial_threshold: u8,
    /// Starting oscillation step; halves after every full-range sweep.
    #[serde(default = "default_threshold_step")]
    pub threshold_step: u8,
}

fn default_background_frames() -> u32 {
    30
}

fn default_stability_eps() -> f32 {
    0.5
}

fn default_initial_threshold() -> u8 {
    128
}

fn default_threshold_step() -> u8 {
    16
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            background_frames: default_background_frames(),
            stability_eps: default_stability_eps(),
            initial_threshold: default_initial_threshold(),
            threshold_step: default_threshold_step(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid calibration parameter: {0}")]
pub struct CalibParamsError(pub &'static str);

impl CalibrationParams {
    pub fn validate(&self) -> Result<(), CalibParamsError> {
        if self.background_frames == 0 {
            return Err(CalibParamsError("background_frames must be at least 1"));
        }
        if self.threshold_step == 0 {
            return Err(CalibParamsError("threshold_step must be at least 1"));
        }
        if !self.stability_eps.is_finite() || self.stability_eps <= 0.0 {
            return Err(CalibParamsError("stability_eps must be positive"));
        }
        Ok(())
    }
}
