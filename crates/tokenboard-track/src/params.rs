use serde::{Deserialize, Serialize};

/// Tracker tuning.
///
/// `min_distance` is a per-axis pixel bound, deliberately a cheap match
/// criterion: tokens are rigid, slow and grid-spaced, so a statistical
/// tracker would buy nothing. UI-control tokens appear and disappear
/// faster than geographic tokens, which must tolerate brief occlusion
/// by hands and tools.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerParams {
    /// Per-axis distance bound for candidate matching, board pixels.
    #[serde(default = "default_min_distance")]
    pub min_distance: i32,
    /// Consecutive sightings before a UI-control token confirms.
    #[serde(default = "default_internal_min_appeared")]
    pub internal_min_appeared: u32,
    /// Consecutive sightings before a geographic token confirms.
    #[serde(default = "default_external_min_appeared")]
    pub external_min_appeared: u32,
    /// Absent frames tolerated for a confirmed UI-control token.
    #[serde(default = "default_internal_max_disappeared")]
    pub internal_max_disappeared: u32,
    /// Absent frames tolerated for a confirmed geographic token.
    #[serde(default = "default_external_max_disappeared")]
    pub external_max_disappeared: u32,
}

fn default_min_distance() -> i32 {
    8
}

fn default_internal_min_appeared() -> u32 {
    3
}

fn default_external_min_appeared() -> u32 {
    5
}

fn default_internal_max_disappeared() -> u32 {
    3
}

fn default_external_max_disappeared() -> u32 {
    10
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            min_distance: default_min_distance(),
            internal_min_appeared: default_internal_min_appeared(),
            external_min_appeared: default_external_min_appeared(),
            internal_max_disappeared: default_internal_max_disappeared(),
            external_max_disappeared: default_external_max_disappeared(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid tracker parameter: {0}")]
pub struct TrackerParamsError(pub &'static str);

impl TrackerParams {
    pub fn validate(&self) -> Result<(), TrackerParamsError> {
        if self.min_distance < 1 {
            return Err(TrackerParamsError("min_distance must be at least 1"));
        }
        if self.internal_min_appeared == 0 || self.external_min_appeared == 0 {
            return Err(TrackerParamsError(
                "appearance thresholds must be at least 1",
            ));
        }
        if self.internal_max_disappeared == 0 || self.external_max_disappeared == 0 {
            return Err(TrackerParamsError(
                "disappearance thresholds must be at least 1",
            ));
        }
        Ok(())
    }
}
