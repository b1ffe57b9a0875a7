use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Token footprint on the board. Only two geometries are modeled;
/// anything else the classifier reports is `Unknown`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TokenShape {
    Square,
    Rectangle,
    Unknown,
}

/// Classified token color.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TokenColor {
    Red,
    Green,
    Blue,
    Yellow,
    White,
    Black,
    Unknown,
}

/// Lifecycle status of a tracked token.
///
/// A token leaves `Candidate` exactly once and never returns to it.
/// `Internal` tokens sit on on-table UI controls and have no remote
/// counterpart; `External` tokens are mirrored to the remote authority
/// and are the only ones carrying an id.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TokenStatus {
    Candidate,
    Internal,
    External,
    Outdated,
}

/// A physical token observed on the board.
///
/// `local_x`/`local_y` are board-space pixels; `world` is the map-space
/// position, filled in once the token is promoted to `External`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackedToken {
    pub id: Option<u32>,
    pub local_x: i32,
    pub local_y: i32,
    pub shape: TokenShape,
    pub color: TokenColor,
    pub status: TokenStatus,
    pub world: Option<Point2<f64>>,
}

impl TrackedToken {
    /// A raw per-frame detection, not yet confirmed.
    pub fn candidate(local_x: i32, local_y: i32, shape: TokenShape, color: TokenColor) -> Self {
        Self {
            id: None,
            local_x,
            local_y,
            shape,
            color,
            status: TokenStatus::Candidate,
            world: None,
        }
    }

    /// Matching key: rounded position plus appearance. Two detections
    /// with equal keys are the same physical token, identity or not.
    #[inline]
    pub fn key(&self) -> TokenKey {
        TokenKey {
            x: self.local_x,
            y: self.local_y,
            shape: self.shape,
            color: self.color,
        }
    }

    #[inline]
    pub fn matches(&self, other: &TrackedToken) -> bool {
        self.key() == other.key()
    }

    /// Per-axis proximity test. Tokens are rigid and grid-spaced, so a
    /// plain distance bound is enough to absorb detection jitter.
    #[inline]
    pub fn is_near(&self, other: &TrackedToken, min_distance: i32) -> bool {
        (self.local_x - other.local_x).abs() <= min_distance
            && (self.local_y - other.local_y).abs() <= min_distance
    }
}

/// Hashable matching key for the tracker's tick tables.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TokenKey {
    pub x: i32,
    pub y: i32,
    pub shape: TokenShape,
    pub color: TokenColor,
}

impl TokenKey {
    #[inline]
    pub fn is_near(&self, other: &TokenKey, min_distance: i32) -> bool {
        (self.x - other.x).abs() <= min_distance && (self.y - other.y).abs() <= min_distance
    }

    /// Chebyshev distance, consistent with the per-axis bound.
    #[inline]
    pub fn axis_distance(&self, other: &TokenKey) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}
