use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use tokenboard_core::FrameView;

/// Which board corner a fiducial is printed at.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CornerTag {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl CornerTag {
    pub const ALL: [CornerTag; 4] = [
        CornerTag::TopLeft,
        CornerTag::TopRight,
        CornerTag::BottomRight,
        CornerTag::BottomLeft,
    ];

    /// The diagonally opposite corner.
    pub fn opposite(self) -> CornerTag {
        match self {
            CornerTag::TopLeft => CornerTag::BottomRight,
            CornerTag::TopRight => CornerTag::BottomLeft,
            CornerTag::BottomRight => CornerTag::TopLeft,
            CornerTag::BottomLeft => CornerTag::TopRight,
        }
    }
}

/// One located corner fiducial: its tag plus the marker outline quad in
/// camera pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerMarker {
    pub tag: CornerTag,
    /// Outline corners in detection order. `corners[0]` defines the
    /// centroid-to-corner radius used for board-corner projection.
    pub corners: [Point2<f32>; 4],
}

impl CornerMarker {
    pub fn centroid(&self) -> Point2<f32> {
        let mut sum = Vector2::zeros();
        for c in &self.corners {
            sum += c.coords;
        }
        Point2::from(sum / 4.0)
    }

    /// Distance from the first outline corner to the centroid.
    pub fn corner_radius(&self) -> f32 {
        (self.corners[0] - self.centroid()).norm()
    }
}

/// Locates tagged fiducial markers in a binarized difference frame.
///
/// Decoding the marker payload is a pixel-classification concern and
/// lives outside this crate; the calibrator only consumes the result.
pub trait MarkerFinder {
    fn find_markers(&self, binary: &FrameView<'_>) -> Vec<CornerMarker>;
}
