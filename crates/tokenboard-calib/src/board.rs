use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use tokenboard_core::Extent;

/// Calibrated board geometry, frozen once all four fiducials are found.
///
/// Only `threshold` ever changes during calibration; corners and size
/// are immutable after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    /// Projected board corners in camera pixels: TL, TR, BR, BL.
    pub corners: [Point2<f32>; 4],
    pub width: u32,
    pub height: u32,
    /// Binarization threshold that produced the successful detection.
    pub threshold: u8,
    extent: Extent,
}

impl Board {
    /// Build a board from projected corners. Width and height are the
    /// corner bounding box; a collapsed box is rejected.
    pub fn from_corners(corners: [Point2<f32>; 4], threshold: u8) -> Option<Self> {
        let xs = corners.map(|c| c.x);
        let ys = corners.map(|c| c.y);
        let min_x = xs.iter().copied().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().copied().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let width = (max_x - min_x).round() as u32;
        let height = (max_y - min_y).round() as u32;
        let extent = Extent::from_size(f64::from(width), f64::from(height), true).ok()?;

        Some(Self {
            corners,
            width,
            height,
            threshold,
            extent,
        })
    }

    /// Board pixel space as a remappable extent (y grows downward,
    /// image convention).
    #[inline]
    pub fn extent(&self) -> Extent {
        self.extent
    }
}
