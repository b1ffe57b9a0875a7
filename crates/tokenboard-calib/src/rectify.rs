use nalgebra::Point2;

use tokenboard_core::{homography_from_corners, warp_gray, Frame, FrameView, Homography};

use crate::board::Board;

/// Cached perspective rectification for a calibrated board.
///
/// Maps the four detected corners onto the axis-aligned
/// `[0,0]..[w-1,h-1]` rectangle once, then warps every subsequent
/// camera frame onto that canonical plate until recalibration.
#[derive(Clone, Debug)]
pub struct BoardRectifier {
    h_img_from_board: Homography,
    width: usize,
    height: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum RectifyError {
    #[error("board corners do not admit a perspective mapping")]
    SingularCorners,
}

impl BoardRectifier {
    pub fn new(board: &Board) -> Result<Self, RectifyError> {
        let w = board.width as f32;
        let h = board.height as f32;
        let canonical = [
            Point2::new(0.0, 0.0),
            Point2::new(w - 1.0, 0.0),
            Point2::new(w - 1.0, h - 1.0),
            Point2::new(0.0, h - 1.0),
        ];
        let h_img_from_board = homography_from_corners(&canonical, &board.corners)
            .ok_or(RectifyError::SingularCorners)?;
        Ok(Self {
            h_img_from_board,
            width: board.width as usize,
            height: board.height as usize,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Warp one camera frame onto the canonical board plate.
    pub fn rectify(&self, frame: &FrameView<'_>) -> Frame {
        warp_gray(frame, self.h_img_from_board, self.width, self.height)
    }
}
