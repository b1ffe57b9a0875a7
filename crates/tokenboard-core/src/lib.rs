//! Core types and coordinate math for tabletop token tracking.
//!
//! This crate is intentionally small and free of detector logic. It
//! holds the coordinate-space [`Extent`] and the remapping functions
//! that keep camera, board, projector and map space consistent, the
//! [`TrackedToken`] lifecycle types, and the grayscale frame buffers
//! the calibrator consumes.

mod extent;
mod frame;
mod homography;
mod logger;
mod token;

pub use extent::{
    assign_world, local_from_world, remap_extent, remap_point, remap_token, Extent, ExtentError,
};
pub use frame::{sample_bilinear, sample_bilinear_u8, Frame, FrameView};
pub use homography::{homography_from_corners, warp_gray, Homography};
pub use token::{TokenColor, TokenKey, TokenShape, TokenStatus, TrackedToken};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
