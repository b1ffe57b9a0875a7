//! Board calibration from four corner fiducials.
//!
//! The calibrator accumulates a background plate, differences and
//! binarizes each subsequent frame, and hands the binary plate to an
//! external [`MarkerFinder`] that locates the tagged corner fiducials.
//! Markers sit inset from the physical board corners, so the true
//! corners are projected outward along the marker diagonals. The
//! binarization threshold is searched adaptively; uneven illumination
//! defeats any fixed value.
//!
//! There is no timeout. Calibration is a supervised setup step and the
//! only exit condition is "all four fiducials found".

mod background;
mod board;
mod corners;
mod detector;
mod marker;
mod params;
mod rectify;
mod threshold;

pub use background::BackgroundModel;
pub use board::Board;
pub use corners::derive_board_corners;
pub use detector::{BoardDetector, CalibrationPhase};
pub use marker::{CornerMarker, CornerTag, MarkerFinder};
pub use params::{CalibParamsError, CalibrationParams};
pub use rectify::{BoardRectifier, RectifyError};
pub use threshold::ThresholdSearch;
