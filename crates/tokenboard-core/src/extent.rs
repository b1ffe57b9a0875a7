use log::warn;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::token::TrackedToken;

/// Axis-aligned rectangle describing a coordinate space.
///
/// `y_axis_inverted` records whether the y axis grows downward (image
/// convention) or upward (map convention). Remapping between two
/// extents flips the vertical axis when the flags differ, so a single
/// code path owns the image/map orientation change.
///
/// Degenerate extents are rejected at construction; remapping never
/// has to guard against a zero-sized source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExtent", into = "RawExtent")]
pub struct Extent {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
    y_axis_inverted: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum ExtentError {
    #[error("degenerate extent: x {x_min}..{x_max}, y {y_min}..{y_max}")]
    Degenerate {
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
    },
    #[error("extent bound is not finite")]
    NonFinite,
}

impl Extent {
    pub fn new(
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
        y_axis_inverted: bool,
    ) -> Result<Self, ExtentError> {
        if ![x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite()) {
            return Err(ExtentError::NonFinite);
        }
        if x_max <= x_min || y_max <= y_min {
            return Err(ExtentError::Degenerate {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
            y_axis_inverted,
        })
    }

    /// Extent anchored at the origin, e.g. a pixel plate or viewport.
    pub fn from_size(width: f64, height: f64, y_axis_inverted: bool) -> Result<Self, ExtentError> {
        Self::new(0.0, 0.0, width, height, y_axis_inverted)
    }

    #[inline]
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    #[inline]
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    #[inline]
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    #[inline]
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    #[inline]
    pub fn y_axis_inverted(&self) -> bool {
        self.y_axis_inverted
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    #[inline]
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }
}

#[derive(Serialize, Deserialize)]
struct RawExtent {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
    y_axis_inverted: bool,
}

impl TryFrom<RawExtent> for Extent {
    type Error = ExtentError;

    fn try_from(raw: RawExtent) -> Result<Self, Self::Error> {
        Extent::new(
            raw.x_min,
            raw.y_min,
            raw.x_max,
            raw.y_max,
            raw.y_axis_inverted,
        )
    }
}

impl From<Extent> for RawExtent {
    fn from(e: Extent) -> Self {
        RawExtent {
            x_min: e.x_min,
            y_min: e.y_min,
            x_max: e.x_max,
            y_max: e.y_max,
            y_axis_inverted: e.y_axis_inverted,
        }
    }
}

/// Remap a point from one extent's coordinate space into another's.
///
/// The point is normalized into `from`'s unit square, scaled to `to`'s
/// size, vertically flipped when the axis orientations differ, and
/// translated to `to`'s origin.
pub fn remap_point(p: Point2<f64>, from: &Extent, to: &Extent) -> Point2<f64> {
    let nx = (p.x - from.x_min) / from.width();
    let ny = (p.y - from.y_min) / from.height();
    let x = nx * to.width();
    let mut y = ny * to.height();
    if from.y_axis_inverted != to.y_axis_inverted {
        y = to.height() - y;
    }
    Point2::new(to.x_min + x, to.y_min + y)
}

/// Remap a token's local position, returning a clone.
///
/// The same physical token routinely needs simultaneous board-space
/// and projector/map-space representations; the input is never touched.
/// A missing extent degrades to an unchanged clone with a warning; this
/// runs every render frame and must not take the pipeline down.
pub fn remap_token(
    token: &TrackedToken,
    from: Option<&Extent>,
    to: Option<&Extent>,
) -> TrackedToken {
    let (Some(from), Some(to)) = (from, to) else {
        warn!("token remap skipped: source or target extent not yet known");
        return token.clone();
    };
    let p = remap_point(
        Point2::new(f64::from(token.local_x), f64::from(token.local_y)),
        from,
        to,
    );
    let mut out = token.clone();
    out.local_x = p.x.round() as i32;
    out.local_y = p.y.round() as i32;
    out
}

/// Remap a sub-rectangle from one extent's space into another's.
///
/// The two opposite corners are remapped and the result re-normalized,
/// since a vertical flip swaps which corner is the minimum.
pub fn remap_extent(e: &Extent, from: &Extent, to: &Extent) -> Extent {
    let a = remap_point(Point2::new(e.x_min, e.y_min), from, to);
    let b = remap_point(Point2::new(e.x_max, e.y_max), from, to);
    Extent {
        x_min: a.x.min(b.x),
        y_min: a.y.min(b.y),
        x_max: a.x.max(b.x),
        y_max: a.y.max(b.y),
        y_axis_inverted: to.y_axis_inverted,
    }
}

/// Fill in a token's world position from its board-space location.
pub fn assign_world(token: &mut TrackedToken, board: Option<&Extent>, map: Option<&Extent>) {
    let (Some(board), Some(map)) = (board, map) else {
        warn!("cannot geo-locate token: board or map extent not yet known");
        return;
    };
    let p = remap_point(
        Point2::new(f64::from(token.local_x), f64::from(token.local_y)),
        board,
        map,
    );
    token.world = Some(p);
}

/// Board-space location for a world position, rounded to pixels.
pub fn local_from_world(
    world: Point2<f64>,
    map: Option<&Extent>,
    board: Option<&Extent>,
) -> Option<(i32, i32)> {
    let (Some(map), Some(board)) = (map, board) else {
        warn!("cannot localize world position: board or map extent not yet known");
        return None;
    };
    let p = remap_point(world, map, board);
    Some((p.x.round() as i32, p.y.round() as i32))
}
