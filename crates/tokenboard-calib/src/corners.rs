use std::collections::HashMap;

use nalgebra::{Point2, Vector2};

use crate::marker::{CornerMarker, CornerTag};

/// Project the four true board corners from the cached fiducials.
///
/// Markers sit inset from the physical corners. Each projection walks
/// outward from the marker centroid, along the marker diagonal whose
/// per-axis sign matches the macro board diagonal, by the marker's
/// centroid-to-corner radius. Returns `None` until all four tags are
/// cached. Output order: TL, TR, BR, BL.
pub fn derive_board_corners(
    markers: &HashMap<CornerTag, CornerMarker>,
) -> Option<[Point2<f32>; 4]> {
    let tl = markers.get(&CornerTag::TopLeft)?;
    let tr = markers.get(&CornerTag::TopRight)?;
    let br = markers.get(&CornerTag::BottomRight)?;
    let bl = markers.get(&CornerTag::BottomLeft)?;

    Some([
        project(tl, outward(tl, br)),
        project(tr, outward(tr, bl)),
        project(br, outward(br, tl)),
        project(bl, outward(bl, tr)),
    ])
}

/// Direction from the opposite marker's centroid through this one,
/// i.e. the macro board diagonal pointing out of the board.
fn outward(marker: &CornerMarker, opposite: &CornerMarker) -> Vector2<f32> {
    marker.centroid() - opposite.centroid()
}

fn project(marker: &CornerMarker, toward: Vector2<f32>) -> Point2<f32> {
    let centroid = marker.centroid();
    let radius = marker.corner_radius();
    let dir = pick_diagonal(marker, toward);
    let p = centroid + dir * radius;
    // Corners may project slightly off the frame; pixel coordinates
    // stay non-negative.
    Point2::new(p.x.max(0.0), p.y.max(0.0))
}

/// Unit direction along one of the marker's two diagonals whose sign
/// matches `toward` on both axes.
fn pick_diagonal(marker: &CornerMarker, toward: Vector2<f32>) -> Vector2<f32> {
    let d1 = marker.corners[2] - marker.corners[0];
    let d2 = marker.corners[3] - marker.corners[1];
    for d in [d1, -d1, d2, -d2] {
        if d.norm_squared() > f32::EPSILON && d.x * toward.x >= 0.0 && d.y * toward.y >= 0.0 {
            return d.normalize();
        }
    }
    // Degenerate quad: fall back to the macro diagonal itself.
    if toward.norm_squared() > f32::EPSILON {
        toward.normalize()
    } else {
        Vector2::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Axis-aligned marker quad centered at (cx, cy) with half-size 10,
    /// first corner at the top-left of the quad.
    fn marker(tag: CornerTag, cx: f32, cy: f32) -> CornerMarker {
        CornerMarker {
            tag,
            corners: [
                Point2::new(cx - 10.0, cy - 10.0),
                Point2::new(cx + 10.0, cy - 10.0),
                Point2::new(cx + 10.0, cy + 10.0),
                Point2::new(cx - 10.0, cy + 10.0),
            ],
        }
    }

    fn standard_markers() -> HashMap<CornerTag, CornerMarker> {
        let mut m = HashMap::new();
        m.insert(CornerTag::TopLeft, marker(CornerTag::TopLeft, 100.0, 100.0));
        m.insert(
            CornerTag::TopRight,
            marker(CornerTag::TopRight, 500.0, 100.0),
        );
        m.insert(
            CornerTag::BottomRight,
            marker(CornerTag::BottomRight, 500.0, 400.0),
        );
        m.insert(
            CornerTag::BottomLeft,
            marker(CornerTag::BottomLeft, 100.0, 400.0),
        );
        m
    }

    #[test]
    fn incomplete_marker_set_yields_nothing() {
        let mut markers = standard_markers();
        markers.remove(&CornerTag::BottomLeft);
        assert!(derive_board_corners(&markers).is_none());
    }

    #[test]
    fn corners_project_outward_from_inset_markers() {
        let corners = derive_board_corners(&standard_markers()).expect("all four cached");
        let expected = [
            (90.0, 90.0),
            (510.0, 90.0),
            (510.0, 410.0),
            (90.0, 410.0),
        ];
        for (c, (ex, ey)) in corners.iter().zip(expected) {
            assert!(
                (c.x - ex).abs() < 0.5 && (c.y - ey).abs() < 0.5,
                "corner {c:?} expected near ({ex},{ey})"
            );
        }
    }

    #[test]
    fn projection_clamps_to_non_negative_pixels() {
        let mut markers = standard_markers();
        // A marker nearly at the frame origin projects past it.
        markers.insert(CornerTag::TopLeft, marker(CornerTag::TopLeft, 5.0, 5.0));
        let corners = derive_board_corners(&markers).expect("all four cached");
        assert!(corners[0].x >= 0.0 && corners[0].y >= 0.0);
    }
}
