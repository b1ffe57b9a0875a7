use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

use crate::frame::{sample_bilinear_u8, Frame, FrameView};

/// Projective mapping between the canonical board plane and the camera
/// image, estimated once per calibration from the four board corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(f64::from(p.x), f64::from(p.y), 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

// Hartley conditioning: center on the centroid and scale so the mean
// distance is sqrt(2), which keeps the 8x8 solve well-behaved for
// pixel-magnitude inputs.
fn conditioning_transform(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let mut cx = 0.0_f64;
    let mut cy = 0.0_f64;
    for p in pts {
        cx += f64::from(p.x);
        cy += f64::from(p.y);
    }
    cx /= 4.0;
    cy /= 4.0;

    let mut mean_dist = 0.0_f64;
    for p in pts {
        let dx = f64::from(p.x) - cx;
        let dy = f64::from(p.y) - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= 4.0;

    let s = if mean_dist > 1e-12 {
        2.0_f64.sqrt() / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let mut out = [Point2::new(0.0_f64, 0.0_f64); 4];
    for (o, p) in out.iter_mut().zip(pts) {
        let v = t * Vector3::new(f64::from(p.x), f64::from(p.y), 1.0);
        *o = Point2::new(v[0], v[1]);
    }
    (out, t)
}

/// Compute H such that `dst ~ H * src` from four correspondences.
/// Corner order must be consistent between the two sets. Returns `None`
/// for degenerate configurations (three collinear corners).
pub fn homography_from_corners(
    src: &[Point2<f32>; 4],
    dst: &[Point2<f32>; 4],
) -> Option<Homography> {
    let (src_n, t_src) = conditioning_transform(src);
    let (dst_n, t_dst) = conditioning_transform(dst);

    // Unknowns [h11 h12 h13 h21 h22 h23 h31 h32] with h33 = 1; each
    // correspondence (x,y) -> (u,v) contributes two rows.
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0);

    let h = t_dst.try_inverse()? * hn * t_src;
    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 {
        return None;
    }
    Some(Homography::new(h / scale))
}

/// Warp a frame onto the canonical plane: each output pixel is mapped
/// through `h_img_from_plane` and bilinearly sampled from the source.
pub fn warp_gray(
    src: &FrameView<'_>,
    h_img_from_plane: Homography,
    out_w: usize,
    out_h: usize,
) -> Frame {
    let mut out = vec![0u8; out_w * out_h];

    for y in 0..out_h {
        for x in 0..out_w {
            let p = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
            let q = h_img_from_plane.apply(p);
            out[y * out_w + x] = sample_bilinear_u8(src, q.x, q.y);
        }
    }

    Frame {
        width: out_w,
        height: out_h,
        data: out,
    }
}
