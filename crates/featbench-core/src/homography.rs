use crate::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// Projective 3×3 map `p_dst ~ H * p_src`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Build from row-major entries.
    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    /// Embed a 2×3 affine matrix as the top rows of a homography.
    pub fn from_affine(m: [[f64; 3]; 2]) -> Self {
        Self::from_array([m[0], m[1], [0.0, 0.0, 1.0]])
    }

    /// Anisotropic scale `diag(sx, sy, 1)`.
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(Matrix3::from_diagonal(&Vector3::new(sx, sy, 1.0)))
    }

    #[inline]
    pub fn apply_f64(&self, x: f64, y: f64) -> (f64, f64) {
        let v = self.h * Vector3::new(x, y, 1.0);
        (v.x / v.z, v.y / v.z)
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let (x, y) = self.apply_f64(p.x as f64, p.y as f64);
        Point2::new(x as f32, y as f32)
    }

    /// Map a point set.
    pub fn apply_all(&self, pts: &[Point2<f32>]) -> Vec<Point2<f32>> {
        pts.iter().map(|&p| self.apply(p)).collect()
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// Rescale so that `h[2][2] == 1`. `None` when that entry vanishes.
    pub fn normalized(&self) -> Option<Self> {
        scale_to_unit_corner(self.h).map(Self::new)
    }

    /// Largest absolute entry of `self - I`.
    pub fn max_abs_deviation_from_identity(&self) -> f64 {
        (self.h - Matrix3::identity()).amax()
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

/// `a * b` applies `b` first, then `a`.
impl Mul for Homography {
    type Output = Homography;

    fn mul(self, rhs: Homography) -> Homography {
        Homography::new(self.h * rhs.h)
    }
}

fn scale_to_unit_corner(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let w = h[(2, 2)];
    (w.abs() >= 1e-12).then(|| h / w)
}

/// Similarity moving a point set to its centroid with mean radius √2.
struct Conditioner {
    t: Matrix3<f64>,
}

impl Conditioner {
    fn fit(pts: &[Point2<f32>]) -> Self {
        let n = pts.len().max(1) as f64;
        let (cx, cy) = pts.iter().fold((0.0, 0.0), |(x, y), p| {
            (x + p.x as f64 / n, y + p.y as f64 / n)
        });
        let radius = pts
            .iter()
            .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
            .sum::<f64>()
            / n;
        let s = if radius > 1e-12 {
            std::f64::consts::SQRT_2 / radius
        } else {
            1.0
        };
        Self {
            t: Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0),
        }
    }

    fn map(&self, p: &Point2<f32>) -> (f64, f64) {
        let v = self.t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        (v.x, v.y)
    }

    /// Undo the conditioning of both sides: `T_dst⁻¹ · H · T_src`.
    fn restore(src: &Self, dst: &Self, h: Matrix3<f64>) -> Option<Homography> {
        let h = dst.t.try_inverse()? * h * src.t;
        if h.iter().any(|v| !v.is_finite()) {
            return None;
        }
        scale_to_unit_corner(h).map(Homography::new)
    }
}

/// Least-squares DLT estimate of H such that `dst ~ H * src`.
///
/// Needs at least 4 correspondences; exactly 4 goes through the
/// closed-form [`homography_from_4pt`]. For more, the coordinates are
/// conditioned and H is the eigenvector of `AᵀA` with the smallest
/// eigenvalue.
pub fn estimate_homography(src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }
    if let (Ok(s), Ok(d)) = (
        <&[Point2<f32>; 4]>::try_from(src),
        <&[Point2<f32>; 4]>::try_from(dst),
    ) {
        return homography_from_4pt(s, d);
    }

    let cs = Conditioner::fit(src);
    let cd = Conditioner::fit(dst);

    let mut ata = SMatrix::<f64, 9, 9>::zeros();
    for (s, d) in src.iter().zip(dst) {
        let (x, y) = cs.map(s);
        let (u, v) = cd.map(d);
        let rx = SVector::<f64, 9>::from([x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, -u]);
        let ry = SVector::<f64, 9>::from([0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, -v]);
        ata += rx * rx.transpose() + ry * ry.transpose();
    }

    let eig = ata.symmetric_eigen();
    let null = eig.eigenvectors.column(eig.eigenvalues.imin());
    let hn = Matrix3::from_fn(|r, c| null[3 * r + c]);
    Conditioner::restore(&cs, &cd, hn)
}

/// Projective map of the unit square corners `(0,0) (1,0) (1,1) (0,1)`
/// onto `q` in that order.
fn square_to_quad(q: &[(f64, f64); 4]) -> Option<Matrix3<f64>> {
    let [(x0, y0), (x1, y1), (x2, y2), (x3, y3)] = *q;
    let sx = x0 - x1 + x2 - x3;
    let sy = y0 - y1 + y2 - y3;

    let (g, h) = if sx.abs() < 1e-12 && sy.abs() < 1e-12 {
        (0.0, 0.0)
    } else {
        let (dx1, dx2) = (x1 - x2, x3 - x2);
        let (dy1, dy2) = (y1 - y2, y3 - y2);
        let den = dx1 * dy2 - dx2 * dy1;
        if den.abs() < 1e-12 {
            return None;
        }
        ((sx * dy2 - dx2 * sy) / den, (dx1 * sy - sx * dy1) / den)
    };

    let m = Matrix3::new(
        x1 - x0 + g * x1,
        x3 - x0 + h * x3,
        x0,
        y1 - y0 + g * y1,
        y3 - y0 + h * y3,
        y0,
        g,
        h,
        1.0,
    );
    (m.determinant().abs() > 1e-12).then_some(m)
}

/// Compute H such that `dst ~ H * src` from exactly 4 correspondences.
///
/// Both quads are mapped from the unit square and chained. Returns `None`
/// when three points of either quad are collinear.
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    let cs = Conditioner::fit(src);
    let cd = Conditioner::fit(dst);
    let from_square_src = square_to_quad(&src.each_ref().map(|p| cs.map(p)))?;
    let from_square_dst = square_to_quad(&dst.each_ref().map(|p| cd.map(p)))?;
    let hn = from_square_dst * from_square_src.try_inverse()?;
    Conditioner::restore(&cs, &cd, hn)
}

/// Warp `src` by `h_dst_from_src` into an `out_w × out_h` image.
///
/// Every destination pixel is pulled from `H⁻¹ · p` with bilinear
/// sampling; pixels mapping outside the source stay black. A singular
/// homography yields a black image.
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_dst_from_src: Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let mut out = GrayImage::new(out_w, out_h);
    if out_w == 0 || out_h == 0 {
        return out;
    }
    let Some(back) = h_dst_from_src.inverse() else {
        log::warn!("warp_perspective_gray: singular homography, returning black image");
        return out;
    };

    let (w, h) = (src.width as f64, src.height as f64);
    let step = back.h.column(0).into_owned();
    for (y, row) in out.data.chunks_exact_mut(out_w).enumerate() {
        // homogeneous source position of (0, y), advanced one column at a time
        let mut p = back.h * Vector3::new(0.0, y as f64, 1.0);
        for px in row.iter_mut() {
            if p.z.abs() > f64::EPSILON {
                let (sx, sy) = (p.x / p.z, p.y / p.z);
                if sx > -1.0 && sy > -1.0 && sx < w && sy < h {
                    *px = sample_bilinear_u8(src, sx as f32, sy as f32);
                }
            }
            p += step;
        }
    }
    out
}

/// Warp by a 2×3 affine matrix mapping source to destination coordinates.
pub fn warp_affine_gray(
    src: &GrayImageView<'_>,
    m: [[f64; 3]; 2],
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    warp_perspective_gray(src, Homography::from_affine(m), out_w, out_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn skewed() -> Homography {
        Homography::from_array([
            [0.92, -0.14, 31.0],
            [0.07, 1.08, -12.0],
            [0.0007, -0.0003, 1.0],
        ])
    }

    fn assert_maps_like(a: &Homography, b: &Homography, pts: &[Point2<f32>]) {
        for &p in pts {
            let (pa, pb) = (a.apply(p), b.apply(p));
            assert!((pa - pb).norm() < 1e-3, "{p:?}: {pa:?} vs {pb:?}");
        }
    }

    #[test]
    fn composition_and_inverse() {
        let shift = Homography::from_affine([[1.0, 0.0, 5.0], [0.0, 1.0, 7.0]]);
        let double = Homography::scale(2.0, 2.0);
        let p = Point2::new(3.0_f32, -1.0);
        assert_eq!((double * shift).apply(p), Point2::new(16.0, 12.0));
        assert_eq!((shift * double).apply(p), Point2::new(11.0, 5.0));

        let h = skewed();
        let back = h.inverse().unwrap();
        for p in [Point2::new(0.0_f32, 0.0), Point2::new(240.0, 160.0)] {
            assert!((back.apply(h.apply(p)) - p).norm() < 1e-3);
        }
    }

    #[test]
    fn from_array_is_row_major() {
        let h = Homography::from_array([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_eq!(h.h[(0, 2)], 3.0);
        assert_eq!(h.h[(2, 0)], 7.0);
        assert_eq!(h.normalized().unwrap().h[(2, 2)], 1.0);
        assert!(Homography::new(Matrix3::zeros()).normalized().is_none());
    }

    #[test]
    fn unit_square_maps_onto_quad() {
        let q = [(3.0, 1.0), (7.0, 2.0), (6.0, 9.0), (-1.0, 4.0)];
        let m = Homography::new(square_to_quad(&q).unwrap());
        for ((u, v), (x, y)) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)].iter().zip(q) {
            let (px, py) = m.apply_f64(*u, *v);
            assert_abs_diff_eq!(px, x, epsilon = 1e-9);
            assert_abs_diff_eq!(py, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn four_points_recover_the_homography() {
        let gt = skewed();
        let src = [
            Point2::new(10.0_f32, 12.0),
            Point2::new(210.0, 5.0),
            Point2::new(190.0, 170.0),
            Point2::new(-4.0, 150.0),
        ];
        let dst = src.map(|p| gt.apply(p));
        let fitted = homography_from_4pt(&src, &dst).unwrap();
        assert_maps_like(&fitted, &gt, &[Point2::new(100.0, 80.0), Point2::new(0.0, 0.0)]);
    }

    #[test]
    fn collinear_sample_is_rejected() {
        let src = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 20.0),
            Point2::new(0.0, 30.0),
        ];
        assert!(homography_from_4pt(&src, &src).is_none());
    }

    #[test]
    fn least_squares_fit_with_many_points() {
        let gt = skewed();
        let src: Vec<Point2<f32>> = (0..20)
            .map(|i| Point2::new((i % 5) as f32 * 45.0, (i / 5) as f32 * 38.0 + (i % 2) as f32))
            .collect();
        let dst = gt.apply_all(&src);
        let fitted = estimate_homography(&src, &dst).unwrap();
        assert_maps_like(&fitted, &gt, &[Point2::new(60.0, 90.0), Point2::new(170.0, 10.0)]);
        assert!(estimate_homography(&src[..3], &dst[..3]).is_none());
        assert!(estimate_homography(&src, &dst[..8]).is_none());
    }

    #[test]
    fn identity_warp_is_lossless() {
        let img = GrayImage::from_fn(9, 6, |x, y| (x * 23 + y * 11) as u8);
        let out = warp_perspective_gray(&img.view(), Homography::identity(), 9, 6);
        assert_eq!(out, img);
    }

    #[test]
    fn translation_warp_moves_content() {
        let img = GrayImage::from_fn(6, 4, |x, y| (1 + x + 10 * y) as u8);
        let out = warp_affine_gray(&img.view(), [[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]], 6, 4);
        assert_eq!(out.get(2, 1), img.get(0, 0));
        assert_eq!(out.get(5, 3), img.get(3, 2));
        assert_eq!(out.get(0, 0), Some(0));
        let black = warp_affine_gray(&img.view(), [[0.0; 3]; 2], 6, 4);
        assert!(black.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn deviation_from_identity_uses_max_entry() {
        let h = Homography::from_array([[1.0, 0.25, 0.0], [0.0, 0.9, 0.0], [0.0, 0.0, 1.0]]);
        assert!((h.max_abs_deviation_from_identity() - 0.25).abs() < 1e-12);
    }
}
