//! Robust homography fitting.
//!
//! Minimal 4-point samples are scored by squared reprojection error; the
//! best consensus set is refit with the least-squares DLT.

use crate::homography::{estimate_homography, homography_from_4pt, Homography};
use nalgebra::Point2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const SAMPLE_SIZE: usize = 4;

/// Parameters for [`fit_homography_ransac`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Maximum reprojection distance (pixels) for a correspondence to count as inlier.
    pub reprojection_threshold: f64,
    /// Hard cap on hypothesis count.
    pub max_iterations: usize,
    /// Desired probability of drawing at least one all-inlier sample.
    pub confidence: f64,
    /// Seed of the sampling RNG; fits are reproducible for a fixed seed.
    pub seed: u64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            reprojection_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            seed: 0,
        }
    }
}

/// Why a homography could not be fitted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    #[error("point sets differ in length ({src} vs {dst})")]
    LengthMismatch { src: usize, dst: usize },
    #[error("at least {SAMPLE_SIZE} correspondences required, got {0}")]
    TooFewPoints(usize),
    #[error("no non-degenerate minimal sample found")]
    NoModel,
    #[error("best model has only {0} inliers")]
    TooFewInliers(usize),
}

/// A fitted homography and its inlier mask (one flag per correspondence).
#[derive(Clone, Debug)]
pub struct HomographyFit {
    pub homography: Homography,
    pub inliers: Vec<bool>,
}

impl HomographyFit {
    pub fn inlier_count(&self) -> usize {
        self.inliers.iter().filter(|&&b| b).count()
    }
}

fn inlier_mask(
    h: &Homography,
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    threshold_sq: f64,
) -> (Vec<bool>, usize) {
    let mut count = 0;
    let mask = src
        .iter()
        .zip(dst)
        .map(|(s, d)| {
            let (x, y) = h.apply_f64(s.x as f64, s.y as f64);
            let dx = x - d.x as f64;
            let dy = y - d.y as f64;
            let ok = dx * dx + dy * dy <= threshold_sq;
            count += ok as usize;
            ok
        })
        .collect();
    (mask, count)
}

fn required_iterations(inlier_ratio: f64, confidence: f64, cap: usize) -> usize {
    if inlier_ratio >= 1.0 {
        return 1;
    }
    let all_inliers = inlier_ratio.powi(SAMPLE_SIZE as i32);
    if all_inliers <= f64::EPSILON {
        return cap;
    }
    let k = (1.0 - confidence).ln() / (1.0 - all_inliers).ln();
    if !k.is_finite() || k < 0.0 {
        return cap;
    }
    (k.ceil() as usize).clamp(1, cap)
}

/// Fit `dst ~ H * src` robustly.
pub fn fit_homography_ransac(
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    params: &RansacParams,
) -> Result<HomographyFit, FitError> {
    if src.len() != dst.len() {
        return Err(FitError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < SAMPLE_SIZE {
        return Err(FitError::TooFewPoints(n));
    }

    let threshold_sq = params.reprojection_threshold * params.reprojection_threshold;
    let cap = params.max_iterations.max(1);
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    let mut best: Option<(Homography, Vec<bool>, usize)> = None;
    let mut limit = cap;
    let mut iter = 0;
    while iter < limit {
        iter += 1;
        let idx = rand::seq::index::sample(&mut rng, n, SAMPLE_SIZE);
        let s = [
            src[idx.index(0)],
            src[idx.index(1)],
            src[idx.index(2)],
            src[idx.index(3)],
        ];
        let d = [
            dst[idx.index(0)],
            dst[idx.index(1)],
            dst[idx.index(2)],
            dst[idx.index(3)],
        ];
        let Some(h) = homography_from_4pt(&s, &d) else {
            continue;
        };

        let (mask, count) = inlier_mask(&h, src, dst, threshold_sq);
        if best.as_ref().is_none_or(|(_, _, c)| count > *c) {
            limit = required_iterations(count as f64 / n as f64, params.confidence, cap);
            best = Some((h, mask, count));
        }
    }

    let (h, mask, count) = best.ok_or(FitError::NoModel)?;
    if count < SAMPLE_SIZE {
        return Err(FitError::TooFewInliers(count));
    }

    let (in_src, in_dst): (Vec<_>, Vec<_>) = src
        .iter()
        .zip(dst)
        .zip(&mask)
        .filter(|(_, &keep)| keep)
        .map(|((s, d), _)| (*s, *d))
        .unzip();

    if let Some(refined) = estimate_homography(&in_src, &in_dst) {
        let (refined_mask, refined_count) = inlier_mask(&refined, src, dst, threshold_sq);
        if refined_count >= count {
            log::debug!("ransac: refit kept {refined_count}/{n} inliers after {iter} iterations");
            return Ok(HomographyFit {
                homography: refined,
                inliers: refined_mask,
            });
        }
    }

    log::debug!("ransac: {count}/{n} inliers after {iter} iterations");
    Ok(HomographyFit {
        homography: h,
        inliers: mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    fn grid() -> Vec<Point2<f32>> {
        (0..6)
            .flat_map(|y| {
                (0..6).map(move |x| Point2::new(20.0 + x as f32 * 30.0, 15.0 + y as f32 * 25.0))
            })
            .collect()
    }

    #[test]
    fn recovers_homography_with_outliers() {
        let gt = Homography::new(Matrix3::new(
            0.95, 0.08, 14.0, //
            -0.06, 1.05, -7.0, //
            0.0002, -0.0001, 1.0,
        ));
        let src = grid();
        let mut dst = gt.apply_all(&src);
        for (k, i) in [3usize, 11, 19, 27, 30].iter().enumerate() {
            dst[*i].x += 40.0 + 13.0 * k as f32;
            dst[*i].y -= 25.0;
        }

        let fit = fit_homography_ransac(&src, &dst, &RansacParams::default()).expect("fit");
        assert_eq!(fit.inlier_count(), src.len() - 5);
        assert!(!fit.inliers[3] && !fit.inliers[30]);
        for p in [Point2::new(0.0_f32, 0.0), Point2::new(100.0, 80.0)] {
            let a = fit.homography.apply(p);
            let b = gt.apply(p);
            assert!((a - b).norm() < 1e-2, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn too_few_points_is_an_error() {
        let pts = [Point2::new(0.0_f32, 0.0); 3];
        assert_eq!(
            fit_homography_ransac(&pts, &pts, &RansacParams::default()).unwrap_err(),
            FitError::TooFewPoints(3)
        );
    }

    #[test]
    fn mismatched_lengths_are_an_error() {
        let a = grid();
        let b = &a[..10];
        assert!(matches!(
            fit_homography_ransac(&a, b, &RansacParams::default()),
            Err(FitError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn iteration_count_shrinks_with_inlier_ratio() {
        assert_eq!(required_iterations(1.0, 0.99, 500), 1);
        let few = required_iterations(0.9, 0.99, 500);
        let many = required_iterations(0.3, 0.99, 500);
        assert!(few < many, "{few} vs {many}");
        assert_eq!(required_iterations(0.0, 0.99, 500), 500);
    }
}
