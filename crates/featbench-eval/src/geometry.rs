//! Homography fitting on match sets and fit-quality measures.

use featbench_core::{
    fit_homography_ransac, mean_std_dev, FitError, Homography, Keypoint, Match, Point2,
    RansacParams,
};

use crate::ReprojectionError;

/// Minimum inlier count for a fit to be trusted.
const MIN_INLIERS: usize = 4;

/// A homography fitted from source to query keypoints and the matches
/// supporting it.
#[derive(Clone, Debug)]
pub struct MatchHomography {
    /// Maps source (train) coordinates into the query frame.
    pub homography: Homography,
    pub inliers: Vec<Match>,
}

/// Source/query point pairs referenced by `matches`.
///
/// Matches pointing past either keypoint list are skipped.
fn correspondences(
    source: &[Keypoint],
    query: &[Keypoint],
    matches: &[Match],
) -> (Vec<Match>, Vec<Point2<f32>>, Vec<Point2<f32>>) {
    let mut used = Vec::with_capacity(matches.len());
    let mut src = Vec::with_capacity(matches.len());
    let mut dst = Vec::with_capacity(matches.len());
    for m in matches {
        if let (Some(s), Some(q)) = (source.get(m.train_idx), query.get(m.query_idx)) {
            used.push(*m);
            src.push(s.position);
            dst.push(q.position);
        }
    }
    (used, src, dst)
}

/// Robustly fit the homography explaining `matches`.
///
/// Fails with fewer than four matches or when the consensus set has fewer
/// than four inliers.
pub fn find_homography(
    source: &[Keypoint],
    query: &[Keypoint],
    matches: &[Match],
    params: &RansacParams,
) -> Result<MatchHomography, FitError> {
    let (used, src, dst) = correspondences(source, query, matches);
    let fit = fit_homography_ransac(&src, &dst, params)?;
    let count = fit.inlier_count();
    if count < MIN_INLIERS {
        return Err(FitError::TooFewInliers(count));
    }
    let inliers = used
        .into_iter()
        .zip(&fit.inliers)
        .filter_map(|(m, &ok)| ok.then_some(m))
        .collect();
    Ok(MatchHomography {
        homography: fit.homography,
        inliers,
    })
}

/// Distances between source points and query points mapped back through
/// `homography⁻¹`.
///
/// `None` for an empty match set or a singular homography.
pub fn reprojection_error(
    source: &[Keypoint],
    query: &[Keypoint],
    matches: &[Match],
    homography: &Homography,
) -> Option<ReprojectionError> {
    let back = homography.inverse()?;
    let (_, src, dst) = correspondences(source, query, matches);
    let distances: Vec<f32> = src
        .iter()
        .zip(&dst)
        .map(|(s, d)| (back.apply(*d) - *s).norm())
        .collect();
    let moments = mean_std_dev(&distances)?;
    let max = distances.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let min = distances.iter().copied().fold(f32::INFINITY, f32::min);
    Some(ReprojectionError {
        mean: moments.mean,
        std_dev: moments.std_dev,
        max,
        min,
    })
}

/// Disagreement between the expected and the fitted homography, capped at 1.
///
/// The residual `H_expected · H_fit⁻¹` is scaled so its bottom-right entry
/// is 1 and compared entrywise with the identity. A singular fit scores 1.
pub fn homography_error(expected: &Homography, fitted: &Homography) -> f64 {
    let Some(inv) = fitted.inverse() else {
        return 1.0;
    };
    match (*expected * inv).normalized() {
        Some(r) => r.max_abs_deviation_from_identity().min(1.0),
        None => 1.0,
    }
}
