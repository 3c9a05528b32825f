//! The sweep-evaluation loop.

use featbench_core::{
    ColorImage, Features, GrayImage, Homography, ImageError, Keypoint, Match, Point2,
    RansacParams, SUPPORTED_CHANNELS,
};
use featbench_transform::{ImageTransform, TransformError};
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    find_homography, homography_error, match_distance_statistics, ratio_or_nan,
    reprojection_error, FeatureAlgorithm, FrameMatchingStatistics, HomographyStatistics,
};

/// Default distance (pixels) under which a match counts as correct.
pub const DEFAULT_CORRECT_MATCH_THRESHOLD: f32 = 3.0;

/// Tunables of [`perform_estimation`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationParams {
    /// A match is correct when the detected position lies closer than this
    /// to the ground-truth position of its source keypoint.
    pub correct_match_threshold: f32,
    /// Fit a homography to every frame's matches and score it against the
    /// ground truth.
    pub score_homography: bool,
    pub ransac: RansacParams,
}

impl Default for EstimationParams {
    fn default() -> Self {
        Self {
            correct_match_threshold: DEFAULT_CORRECT_MATCH_THRESHOLD,
            score_homography: false,
            ransac: RansacParams::default(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EstimationError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("`{algorithm}` found no features on the source image")]
    NoSourceFeatures { algorithm: String },
    #[error("`{algorithm}` returned {descriptors} descriptors for {keypoints} keypoints")]
    DescriptorCountMismatch {
        algorithm: String,
        keypoints: usize,
        descriptors: usize,
    },
    #[error(
        "match (query {query_idx}, train {train_idx}) is out of range for {query_len} query / {train_len} train keypoints"
    )]
    MatchIndexOutOfRange {
        query_idx: usize,
        train_idx: usize,
        query_len: usize,
        train_len: usize,
    },
}

/// `true` when `p` lies strictly inside a `width × height` frame.
#[inline]
pub fn is_visible(p: &Point2<f32>, width: usize, height: usize) -> bool {
    p.x > 0.0 && p.y > 0.0 && p.x < width as f32 && p.y < height as f32
}

/// Count matches whose detected query position lies within `threshold` of
/// the projected position of their train keypoint.
pub fn count_correct_matches(
    projected_train: &[Point2<f32>],
    query: &[Keypoint],
    matches: &[Match],
    threshold: f32,
) -> Result<usize, EstimationError> {
    let mut correct = 0;
    for m in matches {
        let expected = projected_train.get(m.train_idx);
        let actual = query.get(m.query_idx);
        let (Some(expected), Some(actual)) = (expected, actual) else {
            return Err(EstimationError::MatchIndexOutOfRange {
                query_idx: m.query_idx,
                train_idx: m.train_idx,
                query_len: query.len(),
                train_len: projected_train.len(),
            });
        };
        if (actual.position - *expected).norm() < threshold {
            correct += 1;
        }
    }
    Ok(correct)
}

/// Count distinct train keypoints that project inside the frame and have at
/// least one correct match. Matches with dangling indices are ignored.
pub fn count_recalled_keypoints(
    projected_train: &[Point2<f32>],
    query: &[Keypoint],
    matches: &[Match],
    threshold: f32,
    width: usize,
    height: usize,
) -> usize {
    let mut recalled = vec![false; projected_train.len()];
    for m in matches {
        let (Some(expected), Some(actual)) =
            (projected_train.get(m.train_idx), query.get(m.query_idx))
        else {
            continue;
        };
        if is_visible(expected, width, height) && (actual.position - *expected).norm() < threshold
        {
            recalled[m.train_idx] = true;
        }
    }
    recalled.into_iter().filter(|&r| r).count()
}

fn check_consistent<A: FeatureAlgorithm + ?Sized>(
    alg: &A,
    features: &Features<A::Descriptor>,
) -> Result<(), EstimationError> {
    if features.is_consistent() {
        return Ok(());
    }
    Err(EstimationError::DescriptorCountMismatch {
        algorithm: alg.name().to_string(),
        keypoints: features.keypoints.len(),
        descriptors: features.descriptors.len(),
    })
}

/// Shared read-only inputs of every frame evaluation.
struct SweepContext<'a, A: FeatureAlgorithm + ?Sized> {
    alg: &'a A,
    transform: &'a dyn ImageTransform,
    gray: &'a GrayImage,
    source: &'a Features<A::Descriptor>,
    params: &'a EstimationParams,
}

impl<A: FeatureAlgorithm + ?Sized> SweepContext<'_, A> {
    fn evaluate(&self, t: f32) -> Result<FrameMatchingStatistics, EstimationError> {
        let view = self.gray.view();
        let frame = self.transform.transform_image(t, &view)?;
        let expected = self.transform.homography(t, &view)?;

        let (features, elapsed) = self.alg.extract_features_timed(&frame.view());

        let mut stat =
            FrameMatchingStatistics::invalid(self.alg.name(), self.transform.name(), t);
        stat.consumed_time_ms = elapsed.as_secs_f64() * 1000.0;
        if let Err(err) = check_consistent(self.alg, &features) {
            log::warn!("{}({t}): {err}", self.transform.name());
            return Ok(stat);
        }
        if features.is_empty() {
            log::warn!(
                "{} on {}({t}): no keypoints on the distorted frame",
                self.alg.name(),
                self.transform.name()
            );
            return Ok(stat);
        }

        let matches = self
            .alg
            .match_features(&self.source.descriptors, &features.descriptors);
        let projected = expected.apply_all(&self.source.positions());
        let visible = projected
            .iter()
            .filter(|p| is_visible(p, frame.width, frame.height))
            .count();
        let threshold = self.params.correct_match_threshold;
        let correct =
            match count_correct_matches(&projected, &features.keypoints, &matches, threshold) {
                Ok(correct) => correct,
                Err(err) => {
                    log::warn!("{}({t}): {err}", self.transform.name());
                    return Ok(stat);
                }
            };
        let recalled = count_recalled_keypoints(
            &projected,
            &features.keypoints,
            &matches,
            threshold,
            frame.width,
            frame.height,
        );

        stat.is_valid = true;
        stat.total_keypoints = features.len();
        stat.visible_keypoints = visible;
        stat.matches = matches.len();
        stat.correct_matches = correct;
        stat.precision = ratio_or_nan(correct, matches.len());
        stat.recall = ratio_or_nan(recalled, visible);
        if self.params.score_homography {
            stat.homography = self.score_homography(t, &expected, &features.keypoints, &matches);
        }

        log::debug!(
            "{}({t}): {} keypoints, {visible} visible, {correct}/{} correct, {:.2} ms",
            self.transform.name(),
            stat.total_keypoints,
            stat.matches,
            stat.consumed_time_ms
        );
        Ok(stat)
    }

    fn score_homography(
        &self,
        t: f32,
        expected: &Homography,
        query: &[Keypoint],
        matches: &[Match],
    ) -> Option<HomographyStatistics> {
        let fit = match find_homography(
            &self.source.keypoints,
            query,
            matches,
            &self.params.ransac,
        ) {
            Ok(fit) => fit,
            Err(err) => {
                log::warn!("{}({t}): no homography: {err}", self.transform.name());
                return None;
            }
        };
        let distance = match_distance_statistics(&fit.inliers)?;
        Some(HomographyStatistics {
            homography_error: homography_error(expected, &fit.homography),
            inliers: fit.inliers.len(),
            distance,
            reprojection_error: reprojection_error(
                &self.source.keypoints,
                query,
                &fit.inliers,
                &fit.homography,
            )
            .unwrap_or_default(),
        })
    }
}

/// Evaluate `alg` on every argument of `transform` applied to `image`.
///
/// The image is converted to gray first; only 1, 3 and 4 channel inputs
/// are accepted. Source features are extracted once. The result holds one
/// record per argument, in sweep order.
///
/// Precision is `correct / matches`. Recall is the share of visible source
/// keypoints with at least one correct match, so it never exceeds 1.
///
/// Fails when the source image yields no features or inconsistent ones.
/// Frames without keypoints, with a descriptor count mismatch or with
/// dangling match indices produce records with `is_valid == false`.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip_all,
        fields(algorithm = alg.name(), transformation = transform.name())
    )
)]
pub fn perform_estimation<A: FeatureAlgorithm + ?Sized>(
    alg: &A,
    transform: &dyn ImageTransform,
    image: &ColorImage,
    params: &EstimationParams,
) -> Result<Vec<FrameMatchingStatistics>, EstimationError> {
    if !SUPPORTED_CHANNELS.contains(&image.channels) {
        return Err(ImageError::UnsupportedChannels(image.channels).into());
    }
    let gray = image.to_gray()?;

    let source = alg.extract_features(&gray.view());
    check_consistent(alg, &source)?;
    if source.is_empty() {
        return Err(EstimationError::NoSourceFeatures {
            algorithm: alg.name().to_string(),
        });
    }

    let ctx = SweepContext {
        alg,
        transform,
        gray: &gray,
        source: &source,
        params,
    };
    let args = transform.arguments();

    #[cfg(feature = "rayon")]
    let frames: Result<Vec<_>, _> = args.par_iter().map(|&t| ctx.evaluate(t)).collect();
    #[cfg(not(feature = "rayon"))]
    let frames: Result<Vec<_>, _> = args.iter().map(|&t| ctx.evaluate(t)).collect();
    let frames = frames?;

    let valid = frames.iter().filter(|s| s.is_valid).count();
    log::info!(
        "{} on {}: {} source keypoints, {valid}/{} frames valid",
        alg.name(),
        transform.name(),
        source.len(),
        frames.len()
    );
    Ok(frames)
}
