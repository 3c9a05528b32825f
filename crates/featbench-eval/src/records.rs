//! Per-frame statistics records.

use featbench_core::MeanStdDev;
use serde::{Deserialize, Serialize};

/// Reprojection distances of an inlier set, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReprojectionError {
    pub mean: f32,
    pub std_dev: f32,
    pub max: f32,
    pub min: f32,
}

/// Quality of a homography fitted to the matches of one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HomographyStatistics {
    /// `min(max |I − H_expected · H_fit⁻¹|, 1)`.
    pub homography_error: f64,
    /// Number of matches consistent with the fitted homography.
    pub inliers: usize,
    /// Descriptor distance of the inlier matches.
    pub distance: MeanStdDev,
    pub reprojection_error: ReprojectionError,
}

/// Outcome of one (algorithm, transformation, argument) evaluation.
///
/// `precision` and `recall` are `NaN` when their denominator is zero and
/// serialize as JSON `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameMatchingStatistics {
    pub algorithm: String,
    pub transformation: String,
    pub argument: f32,
    /// `false` when no keypoint was found on the distorted frame; the
    /// scoring fields then keep their defaults.
    pub is_valid: bool,
    pub total_keypoints: usize,
    pub visible_keypoints: usize,
    pub matches: usize,
    pub correct_matches: usize,
    #[serde(with = "nan_as_null")]
    pub precision: f32,
    #[serde(with = "nan_as_null")]
    pub recall: f32,
    pub consumed_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homography: Option<HomographyStatistics>,
}

impl FrameMatchingStatistics {
    /// Record for a frame on which extraction found nothing.
    pub fn invalid(algorithm: &str, transformation: &str, argument: f32) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            transformation: transformation.to_string(),
            argument,
            is_valid: false,
            total_keypoints: 0,
            visible_keypoints: 0,
            matches: 0,
            correct_matches: 0,
            precision: f32::NAN,
            recall: f32::NAN,
            consumed_time_ms: 0.0,
            homography: None,
        }
    }

    /// `true` when both precision and recall are defined.
    pub fn is_scored(&self) -> bool {
        self.is_valid && self.precision.is_finite() && self.recall.is_finite()
    }
}

/// `correct / total`, `NaN` when `total == 0`.
pub fn ratio_or_nan(correct: usize, total: usize) -> f32 {
    if total == 0 {
        f32::NAN
    } else {
        correct as f32 / total as f32
    }
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f32, s: S) -> Result<S::Ok, S::Error> {
        if v.is_nan() {
            s.serialize_none()
        } else {
            s.serialize_some(v)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
        Ok(Option::<f32>::deserialize(d)?.unwrap_or(f32::NAN))
    }
}
