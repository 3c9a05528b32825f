//! Scoring feature detectors and matchers against known distortions.
//!
//! [`perform_estimation`] runs a [`FeatureAlgorithm`] over every argument of
//! an [`ImageTransform`](featbench_transform::ImageTransform) and reports
//! precision and recall per frame: source keypoints are mapped through the
//! ground-truth homography and a match counts as correct when the detected
//! position lies within a few pixels of the mapped one.
//!
//! ```
//! use featbench_core::{ColorImage, GrayImage};
//! use featbench_eval::{perform_estimation, EstimationParams, FastBrief};
//! use featbench_transform::{RotationTransform, SweepRange};
//!
//! let img = GrayImage::from_fn(96, 96, |x, y| {
//!     if (30..60).contains(&x) && (30..60).contains(&y) { 220 } else { 10 }
//! });
//! let rotation = RotationTransform::centered(SweepRange::single(0.0)).unwrap();
//! let stats = perform_estimation(
//!     &FastBrief::default(),
//!     &rotation,
//!     &ColorImage::from(img),
//!     &EstimationParams::default(),
//! )
//! .unwrap();
//! assert_eq!(stats.len(), 1);
//! assert!(stats[0].is_valid);
//! ```

mod algorithm;
mod estimation;
mod fast_brief;
mod geometry;
mod matching;
mod records;
mod sink;

pub use algorithm::FeatureAlgorithm;
pub use estimation::{
    count_correct_matches, count_recalled_keypoints, is_visible, perform_estimation,
    EstimationError, EstimationParams, DEFAULT_CORRECT_MATCH_THRESHOLD,
};
pub use fast_brief::{BriefDescriptor, FastBrief, FastBriefParams};
pub use geometry::{find_homography, homography_error, reprojection_error, MatchHomography};
pub use matching::{
    hamming_distance, knn_match_hamming, match_distance_statistics, match_hamming, ratio_test,
};
pub use records::{ratio_or_nan, FrameMatchingStatistics, HomographyStatistics, ReprojectionError};
pub use sink::{CollectedStatistics, ReportError, RunSummary, StatisticsSink};
