use std::time::{Duration, Instant};

use featbench_core::{Features, GrayImageView, Match};

/// A detector/descriptor/matcher triple under evaluation.
///
/// Implementations must be shareable across threads: the estimation loop
/// calls them concurrently for different sweep arguments.
pub trait FeatureAlgorithm: Send + Sync {
    type Descriptor: Send + Sync;

    /// Label recorded in every statistics record.
    fn name(&self) -> &str;

    /// Detect keypoints and describe them. An empty result means nothing
    /// was found.
    fn extract_features(&self, image: &GrayImageView<'_>) -> Features<Self::Descriptor>;

    /// [`Self::extract_features`] together with its wall-clock duration.
    fn extract_features_timed(
        &self,
        image: &GrayImageView<'_>,
    ) -> (Features<Self::Descriptor>, Duration) {
        let start = Instant::now();
        let features = self.extract_features(image);
        (features, start.elapsed())
    }

    /// Match `query` descriptors against `train` descriptors.
    ///
    /// `Match::query_idx` indexes `query`, `Match::train_idx` indexes `train`.
    fn match_features(
        &self,
        train: &[Self::Descriptor],
        query: &[Self::Descriptor],
    ) -> Vec<Match>;
}
