use std::sync::Arc;

use crate::transform::argument_index;
use crate::{ImageTransform, TransformError};
use featbench_core::{warp_perspective_gray, GrayImage, GrayImageView, Homography, Keypoint};
use serde::{Deserialize, Serialize};

/// How two parameter axes merge into one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamCombination {
    /// Cartesian product, first axis outermost.
    #[default]
    Full,
    /// Walk the shorter axis and pick the nearest index on the longer one.
    Interpolate,
    /// Walk the longer axis and pick the truncated index on the shorter one.
    Extrapolate,
}

/// Merge two argument lists into `(t1, t2)` pairs.
///
/// With `Interpolate` the result has `min(|x1|, |x2|)` pairs and with
/// `Extrapolate` it has `max(|x1|, |x2|)`. When both lists have the same
/// length the two modes pair elements index by index.
pub fn combine_arguments(x1: &[f32], x2: &[f32], mode: ParamCombination) -> Vec<(f32, f32)> {
    let (n1, n2) = (x1.len(), x2.len());
    if n1 == 0 || n2 == 0 {
        return Vec::new();
    }
    let pick = |n: usize, num: usize, den: usize, offset: f32| -> usize {
        (((n * num) as f32 / den as f32 + offset) as usize).min(n - 1)
    };

    match mode {
        ParamCombination::Full => x1
            .iter()
            .flat_map(|&a| x2.iter().map(move |&b| (a, b)))
            .collect(),
        ParamCombination::Interpolate => {
            if n1 > n2 {
                (0..n2).map(|i2| (x1[pick(n1, i2, n2, 0.5)], x2[i2])).collect()
            } else {
                (0..n1).map(|i1| (x1[i1], x2[pick(n2, i1, n1, 0.5)])).collect()
            }
        }
        ParamCombination::Extrapolate => {
            if n1 > n2 {
                (0..n1).map(|i1| (x1[i1], x2[pick(n2, i1, n1, 0.0)])).collect()
            } else {
                (0..n2).map(|i2| (x1[pick(n1, i2, n2, 0.0)], x2[i2])).collect()
            }
        }
    }
}

/// Two transforms applied in sequence, `first` then `second`.
///
/// The argument is an index into the merged parameter list. When both
/// children compose by homography multiplication the image is warped once
/// by `H1 · H2`; otherwise `first` is applied to the pixels and `second`
/// sees the intermediate image.
#[derive(Clone, Debug)]
pub struct CombinedTransform {
    name: String,
    first: Arc<dyn ImageTransform>,
    second: Arc<dyn ImageTransform>,
    mode: ParamCombination,
    pairs: Vec<(f32, f32)>,
    args: Vec<f32>,
}

impl CombinedTransform {
    pub fn new(
        first: Arc<dyn ImageTransform>,
        second: Arc<dyn ImageTransform>,
        mode: ParamCombination,
    ) -> Result<Self, TransformError> {
        let pairs = combine_arguments(first.arguments(), second.arguments(), mode);
        if pairs.is_empty() {
            return Err(TransformError::EmptyCombination {
                first: first.name().to_string(),
                second: second.name().to_string(),
            });
        }
        log::debug!(
            "combined {} ({} args) with {} ({} args) as {:?}: {} pairs",
            first.name(),
            first.arguments().len(),
            second.name(),
            second.arguments().len(),
            mode,
            pairs.len()
        );
        Ok(Self {
            name: format!("{}+{}", first.name(), second.name()),
            args: (0..pairs.len()).map(|i| i as f32).collect(),
            first,
            second,
            mode,
            pairs,
        })
    }

    pub fn mode(&self) -> ParamCombination {
        self.mode
    }

    /// Decoded `(t1, t2)` pairs in argument order.
    pub fn pairs(&self) -> &[(f32, f32)] {
        &self.pairs
    }

    /// Decode one argument into its `(t1, t2)` pair.
    pub fn pair(&self, t: f32) -> Result<(f32, f32), TransformError> {
        let idx = argument_index(&self.name, t, self.pairs.len())?;
        Ok(self.pairs[idx])
    }
}

impl ImageTransform for CombinedTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn arguments(&self) -> &[f32] {
        &self.args
    }

    fn transform_image(
        &self,
        t: f32,
        source: &GrayImageView<'_>,
    ) -> Result<GrayImage, TransformError> {
        let (t1, t2) = self.pair(t)?;
        if self.multiply_homography() {
            let h = self.first.homography(t1, source)? * self.second.homography(t2, source)?;
            return Ok(warp_perspective_gray(source, h, source.width, source.height));
        }
        let intermediate = self.first.transform_image(t1, source)?;
        self.second.transform_image(t2, &intermediate.view())
    }

    fn transform_keypoints(
        &self,
        t: f32,
        source: &[Keypoint],
    ) -> Result<Vec<Keypoint>, TransformError> {
        let (t1, t2) = self.pair(t)?;
        let intermediate = self.first.transform_keypoints(t1, source)?;
        self.second.transform_keypoints(t2, &intermediate)
    }

    fn homography(&self, t: f32, source: &GrayImageView<'_>) -> Result<Homography, TransformError> {
        let (t1, t2) = self.pair(t)?;
        let h1 = self.first.homography(t1, source)?;
        if self.multiply_homography() {
            return Ok(h1 * self.second.homography(t2, source)?);
        }
        let intermediate = self.first.transform_image(t1, source)?;
        Ok(self.second.homography(t2, &intermediate.view())? * h1)
    }

    fn multiply_homography(&self) -> bool {
        self.first.multiply_homography() && self.second.multiply_homography()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xs(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32 * 10.0).collect()
    }

    #[test]
    fn full_is_row_major_product() {
        let pairs = combine_arguments(&xs(2), &xs(3), ParamCombination::Full);
        assert_eq!(
            pairs,
            vec![
                (0.0, 0.0),
                (0.0, 10.0),
                (0.0, 20.0),
                (10.0, 0.0),
                (10.0, 10.0),
                (10.0, 20.0)
            ]
        );
    }

    #[test]
    fn interpolate_walks_the_shorter_axis() {
        // |x1| = 5 > |x2| = 2: i1 = round(5 * i2 / 2)
        let pairs = combine_arguments(&xs(5), &xs(2), ParamCombination::Interpolate);
        assert_eq!(pairs, vec![(0.0, 0.0), (30.0, 10.0)]);

        // |x1| = 2 <= |x2| = 5: i2 = round(5 * i1 / 2)
        let pairs = combine_arguments(&xs(2), &xs(5), ParamCombination::Interpolate);
        assert_eq!(pairs, vec![(0.0, 0.0), (10.0, 30.0)]);
    }

    #[test]
    fn extrapolate_walks_the_longer_axis() {
        // |x1| = 4 > |x2| = 2: i2 = floor(2 * i1 / 4)
        let pairs = combine_arguments(&xs(4), &xs(2), ParamCombination::Extrapolate);
        assert_eq!(
            pairs,
            vec![(0.0, 0.0), (10.0, 0.0), (20.0, 10.0), (30.0, 10.0)]
        );

        let pairs = combine_arguments(&xs(2), &xs(4), ParamCombination::Extrapolate);
        assert_eq!(
            pairs,
            vec![(0.0, 0.0), (0.0, 10.0), (10.0, 20.0), (10.0, 30.0)]
        );
    }

    #[test]
    fn equal_lengths_pair_by_index() {
        for mode in [ParamCombination::Interpolate, ParamCombination::Extrapolate] {
            let pairs = combine_arguments(&xs(3), &xs(3), mode);
            assert_eq!(pairs, vec![(0.0, 0.0), (10.0, 10.0), (20.0, 20.0)]);
        }
    }

    #[test]
    fn empty_axis_combines_to_nothing() {
        assert!(combine_arguments(&[], &xs(3), ParamCombination::Full).is_empty());
        assert!(combine_arguments(&xs(3), &[], ParamCombination::Extrapolate).is_empty());
    }

    #[test]
    fn mode_names_in_json() {
        assert_eq!(
            serde_json::to_string(&ParamCombination::Extrapolate).unwrap(),
            "\"extrapolate\""
        );
        let m: ParamCombination = serde_json::from_str("\"interpolate\"").unwrap();
        assert_eq!(m, ParamCombination::Interpolate);
    }
}
