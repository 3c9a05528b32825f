use crate::transform::argument_index;
use crate::{ImageTransform, TransformError};
use featbench_core::{warp_perspective_gray, GrayImage, GrayImageView, Homography};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Jitter bounds for each entry of a random homography, row-major.
const ENTRY_BOUNDS: [[(f64, f64); 3]; 3] = [
    [(0.8, 1.2), (-0.1, 0.1), (-0.1, 0.1)],
    [(-0.1, 0.1), (0.8, 1.2), (-0.1, 0.1)],
    [(-1e-4, 1e-4), (-1e-4, 1e-4), (0.8, 1.2)],
];

/// A fixed bank of random homographies indexed by the argument.
///
/// The bank is drawn once from `seed` at construction. The translation
/// entries are stored as fractions of the image size and scaled by the
/// image width and height when used.
#[derive(Clone, Debug)]
pub struct PerspectiveTransform {
    homographies: Vec<Homography>,
    args: Vec<f32>,
}

impl PerspectiveTransform {
    pub const NAME: &'static str = "Perspective";

    pub fn new(count: usize, seed: u64) -> Result<Self, TransformError> {
        if count == 0 {
            return Err(TransformError::NoHomographies);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let homographies = (0..count)
            .map(|_| {
                let mut rows = [[0.0f64; 3]; 3];
                for (r, bounds) in rows.iter_mut().zip(ENTRY_BOUNDS.iter()) {
                    for (v, &(lo, hi)) in r.iter_mut().zip(bounds.iter()) {
                        *v = rng.random_range(lo..=hi);
                    }
                }
                Homography::from_array(rows)
            })
            .collect();
        Ok(Self {
            homographies,
            args: (0..count).map(|i| i as f32).collect(),
        })
    }

    /// The unscaled bank, in argument order.
    pub fn homographies(&self) -> &[Homography] {
        &self.homographies
    }
}

impl ImageTransform for PerspectiveTransform {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn arguments(&self) -> &[f32] {
        &self.args
    }

    fn transform_image(
        &self,
        t: f32,
        source: &GrayImageView<'_>,
    ) -> Result<GrayImage, TransformError> {
        let h = self.homography(t, source)?;
        Ok(warp_perspective_gray(source, h, source.width, source.height))
    }

    fn homography(&self, t: f32, source: &GrayImageView<'_>) -> Result<Homography, TransformError> {
        let idx = argument_index(Self::NAME, t, self.homographies.len())?;
        let mut h = self.homographies[idx];
        h.h[(0, 2)] *= source.width as f64;
        h.h[(1, 2)] *= source.height as f64;
        Ok(h)
    }
}
