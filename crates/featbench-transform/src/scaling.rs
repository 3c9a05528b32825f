use crate::{ImageTransform, SweepRange, TransformError};
use featbench_core::{resize_gray, GrayImage, GrayImageView, Homography};

/// Isotropic resize by factor `t`.
///
/// The output is `round(w·t) × round(h·t)`; the ground truth is
/// `diag(t, t, 1)`.
#[derive(Clone, Debug)]
pub struct ScalingTransform {
    args: Vec<f32>,
}

impl ScalingTransform {
    pub const NAME: &'static str = "Scaling";

    pub fn new(factors: SweepRange) -> Result<Self, TransformError> {
        if factors.start <= 0.0 {
            return Err(TransformError::InvalidScale(factors.start));
        }
        Ok(Self {
            args: factors.values()?,
        })
    }
}

pub(crate) fn scaled_size(len: usize, t: f32) -> usize {
    (len as f32 * t + 0.5) as usize
}

impl ImageTransform for ScalingTransform {
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
        if !(t.is_finite() && t > 0.0) {
            return Err(TransformError::InvalidScale(t));
        }
        let w = scaled_size(source.width, t);
        let h = scaled_size(source.height, t);
        Ok(resize_gray(source, w, h))
    }

    fn homography(&self, t: f32, _source: &GrayImageView<'_>) -> Result<Homography, TransformError> {
        Ok(Homography::scale(t as f64, t as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use featbench_core::Point2;

    #[test]
    fn output_size_rounds_to_nearest() {
        let img = GrayImage::new(101, 50);
        let s = ScalingTransform::new(SweepRange::new(0.5, 2.0, 0.5)).unwrap();
        assert_eq!(s.arguments(), &[0.5, 1.0, 1.5, 2.0]);

        let half = s.transform_image(0.5, &img.view()).unwrap();
        assert_eq!((half.width, half.height), (51, 25));
        let double = s.transform_image(2.0, &img.view()).unwrap();
        assert_eq!((double.width, double.height), (202, 100));
    }

    #[test]
    fn homography_is_diagonal_scale() {
        let img = GrayImage::new(10, 10);
        let s = ScalingTransform::new(SweepRange::single(0.5)).unwrap();
        let h = s.homography(0.5, &img.view()).unwrap();
        let p = h.apply(Point2::new(8.0, 4.0));
        assert_eq!((p.x, p.y), (4.0, 2.0));
        assert!(!s.multiply_homography());
    }

    #[test]
    fn non_positive_factors_are_rejected() {
        assert_eq!(
            ScalingTransform::new(SweepRange::new(0.0, 1.0, 0.5)).unwrap_err(),
            TransformError::InvalidScale(0.0)
        );
        assert!(ScalingTransform::new(SweepRange::new(-1.0, 1.0, 0.5)).is_err());
    }
}
