use featbench_core::{GrayImage, GrayImageView, Homography, Keypoint};
use std::fmt::Debug;

/// Errors raised while building or evaluating a transformation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("sweep step must be positive and finite, got {0}")]
    InvalidStep(f32),
    #[error("sweep bounds must be finite (start={start}, end={end})")]
    InvalidRange { start: f32, end: f32 },
    #[error("empty sweep: start {start} lies past end {end}")]
    EmptySweep { start: f32, end: f32 },
    #[error("scale factors must be positive, got {0}")]
    InvalidScale(f32),
    #[error("maximum kernel size must be at least 1, got {0}")]
    InvalidKernelSize(usize),
    #[error("perspective transform needs at least one homography")]
    NoHomographies,
    #[error("argument {argument} of `{name}` is not an index below {len}")]
    ArgumentOutOfRange {
        name: String,
        argument: f32,
        len: usize,
    },
    #[error("combining `{first}` and `{second}` yields no parameter pairs")]
    EmptyCombination { first: String, second: String },
}

/// A parameterized image distortion with known ground truth.
///
/// Implementations fix their parameter sweep at construction; every method
/// is a pure function of the argument and its input.
pub trait ImageTransform: Debug + Send + Sync {
    /// Stable identifier used in reports and combined names (`"A+B"`).
    fn name(&self) -> &str;

    /// The finite, ordered parameter sweep.
    fn arguments(&self) -> &[f32];

    /// Distort `source` at argument `t`.
    fn transform_image(
        &self,
        t: f32,
        source: &GrayImageView<'_>,
    ) -> Result<GrayImage, TransformError>;

    /// Remap keypoints directly, without going through a homography.
    ///
    /// The default leaves them untouched.
    fn transform_keypoints(
        &self,
        _t: f32,
        source: &[Keypoint],
    ) -> Result<Vec<Keypoint>, TransformError> {
        Ok(source.to_vec())
    }

    /// Ground-truth map from `source` coordinates into the distorted image.
    ///
    /// Photometric distortions keep the identity.
    fn homography(&self, _t: f32, _source: &GrayImageView<'_>) -> Result<Homography, TransformError> {
        Ok(Homography::identity())
    }

    /// `true` when the ground truth composes by multiplying homographies
    /// computed on the original image; `false` when a composition must warp
    /// through the intermediate image first.
    fn multiply_homography(&self) -> bool {
        false
    }
}

/// Resolve an index-valued argument against a table of `len` entries.
pub(crate) fn argument_index(name: &str, t: f32, len: usize) -> Result<usize, TransformError> {
    if t.is_finite() && t >= 0.0 && (t as usize) < len {
        return Ok(t as usize);
    }
    Err(TransformError::ArgumentOutOfRange {
        name: name.to_string(),
        argument: t,
        len,
    })
}
