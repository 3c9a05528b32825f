//! Parameterized image distortions with ground truth.
//!
//! Every distortion implements [`ImageTransform`]: a fixed, ordered sweep of
//! scalar arguments, a pixel-space transform for each argument, and the
//! homography mapping source coordinates into the distorted image.
//! [`CombinedTransform`] chains two distortions and merges their sweeps
//! according to a [`ParamCombination`].
//!
//! ```
//! use featbench_transform::{GaussianBlurTransform, ImageTransform};
//!
//! let blur = GaussianBlurTransform::new(5).unwrap();
//! assert_eq!(blur.arguments(), &[1.0, 3.0, 5.0]);
//! ```

mod combined;
mod config;
mod perspective;
mod photometric;
mod rotation;
mod scaling;
mod sweep;
mod transform;

pub use combined::{combine_arguments, CombinedTransform, ParamCombination};
pub use config::TransformConfig;
pub use perspective::PerspectiveTransform;
pub use photometric::{BrightnessTransform, GaussianBlurTransform};
pub use rotation::{
    out_of_plane_homography, rotation_matrix_2d, OutOfPlaneRotation, RotationAxis,
    RotationTransform,
};
pub use scaling::ScalingTransform;
pub use sweep::{SweepRange, DEFAULT_SWEEP_END, DEFAULT_SWEEP_STEP};
pub use transform::{ImageTransform, TransformError};
