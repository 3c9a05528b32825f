//! Distortions that change pixel values but not geometry.
//!
//! Both keep the default identity homography.

use crate::sweep::integer_values;
use crate::{ImageTransform, TransformError};
use featbench_core::{add_brightness, gaussian_blur_gray, GrayImage, GrayImageView};

/// Gaussian smoothing with odd kernel sizes `1, 3, 5, …, max_kernel_size`.
///
/// The argument is the kernel size itself; size 1 leaves the image as is.
#[derive(Clone, Debug)]
pub struct GaussianBlurTransform {
    args: Vec<f32>,
}

impl GaussianBlurTransform {
    pub const NAME: &'static str = "Gaussian blur";

    pub fn new(max_kernel_size: usize) -> Result<Self, TransformError> {
        if max_kernel_size == 0 {
            return Err(TransformError::InvalidKernelSize(max_kernel_size));
        }
        let args = (1..=max_kernel_size).step_by(2).map(|k| k as f32).collect();
        Ok(Self { args })
    }
}

impl ImageTransform for GaussianBlurTransform {
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
        if !(t.is_finite() && t >= 1.0) {
            return Err(TransformError::InvalidKernelSize(t.max(0.0) as usize));
        }
        Ok(gaussian_blur_gray(source, t as usize, None))
    }
}

/// Additive brightness offset sweeping `min..=max` by an integer `step`.
#[derive(Clone, Debug)]
pub struct BrightnessTransform {
    args: Vec<f32>,
}

impl BrightnessTransform {
    pub const NAME: &'static str = "Brightness change";

    pub fn new(min: i32, max: i32, step: i32) -> Result<Self, TransformError> {
        Ok(Self {
            args: integer_values(min, max, step)?,
        })
    }
}

impl ImageTransform for BrightnessTransform {
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
        Ok(add_brightness(source, t))
    }
}
