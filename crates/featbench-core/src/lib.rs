//! Core types and numeric primitives for feature-matching benchmarks.
//!
//! This crate is intentionally small. It does *not* depend on any concrete
//! feature detector or image decoding library: images are plain row-major
//! 8-bit buffers and homographies are `nalgebra` 3×3 matrices.

mod features;
mod homography;
mod image;
mod imgproc;
mod logger;
mod ransac;
mod stats;

pub use features::{Features, Keypoint, Match};
pub use homography::{
    estimate_homography, homography_from_4pt, warp_affine_gray, warp_perspective_gray, Homography,
};
pub use image::{
    sample_bilinear, sample_bilinear_u8, ColorImage, GrayImage, GrayImageView, ImageError,
    SUPPORTED_CHANNELS,
};
pub use imgproc::{
    add_brightness, gaussian_blur_gray, gaussian_kernel_1d, resize_gray, sigma_for_kernel,
};
pub use ransac::{fit_homography_ransac, FitError, HomographyFit, RansacParams};
pub use stats::{mean_std_dev, MeanStdDev};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_str};

pub use nalgebra::{Matrix3, Point2};
