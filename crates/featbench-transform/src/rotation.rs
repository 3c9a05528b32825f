//! In-plane and out-of-plane rotations.

use crate::{ImageTransform, SweepRange, TransformError};
use featbench_core::{warp_affine_gray, warp_perspective_gray, GrayImage, GrayImageView, Homography};
use nalgebra::{Matrix3x4, Matrix4, Matrix4x3, Point2};

/// 2×3 matrix rotating by `angle_deg` (counter-clockwise on screen) about `center`.
pub fn rotation_matrix_2d(center: Point2<f64>, angle_deg: f64, scale: f64) -> [[f64; 3]; 2] {
    let angle = angle_deg.to_radians();
    let alpha = scale * angle.cos();
    let beta = scale * angle.sin();
    [
        [alpha, beta, (1.0 - alpha) * center.x - beta * center.y],
        [-beta, alpha, beta * center.x + (1.0 - alpha) * center.y],
    ]
}

/// Rotation in the image plane about a point given in unit image coordinates.
#[derive(Clone, Debug)]
pub struct RotationTransform {
    center_unit: Point2<f32>,
    args: Vec<f32>,
}

impl RotationTransform {
    pub const NAME: &'static str = "Rotation";

    pub fn new(angles_deg: SweepRange, center_unit: Point2<f32>) -> Result<Self, TransformError> {
        Ok(Self {
            center_unit,
            args: angles_deg.values()?,
        })
    }

    /// Rotate about the image center.
    pub fn centered(angles_deg: SweepRange) -> Result<Self, TransformError> {
        Self::new(angles_deg, Point2::new(0.5, 0.5))
    }

    fn affine(&self, t: f32, source: &GrayImageView<'_>) -> [[f64; 3]; 2] {
        let center = Point2::new(
            source.width as f64 * self.center_unit.x as f64,
            source.height as f64 * self.center_unit.y as f64,
        );
        rotation_matrix_2d(center, t as f64, 1.0)
    }
}

impl ImageTransform for RotationTransform {
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
        let m = self.affine(t, source);
        Ok(warp_affine_gray(source, m, source.width, source.height))
    }

    fn homography(&self, t: f32, source: &GrayImageView<'_>) -> Result<Homography, TransformError> {
        Ok(Homography::from_affine(self.affine(t, source)))
    }
}

/// Axis of an out-of-plane rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationAxis {
    /// Tilt left/right; focal length and depth equal the image width.
    Y,
    /// Tilt up/down; focal length and depth equal the image height.
    X,
}

/// Homography of a plane rotated by `angle_deg` about `axis`, viewed by a
/// pinhole camera placed one image size away.
///
/// `H = A2 · T · R · A1` where `A1` lifts pixels onto the centered plane,
/// `T` pushes it along the optical axis and `A2` projects back.
pub fn out_of_plane_homography(
    axis: RotationAxis,
    angle_deg: f64,
    width: f64,
    height: f64,
) -> Homography {
    let a = (-angle_deg).to_radians();
    let (s, c) = a.sin_cos();

    let lift = Matrix4x3::new(
        1.0, 0.0, -width / 2.0, //
        0.0, 1.0, -height / 2.0, //
        0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0,
    );
    let (rot, f) = match axis {
        RotationAxis::Y => (
            Matrix4::new(
                c, 0.0, -s, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                s, 0.0, c, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ),
            width,
        ),
        RotationAxis::X => (
            Matrix4::new(
                1.0, 0.0, 0.0, 0.0, //
                0.0, c, -s, 0.0, //
                0.0, s, c, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ),
            height,
        ),
    };
    let shift = Matrix4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, f, //
        0.0, 0.0, 0.0, 1.0,
    );
    let project = Matrix3x4::new(
        f, 0.0, width / 2.0, 0.0, //
        0.0, f, height / 2.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    );

    let h = Homography::new(project * (shift * (rot * lift)));
    h.normalized().unwrap_or(h)
}

/// Perspective tilt about the X or Y axis through the image center.
#[derive(Clone, Debug)]
pub struct OutOfPlaneRotation {
    axis: RotationAxis,
    args: Vec<f32>,
}

impl OutOfPlaneRotation {
    pub fn new(axis: RotationAxis, angles_deg: SweepRange) -> Result<Self, TransformError> {
        Ok(Self {
            axis,
            args: angles_deg.values()?,
        })
    }

    pub fn y_axis(angles_deg: SweepRange) -> Result<Self, TransformError> {
        Self::new(RotationAxis::Y, angles_deg)
    }

    pub fn x_axis(angles_deg: SweepRange) -> Result<Self, TransformError> {
        Self::new(RotationAxis::X, angles_deg)
    }

    pub fn axis(&self) -> RotationAxis {
        self.axis
    }
}

impl ImageTransform for OutOfPlaneRotation {
    fn name(&self) -> &str {
        match self.axis {
            RotationAxis::Y => "YRotation",
            RotationAxis::X => "XRotation",
        }
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
        Ok(out_of_plane_homography(
            self.axis,
            t as f64,
            source.width as f64,
            source.height as f64,
        ))
    }

    fn multiply_homography(&self) -> bool {
        true
    }
}
