use std::sync::Arc;

use approx::assert_abs_diff_eq;
use featbench_core::{warp_perspective_gray, GrayImage, Keypoint, Point2};
use featbench_transform::{
    out_of_plane_homography, BrightnessTransform, CombinedTransform, GaussianBlurTransform,
    ImageTransform, OutOfPlaneRotation, ParamCombination, PerspectiveTransform, RotationAxis,
    RotationTransform, ScalingTransform, SweepRange, TransformConfig,
};

fn checker(w: usize, h: usize, cell: usize) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| if (x / cell + y / cell) % 2 == 0 { 220 } else { 30 })
}

fn rotation(start: f32, end: f32, step: f32) -> Arc<dyn ImageTransform> {
    Arc::new(RotationTransform::centered(SweepRange::new(start, end, step)).unwrap())
}

#[test]
fn combined_lengths_follow_mode_in_both_orders() {
    let five = rotation(0.0, 40.0, 10.0);
    let two: Arc<dyn ImageTransform> = Arc::new(GaussianBlurTransform::new(3).unwrap());
    assert_eq!(five.arguments().len(), 5);
    assert_eq!(two.arguments().len(), 2);

    for (a, b) in [(five.clone(), two.clone()), (two.clone(), five.clone())] {
        let len = |mode| {
            CombinedTransform::new(a.clone(), b.clone(), mode)
                .unwrap()
                .arguments()
                .len()
        };
        assert_eq!(len(ParamCombination::Full), 10);
        assert_eq!(len(ParamCombination::Interpolate), 2);
        assert_eq!(len(ParamCombination::Extrapolate), 5);
    }
}

#[test]
fn combined_arguments_are_pair_indices() {
    let c = CombinedTransform::new(
        rotation(0.0, 20.0, 10.0),
        Arc::new(BrightnessTransform::new(-10, 10, 20).unwrap()),
        ParamCombination::Full,
    )
    .unwrap();
    assert_eq!(c.name(), "Rotation+Brightness change");
    assert_eq!(c.arguments(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(c.pair(0.0).unwrap(), (0.0, -10.0));
    assert_eq!(c.pair(3.0).unwrap(), (10.0, 10.0));
    assert_eq!(c.pair(5.0).unwrap(), (20.0, 10.0));
    assert!(c.pair(6.0).is_err());
}

#[test]
fn warp_composition_goes_through_the_intermediate_image() {
    let img = checker(40, 40, 5);
    let c = CombinedTransform::new(
        rotation(90.0, 90.0, 1.0),
        Arc::new(ScalingTransform::new(SweepRange::single(0.5)).unwrap()),
        ParamCombination::Full,
    )
    .unwrap();
    assert!(!c.multiply_homography());

    let view = img.view();
    let h = c.homography(0.0, &view).unwrap();
    // (30, 20) turns to (20, 10) about the center, then halves.
    let p = h.apply(Point2::new(30.0, 20.0));
    assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-4);
    assert_abs_diff_eq!(p.y, 5.0, epsilon = 1e-4);

    let out = c.transform_image(0.0, &view).unwrap();
    assert_eq!((out.width, out.height), (20, 20));
}

#[test]
fn multiplied_composition_warps_once() {
    let img = checker(64, 48, 8);
    let y: Arc<dyn ImageTransform> =
        Arc::new(OutOfPlaneRotation::y_axis(SweepRange::single(10.0)).unwrap());
    let x: Arc<dyn ImageTransform> =
        Arc::new(OutOfPlaneRotation::x_axis(SweepRange::single(5.0)).unwrap());
    let c = CombinedTransform::new(y, x, ParamCombination::Interpolate).unwrap();
    assert!(c.multiply_homography());

    let view = img.view();
    let expected = out_of_plane_homography(RotationAxis::Y, 10.0, 64.0, 48.0)
        * out_of_plane_homography(RotationAxis::X, 5.0, 64.0, 48.0);
    let h = c.homography(0.0, &view).unwrap();
    assert_abs_diff_eq!(h.h, expected.h, epsilon = 1e-9);

    let out = c.transform_image(0.0, &view).unwrap();
    assert_eq!(out, warp_perspective_gray(&view, expected, 64, 48));
}

#[test]
fn multiply_flag_requires_both_children() {
    let tilt: Arc<dyn ImageTransform> =
        Arc::new(OutOfPlaneRotation::y_axis(SweepRange::single(0.0)).unwrap());
    let persp: Arc<dyn ImageTransform> = Arc::new(PerspectiveTransform::new(2, 3).unwrap());
    let c = CombinedTransform::new(tilt, persp, ParamCombination::Full).unwrap();
    assert!(!c.multiply_homography());
}

#[test]
fn photometric_combination_keeps_geometry() {
    let img = checker(16, 16, 4);
    let c = CombinedTransform::new(
        rotation(0.0, 0.0, 1.0),
        Arc::new(BrightnessTransform::new(10, 10, 5).unwrap()),
        ParamCombination::Extrapolate,
    )
    .unwrap();
    let view = img.view();
    let out = c.transform_image(0.0, &view).unwrap();
    for (s, d) in img.data.iter().zip(&out.data) {
        assert_eq!(*d, s.saturating_add(10));
    }
    assert_abs_diff_eq!(
        c.homography(0.0, &view).unwrap().h,
        featbench_core::Matrix3::identity(),
        epsilon = 1e-9
    );

    let kps = vec![Keypoint::new(1.0, 2.0), Keypoint::new(3.5, 4.5)];
    assert_eq!(c.transform_keypoints(0.0, &kps).unwrap(), kps);
}

#[test]
fn every_default_sweep_is_non_empty_and_increasing() {
    let configs = [
        r#"{ "kind": "rotation" }"#,
        r#"{ "kind": "y_rotation" }"#,
        r#"{ "kind": "x_rotation", "range": { "start": -30, "end": 30, "step": 2.5 } }"#,
        r#"{ "kind": "scaling", "range": { "start": 0.25, "end": 2.0, "step": 0.25 } }"#,
        r#"{ "kind": "gaussian_blur", "max_kernel_size": 11 }"#,
        r#"{ "kind": "brightness", "min": -100, "max": 100, "step": 20 }"#,
        r#"{ "kind": "perspective", "count": 10, "seed": 5 }"#,
    ];
    for json in configs {
        let cfg: TransformConfig = serde_json::from_str(json).unwrap();
        let t = cfg.build().unwrap();
        let args = t.arguments();
        assert!(!args.is_empty(), "{} has no arguments", t.name());
        assert!(
            args.windows(2).all(|w| w[0] < w[1]),
            "{} sweep is not increasing",
            t.name()
        );
    }
}
