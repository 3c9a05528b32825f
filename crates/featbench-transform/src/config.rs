use std::sync::Arc;

use crate::{
    BrightnessTransform, CombinedTransform, GaussianBlurTransform, ImageTransform,
    OutOfPlaneRotation, ParamCombination, PerspectiveTransform, RotationTransform,
    ScalingTransform, SweepRange, TransformError,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

fn default_center() -> [f32; 2] {
    [0.5, 0.5]
}

/// Serializable description of a transformation.
///
/// ```json
/// { "kind": "combined",
///   "first":  { "kind": "rotation", "range": { "start": 0, "end": 90, "step": 10 } },
///   "second": { "kind": "gaussian_blur", "max_kernel_size": 9 },
///   "mode": "interpolate" }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformConfig {
    /// In-plane rotation in degrees about `center` (unit image coordinates).
    Rotation {
        #[serde(default)]
        range: SweepRange,
        #[serde(default = "default_center")]
        center: [f32; 2],
    },
    /// Tilt about the vertical axis, degrees.
    YRotation {
        #[serde(default)]
        range: SweepRange,
    },
    /// Tilt about the horizontal axis, degrees.
    XRotation {
        #[serde(default)]
        range: SweepRange,
    },
    Scaling { range: SweepRange },
    GaussianBlur { max_kernel_size: usize },
    Brightness { min: i32, max: i32, step: i32 },
    Perspective {
        count: usize,
        #[serde(default)]
        seed: u64,
    },
    Combined {
        first: Box<TransformConfig>,
        second: Box<TransformConfig>,
        #[serde(default)]
        mode: ParamCombination,
    },
}

impl TransformConfig {
    /// Construct the transformation this config describes.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn build(&self) -> Result<Arc<dyn ImageTransform>, TransformError> {
        let transform: Arc<dyn ImageTransform> = match self {
            Self::Rotation { range, center } => Arc::new(RotationTransform::new(
                *range,
                Point2::new(center[0], center[1]),
            )?),
            Self::YRotation { range } => Arc::new(OutOfPlaneRotation::y_axis(*range)?),
            Self::XRotation { range } => Arc::new(OutOfPlaneRotation::x_axis(*range)?),
            Self::Scaling { range } => Arc::new(ScalingTransform::new(*range)?),
            Self::GaussianBlur { max_kernel_size } => {
                Arc::new(GaussianBlurTransform::new(*max_kernel_size)?)
            }
            Self::Brightness { min, max, step } => {
                Arc::new(BrightnessTransform::new(*min, *max, *step)?)
            }
            Self::Perspective { count, seed } => Arc::new(PerspectiveTransform::new(*count, *seed)?),
            Self::Combined {
                first,
                second,
                mode,
            } => Arc::new(CombinedTransform::new(first.build()?, second.build()?, *mode)?),
        };
        log::debug!(
            "built transformation {} with {} arguments",
            transform.name(),
            transform.arguments().len()
        );
        Ok(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg: TransformConfig = serde_json::from_str(r#"{ "kind": "rotation" }"#).unwrap();
        assert_eq!(
            cfg,
            TransformConfig::Rotation {
                range: SweepRange::default(),
                center: [0.5, 0.5]
            }
        );
        let t = cfg.build().unwrap();
        assert_eq!(t.name(), "Rotation");
        assert_eq!(t.arguments().len(), 51);
    }

    #[test]
    fn nested_combination_builds() {
        let json = r#"{
            "kind": "combined",
            "first": { "kind": "y_rotation", "range": { "start": -10, "end": 10, "step": 10 } },
            "second": { "kind": "brightness", "min": 0, "max": 20, "step": 10 },
            "mode": "full"
        }"#;
        let cfg: TransformConfig = serde_json::from_str(json).unwrap();
        let t = cfg.build().unwrap();
        assert_eq!(t.name(), "YRotation+Brightness change");
        assert_eq!(t.arguments().len(), 9);
        assert!(!t.multiply_homography());
    }

    #[test]
    fn invalid_configs_surface_transform_errors() {
        let cfg = TransformConfig::GaussianBlur { max_kernel_size: 0 };
        assert_eq!(cfg.build().unwrap_err(), TransformError::InvalidKernelSize(0));

        let cfg = TransformConfig::Combined {
            first: Box::new(TransformConfig::Perspective { count: 0, seed: 0 }),
            second: Box::new(TransformConfig::XRotation {
                range: SweepRange::default(),
            }),
            mode: ParamCombination::Full,
        };
        assert_eq!(cfg.build().unwrap_err(), TransformError::NoHomographies);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = TransformConfig::Perspective { count: 4, seed: 9 };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"kind\":\"perspective\""));
        let back: TransformConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
