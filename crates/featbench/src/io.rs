//! JSON benchmark configuration and report helpers.

use std::{
    fs,
    path::{Path, PathBuf},
};

use featbench_core::{ColorImage, ImageError};
use featbench_eval::{
    perform_estimation, CollectedStatistics, EstimationError, EstimationParams, FastBrief,
    FastBriefParams, FeatureAlgorithm, ReportError, RunSummary, StatisticsSink,
};
use featbench_transform::{TransformConfig, TransformError};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the benchmark driver and its IO.
#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "image")]
    #[error("failed to decode image: {0}")]
    Decode(#[from] ::image::ImageError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Estimation(#[from] EstimationError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("no transformations configured")]
    NoTransforms,
}

/// Configuration of one benchmark run, loaded from JSON.
///
/// ```json
/// {
///   "image_path": "lena.png",
///   "transforms": [
///     { "kind": "rotation", "range": { "start": 0, "end": 360, "step": 10 } },
///     { "kind": "gaussian_blur", "max_kernel_size": 9 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Source image. Relative paths resolve against the config file.
    pub image_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    pub transforms: Vec<TransformConfig>,
    #[serde(default)]
    pub estimation: EstimationParams,
    #[serde(default)]
    pub algorithm: FastBriefParams,
}

impl BenchConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, BenchError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), BenchError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("featbench_report.json"))
    }

    /// Image path, joined onto `base_dir` when relative.
    pub fn resolve_image_path(&self, base_dir: &Path) -> PathBuf {
        let path = Path::new(&self.image_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Run every configured transformation with [`FastBrief`] on `image`.
    pub fn run(&self, image: &ColorImage) -> Result<BenchReport, BenchError> {
        let alg = FastBrief::new(self.algorithm.clone());
        let mut statistics = CollectedStatistics::new();
        run_benchmark(&alg, &self.transforms, image, &self.estimation, &mut statistics)?;
        Ok(BenchReport::new(&self.image_path, image, statistics))
    }
}

/// Evaluate `alg` on each transformation in turn, feeding every record to
/// `sink`.
///
/// Stops at the first failing transformation.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(algorithm = alg.name(), transforms = transforms.len()))
)]
pub fn run_benchmark<A: FeatureAlgorithm + ?Sized>(
    alg: &A,
    transforms: &[TransformConfig],
    image: &ColorImage,
    params: &EstimationParams,
    sink: &mut impl StatisticsSink,
) -> Result<(), BenchError> {
    if transforms.is_empty() {
        return Err(BenchError::NoTransforms);
    }
    for cfg in transforms {
        let transform = cfg.build()?;
        log::info!(
            "running {} over {} arguments",
            transform.name(),
            transform.arguments().len()
        );
        sink.record_all(perform_estimation(alg, transform.as_ref(), image, params)?);
    }
    Ok(())
}

/// Output of a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub image_path: String,
    pub width: usize,
    pub height: usize,
    pub summary: Vec<RunSummary>,
    pub statistics: CollectedStatistics,
}

impl BenchReport {
    pub fn new(image_path: &str, image: &ColorImage, statistics: CollectedStatistics) -> Self {
        Self {
            image_path: image_path.to_string(),
            width: image.width,
            height: image.height,
            summary: statistics.summary(),
            statistics,
        }
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, BenchError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), BenchError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
