//! High-level facade crate for the `featbench-*` workspace.
//!
//! This crate provides:
//! - re-exports of the primitive, transformation and evaluation crates
//! - a JSON benchmark config ([`BenchConfig`]) and report ([`BenchReport`])
//! - (feature-gated) loading of image files through the `image` crate
//!
//! ## Quickstart
//!
//! ```no_run
//! use featbench::{image_io::load_color_image, BenchConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = BenchConfig::load_json("bench.json")?;
//! let img = load_color_image(&cfg.image_path)?;
//! let report = cfg.run(&img)?;
//! for run in &report.summary {
//!     println!("{} / {}: {:?}", run.algorithm, run.transformation, run.mean_recall);
//! }
//! report.write_json(cfg.output_path())?;
//! # Ok(())
//! # }
//! ```
//!
//! Custom detectors implement [`eval::FeatureAlgorithm`] and go through
//! [`run_benchmark`] or [`eval::perform_estimation`] directly.
//!
//! ## API map
//! - `featbench::core`: images, homographies, keypoints, RANSAC, filters.
//! - `featbench::transform`: distortion families, sweeps and their combinations.
//! - `featbench::eval`: the estimation loop, scoring records and the reference `FastBrief`.
//! - `featbench::image_io` (feature `image`): decoding files into `ColorImage`.

pub use featbench_core as core;
pub use featbench_eval as eval;
pub use featbench_transform as transform;

pub use featbench_eval::{
    perform_estimation, CollectedStatistics, EstimationParams, FastBrief, FeatureAlgorithm,
    FrameMatchingStatistics,
};
pub use featbench_transform::{ImageTransform, TransformConfig};

mod io;

pub use io::{run_benchmark, BenchConfig, BenchError, BenchReport};

#[cfg(feature = "image")]
pub mod image_io;
