//! Collection of statistics records across runs.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::FrameMatchingStatistics;

/// Receiver of per-frame records.
pub trait StatisticsSink {
    fn record(&mut self, stat: FrameMatchingStatistics);

    fn record_all(&mut self, stats: impl IntoIterator<Item = FrameMatchingStatistics>)
    where
        Self: Sized,
    {
        for s in stats {
            self.record(s);
        }
    }
}

impl StatisticsSink for Vec<FrameMatchingStatistics> {
    fn record(&mut self, stat: FrameMatchingStatistics) {
        self.push(stat);
    }
}

/// Aggregate of one (algorithm, transformation) run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub algorithm: String,
    pub transformation: String,
    pub frames: usize,
    pub valid_frames: usize,
    /// Mean over frames whose precision and recall are both defined;
    /// `None` when there is no such frame.
    pub mean_precision: Option<f32>,
    pub mean_recall: Option<f32>,
    pub mean_time_ms: Option<f64>,
}

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Records grouped by algorithm, then by transformation.
///
/// Within a group records keep their arrival order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CollectedStatistics {
    pub runs: BTreeMap<String, BTreeMap<String, Vec<FrameMatchingStatistics>>>,
}

impl CollectedStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, algorithm: &str, transformation: &str) -> Option<&[FrameMatchingStatistics]> {
        self.runs
            .get(algorithm)?
            .get(transformation)
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.runs.values().flat_map(|r| r.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One summary per (algorithm, transformation), in key order.
    pub fn summary(&self) -> Vec<RunSummary> {
        self.runs
            .iter()
            .flat_map(|(alg, runs)| {
                runs.iter()
                    .map(move |(trans, frames)| summarize(alg, trans, frames))
            })
            .collect()
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

impl StatisticsSink for CollectedStatistics {
    fn record(&mut self, stat: FrameMatchingStatistics) {
        self.runs
            .entry(stat.algorithm.clone())
            .or_default()
            .entry(stat.transformation.clone())
            .or_default()
            .push(stat);
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn summarize(
    algorithm: &str,
    transformation: &str,
    frames: &[FrameMatchingStatistics],
) -> RunSummary {
    let scored: Vec<&FrameMatchingStatistics> = frames.iter().filter(|s| s.is_scored()).collect();
    RunSummary {
        algorithm: algorithm.to_string(),
        transformation: transformation.to_string(),
        frames: frames.len(),
        valid_frames: frames.iter().filter(|s| s.is_valid).count(),
        mean_precision: mean(scored.iter().map(|s| s.precision as f64)).map(|v| v as f32),
        mean_recall: mean(scored.iter().map(|s| s.recall as f64)).map(|v| v as f32),
        mean_time_ms: mean(
            frames
                .iter()
                .filter(|s| s.is_valid)
                .map(|s| s.consumed_time_ms),
        ),
    }
}
