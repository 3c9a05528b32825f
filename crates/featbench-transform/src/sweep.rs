use crate::TransformError;
use serde::{Deserialize, Serialize};

/// Default sweep extent.
pub const DEFAULT_SWEEP_END: f32 = 20.0;
/// Default sweep step.
pub const DEFAULT_SWEEP_STEP: f32 = 0.4;

/// Inclusive `start..=end` range sampled every `step`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepRange {
    pub start: f32,
    pub end: f32,
    pub step: f32,
}

impl Default for SweepRange {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: DEFAULT_SWEEP_END,
            step: DEFAULT_SWEEP_STEP,
        }
    }
}

impl SweepRange {
    pub fn new(start: f32, end: f32, step: f32) -> Self {
        Self { start, end, step }
    }

    /// A single-value sweep.
    pub fn single(value: f32) -> Self {
        Self::new(value, value, 1.0)
    }

    /// Materialize `start, start + step, …` up to and including `end`.
    ///
    /// Values are computed as `start + i * step` so long sweeps do not
    /// drift; `end` is kept when it is hit up to float rounding.
    pub fn values(&self) -> Result<Vec<f32>, TransformError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(TransformError::InvalidStep(self.step));
        }
        if !(self.start.is_finite() && self.end.is_finite()) {
            return Err(TransformError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.start > self.end {
            return Err(TransformError::EmptySweep {
                start: self.start,
                end: self.end,
            });
        }

        let (start, end, step) = (self.start as f64, self.end as f64, self.step as f64);
        let limit = end + step * 1e-4;
        let mut out = Vec::new();
        let mut i = 0u64;
        loop {
            let v = start + i as f64 * step;
            if v > limit {
                break;
            }
            out.push(v as f32);
            i += 1;
        }
        Ok(out)
    }
}

/// Integer sweep `min, min + step, …, <= max`.
pub(crate) fn integer_values(min: i32, max: i32, step: i32) -> Result<Vec<f32>, TransformError> {
    if step <= 0 {
        return Err(TransformError::InvalidStep(step as f32));
    }
    if min > max {
        return Err(TransformError::EmptySweep {
            start: min as f32,
            end: max as f32,
        });
    }
    Ok((min as i64..=max as i64)
        .step_by(step as usize)
        .map(|v| v as f32)
        .collect())
}
