use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeanStdDev {
    pub mean: f32,
    pub std_dev: f32,
}

/// `None` for an empty sample.
pub fn mean_std_dev(values: &[f32]) -> Option<MeanStdDev> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    Some(MeanStdDev {
        mean: mean as f32,
        std_dev: var.sqrt() as f32,
    })
}
