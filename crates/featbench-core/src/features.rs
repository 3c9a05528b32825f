use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A detected interest point.
///
/// Order inside a keypoint list defines its index; matches refer to
/// keypoints by that index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub position: Point2<f32>,
    /// Diameter of the meaningful neighbourhood, in pixels.
    #[serde(default)]
    pub size: Option<f32>,
    /// Orientation in degrees.
    #[serde(default)]
    pub orientation: Option<f32>,
    /// Detector response.
    #[serde(default)]
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Point2::new(x, y),
            size: None,
            orientation: None,
            response: 0.0,
        }
    }

    pub fn with_response(mut self, response: f32) -> Self {
        self.response = response;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }
}

/// Index pair linking a descriptor of the query set to one of the train set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

impl Match {
    pub fn new(query_idx: usize, train_idx: usize, distance: f32) -> Self {
        Self {
            query_idx,
            train_idx,
            distance,
        }
    }
}

/// Keypoints and their descriptors; `descriptors[i]` describes `keypoints[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Features<D> {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<D>,
}

impl<D> Features<D> {
    pub fn new(keypoints: Vec<Keypoint>, descriptors: Vec<D>) -> Self {
        Self {
            keypoints,
            descriptors,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// `true` when there is exactly one descriptor per keypoint.
    pub fn is_consistent(&self) -> bool {
        self.keypoints.len() == self.descriptors.len()
    }

    pub fn positions(&self) -> Vec<Point2<f32>> {
        self.keypoints.iter().map(|k| k.position).collect()
    }
}

impl<D> Default for Features<D> {
    fn default() -> Self {
        Self::empty()
    }
}
