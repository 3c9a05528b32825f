//! FAST corners with BRIEF descriptors.
//!
//! A small self-contained [`FeatureAlgorithm`] so the benchmark can run
//! without an external detector. It is neither scale nor rotation
//! invariant.

use featbench_core::{gaussian_blur_gray, Features, GrayImage, GrayImageView, Keypoint, Match};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{match_hamming, FeatureAlgorithm};

/// 256-bit binary descriptor.
pub type BriefDescriptor = [u8; 32];

const DESCRIPTOR_BITS: usize = 256;

/// Bresenham circle of radius 3, clockwise from the top.
const CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastBriefParams {
    /// Intensity difference a circle pixel needs to count as brighter/darker.
    pub fast_threshold: u8,
    /// Minimum contiguous arc length on the 16-pixel circle.
    pub arc_length: usize,
    /// Radius of the non-maximum suppression window.
    pub nms_radius: usize,
    /// Keep at most this many corners, strongest first.
    pub max_features: usize,
    /// Side of the square patch sampled by the descriptor.
    pub patch_size: usize,
    /// Gaussian kernel applied before sampling descriptor pairs.
    pub blur_kernel: usize,
    pub pattern_seed: u64,
    pub cross_check: bool,
    /// Lowe ratio for matching; `None` keeps every nearest neighbour.
    pub ratio: Option<f32>,
}

impl Default for FastBriefParams {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            arc_length: 9,
            nms_radius: 3,
            max_features: 1000,
            patch_size: 31,
            blur_kernel: 5,
            pattern_seed: 0x5eed,
            cross_check: true,
            ratio: None,
        }
    }
}

/// Length of the longest run of `true` on a circular buffer.
fn longest_circular_run(flags: &[bool; 16]) -> usize {
    let mut best = 0;
    let mut run = 0;
    for i in 0..32 {
        if flags[i % 16] {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best.min(16)
}

/// Segment-test score of the pixel at `(x, y)`, `None` if it is no corner.
///
/// The score is the larger of the summed excess brightness and the summed
/// excess darkness over the circle.
fn fast_score(
    img: &GrayImageView<'_>,
    x: usize,
    y: usize,
    threshold: u8,
    arc: usize,
) -> Option<f32> {
    let w = img.width;
    let center = img.data[y * w + x] as i16;
    let t = threshold as i16;

    let mut diff = [0i16; 16];
    for (d, &(dx, dy)) in diff.iter_mut().zip(CIRCLE.iter()) {
        let px = (x as isize + dx) as usize;
        let py = (y as isize + dy) as usize;
        *d = img.data[py * w + px] as i16 - center;
    }

    let brighter = diff.map(|d| d > t);
    let darker = diff.map(|d| d < -t);
    if longest_circular_run(&brighter) < arc && longest_circular_run(&darker) < arc {
        return None;
    }

    let bright: i32 = diff.iter().filter(|&&d| d > t).map(|&d| (d - t) as i32).sum();
    let dark: i32 = diff.iter().filter(|&&d| d < -t).map(|&d| (-d - t) as i32).sum();
    Some(bright.max(dark) as f32)
}

/// FAST corners at least `border` pixels away from the image edges.
fn detect_corners(
    img: &GrayImageView<'_>,
    params: &FastBriefParams,
    border: usize,
) -> Vec<Keypoint> {
    let (w, h) = (img.width, img.height);
    if w <= 2 * border || h <= 2 * border {
        return Vec::new();
    }

    let mut scores = vec![0.0f32; w * h];
    for y in border..h - border {
        for x in border..w - border {
            if let Some(s) = fast_score(img, x, y, params.fast_threshold, params.arc_length) {
                scores[y * w + x] = s;
            }
        }
    }

    let r = params.nms_radius as isize;
    let mut corners = Vec::new();
    for y in border..h - border {
        for x in border..w - border {
            let s = scores[y * w + x];
            if s <= 0.0 {
                continue;
            }
            let mut is_max = true;
            'window: for dy in -r..=r {
                for dx in -r..=r {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                        continue;
                    }
                    let n = scores[ny as usize * w + nx as usize];
                    // equal scores: the first in raster order wins
                    if n > s || (n == s && (dy < 0 || (dy == 0 && dx < 0))) {
                        is_max = false;
                        break 'window;
                    }
                }
            }
            if is_max {
                corners.push(Keypoint::new(x as f32, y as f32).with_response(s));
            }
        }
    }

    corners.sort_by(|a, b| b.response.total_cmp(&a.response));
    corners.truncate(params.max_features);
    corners
}

/// FAST-9 detector, BRIEF-256 descriptor, brute-force Hamming matcher.
#[derive(Clone, Debug)]
pub struct FastBrief {
    params: FastBriefParams,
    /// Point pairs `(x1, y1, x2, y2)` relative to the keypoint.
    pattern: Vec<[i32; 4]>,
}

impl Default for FastBrief {
    fn default() -> Self {
        Self::new(FastBriefParams::default())
    }
}

impl FastBrief {
    pub const NAME: &'static str = "FAST+BRIEF";

    pub fn new(params: FastBriefParams) -> Self {
        let half = (params.patch_size / 2).max(1) as i32;
        let mut rng = ChaCha8Rng::seed_from_u64(params.pattern_seed);
        let pattern = (0..DESCRIPTOR_BITS)
            .map(|_| {
                [
                    rng.random_range(-half..=half),
                    rng.random_range(-half..=half),
                    rng.random_range(-half..=half),
                    rng.random_range(-half..=half),
                ]
            })
            .collect();
        Self { params, pattern }
    }

    pub fn params(&self) -> &FastBriefParams {
        &self.params
    }

    fn border(&self) -> usize {
        (self.params.patch_size / 2 + 1).max(3)
    }

    fn describe(&self, smoothed: &GrayImage, kp: &Keypoint) -> BriefDescriptor {
        let (x, y) = (kp.position.x as i32, kp.position.y as i32);
        let sample = |dx: i32, dy: i32| -> u8 {
            let (sx, sy) = (x + dx, y + dy);
            if sx < 0 || sy < 0 {
                return 0;
            }
            smoothed.get(sx as usize, sy as usize).unwrap_or(0)
        };
        let mut desc = [0u8; 32];
        for (bit, p) in self.pattern.iter().enumerate() {
            if sample(p[0], p[1]) < sample(p[2], p[3]) {
                desc[bit / 8] |= 1 << (bit % 8);
            }
        }
        desc
    }
}

impl FeatureAlgorithm for FastBrief {
    type Descriptor = BriefDescriptor;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn extract_features(&self, image: &GrayImageView<'_>) -> Features<BriefDescriptor> {
        let keypoints: Vec<Keypoint> = detect_corners(image, &self.params, self.border())
            .into_iter()
            .map(|k| k.with_size(self.params.patch_size as f32))
            .collect();
        let smoothed = gaussian_blur_gray(image, self.params.blur_kernel, None);
        let descriptors = keypoints.iter().map(|k| self.describe(&smoothed, k)).collect();
        Features::new(keypoints, descriptors)
    }

    fn match_features(&self, train: &[BriefDescriptor], query: &[BriefDescriptor]) -> Vec<Match> {
        match_hamming(train, query, self.params.cross_check, self.params.ratio)
    }
}
