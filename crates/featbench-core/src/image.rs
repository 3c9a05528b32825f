use serde::{Deserialize, Serialize};

/// Channel counts accepted by [`ColorImage::to_gray`].
pub const SUPPORTED_CHANNELS: [usize; 3] = [1, 3, 4];

/// Errors produced when building or converting images.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("unsupported channel count {0} (supported: 1, 3, 4)")]
    UnsupportedChannels(usize),
    #[error("invalid image buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },
    #[error("invalid image dimensions (width={width}, height={height}, channels={channels})")]
    InvalidDimensions {
        width: usize,
        height: usize,
        channels: usize,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl GrayImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    pub fn to_image(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Black image of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Wrap a row-major buffer, checking its length.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = width
            .checked_mul(height)
            .ok_or(ImageError::InvalidDimensions {
                width,
                height,
                channels: 1,
            })?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.view().get(x, y)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Interleaved 8-bit image with an arbitrary channel count.
///
/// Channel order is RGB / RGBA for 3 and 4 channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorImage {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl ColorImage {
    pub fn from_raw(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        let invalid = ImageError::InvalidDimensions {
            width,
            height,
            channels,
        };
        if channels == 0 {
            return Err(invalid);
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or(invalid)?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Convert to single-channel intensity.
    ///
    /// Gray input is copied through unchanged; RGB and RGBA use the
    /// `0.299 R + 0.587 G + 0.114 B` weights (alpha ignored). Every other
    /// channel count is rejected.
    pub fn to_gray(&self) -> Result<GrayImage, ImageError> {
        match self.channels {
            1 => GrayImage::from_raw(self.width, self.height, self.data.clone()),
            3 | 4 => {
                let data = self
                    .data
                    .chunks_exact(self.channels)
                    .map(|px| {
                        let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                        y.round().clamp(0.0, 255.0) as u8
                    })
                    .collect();
                GrayImage::from_raw(self.width, self.height, data)
            }
            other => Err(ImageError::UnsupportedChannels(other)),
        }
    }
}

impl From<GrayImage> for ColorImage {
    fn from(img: GrayImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            channels: 1,
            data: img.data,
        }
    }
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

/// Bilinear sample with a constant-zero border. Pixel `(i, j)` sits at
/// integer coordinates.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_input_passes_through() {
        let gray = GrayImage::from_fn(4, 3, |x, y| (x * 10 + y) as u8);
        let color = ColorImage::from(gray.clone());
        assert_eq!(color.to_gray().expect("gray"), gray);
    }

    #[test]
    fn rgb_and_rgba_use_luma_weights() {
        let rgb = ColorImage::from_raw(2, 1, 3, vec![255, 0, 0, 0, 0, 255]).expect("rgb");
        assert_eq!(rgb.to_gray().expect("gray").data, vec![76, 29]);

        let rgba =
            ColorImage::from_raw(1, 1, 4, vec![100, 100, 100, 7]).expect("rgba");
        assert_eq!(rgba.to_gray().expect("gray").data, vec![100]);
    }

    #[test]
    fn two_channel_input_is_rejected() {
        let img = ColorImage::from_raw(2, 2, 2, vec![0; 8]).expect("raw");
        assert_eq!(img.to_gray(), Err(ImageError::UnsupportedChannels(2)));
    }

    #[test]
    fn buffer_length_is_checked() {
        let err = GrayImage::from_raw(3, 3, vec![0; 8]).unwrap_err();
        assert_eq!(
            err,
            ImageError::InvalidBuffer {
                expected: 9,
                got: 8
            }
        );
    }

    #[test]
    fn bilinear_is_exact_on_pixel_centers() {
        let img = GrayImage::from_fn(3, 3, |x, y| (x * 3 + y * 50) as u8);
        let view = img.view();
        assert_eq!(sample_bilinear_u8(&view, 2.0, 1.0), 56);
        assert_eq!(sample_bilinear_u8(&view, -5.0, 1.0), 0);
        assert!((sample_bilinear(&view, 0.5, 0.0) - 1.5).abs() < 1e-6);
    }
}
