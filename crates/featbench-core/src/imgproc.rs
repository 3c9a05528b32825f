//! Photometric and resampling operations on [`GrayImage`]s.

use crate::{sample_bilinear_u8, GrayImage, GrayImageView};

/// Normalized 1D Gaussian kernel of odd `kernel_size`.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mean = (kernel_size as f32 - 1.0) / 2.0;
    let sigma_sq = sigma * sigma;

    let mut kernel: Vec<f32> = (0..kernel_size)
        .map(|i| {
            let x = i as f32 - mean;
            (-(x * x) / (2.0 * sigma_sq)).exp()
        })
        .collect();

    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Sigma implied by a kernel size when the caller does not fix one.
pub fn sigma_for_kernel(kernel_size: usize) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

// reflect-101: abcd|cba
#[inline]
fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    while i < 0 || i >= n {
        i = if i < 0 { -i } else { 2 * n - 2 - i };
    }
    i as usize
}

/// Separable Gaussian blur with reflect-101 borders.
///
/// `kernel_size` is forced odd; size 1 returns a copy.
pub fn gaussian_blur_gray(
    src: &GrayImageView<'_>,
    kernel_size: usize,
    sigma: Option<f32>,
) -> GrayImage {
    let ksize = kernel_size.max(1) | 1;
    if ksize == 1 || src.width == 0 || src.height == 0 {
        return src.to_image();
    }
    let sigma = sigma
        .filter(|s| *s > 0.0)
        .unwrap_or_else(|| sigma_for_kernel(ksize));
    let kernel = gaussian_kernel_1d(ksize, sigma);
    let half = (ksize / 2) as isize;
    let (w, h) = (src.width, src.height);

    let mut tmp = vec![0.0f32; w * h];
    for y in 0..h {
        let row = &src.data[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0;
            for (k, kv) in kernel.iter().enumerate() {
                let sx = reflect_101(x as isize + k as isize - half, w);
                acc += kv * row[sx] as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, kv) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - half, h);
                acc += kv * tmp[sy * w + x];
            }
            out.data[y * w + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Add `offset` to every pixel, saturating to `0..=255`.
pub fn add_brightness(src: &GrayImageView<'_>, offset: f32) -> GrayImage {
    let data = src
        .data
        .iter()
        .map(|&p| (p as f32 + offset).round().clamp(0.0, 255.0) as u8)
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

/// Per-axis coverage weights of source pixels for area resampling.
fn area_weights(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * scale;
            let end = ((d + 1) as f64 * scale).min(src_len as f64);
            let mut taps = Vec::new();
            let mut i = start.floor() as usize;
            while (i as f64) < end && i < src_len {
                let overlap = (end.min(i as f64 + 1.0) - start.max(i as f64)) / scale;
                if overlap > 1e-9 {
                    taps.push((i, overlap as f32));
                }
                i += 1;
            }
            taps
        })
        .collect()
}

/// Resize to `out_w × out_h`.
///
/// Shrinking averages the covered source area; enlarging samples
/// bilinearly with pixel-center alignment.
pub fn resize_gray(src: &GrayImageView<'_>, out_w: usize, out_h: usize) -> GrayImage {
    if out_w == 0 || out_h == 0 || src.width == 0 || src.height == 0 {
        return GrayImage::new(out_w, out_h);
    }
    if out_w == src.width && out_h == src.height {
        return src.to_image();
    }

    if out_w <= src.width && out_h <= src.height {
        let wx = area_weights(src.width, out_w);
        let wy = area_weights(src.height, out_h);
        let mut out = GrayImage::new(out_w, out_h);
        for (y, ty) in wy.iter().enumerate() {
            for (x, tx) in wx.iter().enumerate() {
                let mut acc = 0.0f32;
                for &(sy, fy) in ty {
                    let row = &src.data[sy * src.width..(sy + 1) * src.width];
                    for &(sx, fx) in tx {
                        acc += fx * fy * row[sx] as f32;
                    }
                }
                out.data[y * out_w + x] = acc.round().clamp(0.0, 255.0) as u8;
            }
        }
        return out;
    }

    let sx = src.width as f32 / out_w as f32;
    let sy = src.height as f32 / out_h as f32;
    let max_x = (src.width - 1) as f32;
    let max_y = (src.height - 1) as f32;
    GrayImage::from_fn(out_w, out_h, |x, y| {
        let fx = ((x as f32 + 0.5) * sx - 0.5).clamp(0.0, max_x);
        let fy = ((y as f32 + 0.5) * sy - 0.5).clamp(0.0, max_y);
        sample_bilinear_u8(src, fx, fy)
    })
}
