//! Interop with the `image` crate.

use std::path::Path;

use ::image::{DynamicImage, ImageReader};

use crate::core::{ColorImage, GrayImageView, ImageError};
use crate::BenchError;

/// Convert a decoded image into a [`ColorImage`].
///
/// 8-bit gray, RGB and RGBA buffers are moved over as they are. Other
/// formats are converted to the closest of those three.
pub fn color_image_from_dynamic(img: DynamicImage) -> Result<ColorImage, ImageError> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    match img {
        DynamicImage::ImageLuma8(buf) => ColorImage::from_raw(width, height, 1, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => ColorImage::from_raw(width, height, 3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => ColorImage::from_raw(width, height, 4, buf.into_raw()),
        other => {
            let color = other.color();
            if color.has_alpha() {
                ColorImage::from_raw(width, height, 4, other.to_rgba8().into_raw())
            } else if color.has_color() {
                ColorImage::from_raw(width, height, 3, other.to_rgb8().into_raw())
            } else {
                ColorImage::from_raw(width, height, 1, other.to_luma8().into_raw())
            }
        }
    }
}

/// Decode an image file.
pub fn load_color_image(path: impl AsRef<Path>) -> Result<ColorImage, BenchError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(color_image_from_dynamic(img)?)
}

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{GrayImage, ImageBuffer, LumaA, Rgb};

    #[test]
    fn rgb_keeps_three_channels() {
        let buf = ImageBuffer::from_fn(4, 2, |x, y| Rgb([x as u8, y as u8, 7]));
        let img = color_image_from_dynamic(DynamicImage::ImageRgb8(buf)).unwrap();
        assert_eq!((img.width, img.height, img.channels), (4, 2, 3));
        assert_eq!(&img.data[..6], &[0, 0, 7, 1, 0, 7]);
    }

    #[test]
    fn gray_alpha_is_widened_to_rgba() {
        let buf = ImageBuffer::from_pixel(3, 3, LumaA([90u8, 255]));
        let img = color_image_from_dynamic(DynamicImage::ImageLumaA8(buf)).unwrap();
        assert_eq!(img.channels, 4);
        assert_eq!(img.to_gray().unwrap().data, vec![90; 9]);
    }

    #[test]
    fn gray_view_borrows_pixels() {
        let img = GrayImage::from_fn(5, 4, |x, y| ::image::Luma([(x + 10 * y) as u8]));
        let view = gray_view(&img);
        assert_eq!((view.width, view.height), (5, 4));
        assert_eq!(view.get(2, 3), Some(32));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_color_image("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, BenchError::Io(_)));
    }
}
