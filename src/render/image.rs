//! # Image Normalization
//!
//! Fits an arbitrary raster image to the paper:
//!
//! 1. Landscape images (wider than tall) are rotated a quarter turn
//!    counter-clockwise so the long side runs along the paper, unless the
//!    caller forces portrait framing. The canvas is expanded, nothing is
//!    cropped.
//! 2. Images wider than the paper are scaled down with a Lanczos filter,
//!    keeping the aspect ratio: `new_height = floor(height * max_width / width)`.
//!
//! The input is never mutated, and the same input always yields the same
//! output.

use image::{DynamicImage, GenericImageView, imageops::FilterType};

use crate::error::JobError;

/// Default maximum image width in dots.
pub const DEFAULT_MAX_WIDTH: u32 = 512;

/// Rotate and downscale `image` to fit `max_width` dots.
///
/// ## Errors
///
/// [`JobError::ImageDimension`] when downscaling would leave zero rows.
///
/// ## Example
///
/// ```
/// use directslip::render::image::normalize;
/// use image::{DynamicImage, GrayImage};
///
/// let landscape = DynamicImage::ImageLuma8(GrayImage::new(600, 400));
/// let out = normalize(&landscape, 512, false)?;
/// assert_eq!((out.width(), out.height()), (400, 600));
/// # Ok::<(), directslip::error::JobError>(())
/// ```
pub fn normalize(
    image: &DynamicImage,
    max_width: u32,
    force_portrait: bool,
) -> Result<DynamicImage, JobError> {
    let (width, height) = image.dimensions();

    let oriented = if !force_portrait && width > height {
        image.rotate270()
    } else {
        image.clone()
    };

    let (width, height) = oriented.dimensions();
    if width <= max_width {
        return Ok(oriented);
    }

    let new_height = scaled_height(width, height, max_width);
    if new_height == 0 {
        return Err(JobError::ImageDimension {
            width,
            height,
            max_width,
        });
    }

    Ok(oriented.resize_exact(max_width, new_height, FilterType::Lanczos3))
}

/// `floor(height * max_width / width)` without intermediate overflow.
#[inline]
fn scaled_height(width: u32, height: u32, max_width: u32) -> u32 {
    (u64::from(height) * u64::from(max_width) / u64::from(width)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    fn gray(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::new(width, height))
    }

    #[test]
    fn test_landscape_is_rotated() {
        let out = normalize(&gray(300, 100), 512, false).unwrap();
        assert_eq!(out.dimensions(), (100, 300));
    }

    #[test]
    fn test_force_portrait_keeps_orientation() {
        let out = normalize(&gray(300, 100), 512, true).unwrap();
        assert_eq!(out.dimensions(), (300, 100));
    }

    #[test]
    fn test_portrait_untouched() {
        let out = normalize(&gray(100, 300), 512, false).unwrap();
        assert_eq!(out.dimensions(), (100, 300));
    }

    #[test]
    fn test_square_is_not_rotated() {
        let mut img = GrayImage::new(4, 4);
        img.put_pixel(3, 0, Luma([255]));
        let out = normalize(&DynamicImage::ImageLuma8(img), 512, false).unwrap();
        assert_eq!(out.to_luma8().get_pixel(3, 0), &Luma([255]));
    }

    #[test]
    fn test_rotation_is_counter_clockwise() {
        // Top-right pixel ends up top-left after a quarter turn to the left
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(2, 0, Luma([255]));
        let out = normalize(&DynamicImage::ImageLuma8(img), 512, false).unwrap();
        assert_eq!(out.dimensions(), (2, 3));
        assert_eq!(out.to_luma8().get_pixel(0, 0), &Luma([255]));
    }

    #[test]
    fn test_wide_image_is_downscaled() {
        let out = normalize(&gray(1000, 2000), 512, false).unwrap();
        assert_eq!(out.dimensions(), (512, 1024));
    }

    #[test]
    fn test_height_is_floored() {
        // 1000 * 512 / 1001 = 511.48...
        let out = normalize(&gray(1001, 1000), 512, true).unwrap();
        assert_eq!(out.dimensions(), (512, 511));
    }

    #[test]
    fn test_rotated_then_downscaled() {
        // 3000x1000 → 1000x3000 → 512x1536
        let out = normalize(&gray(3000, 1000), 512, false).unwrap();
        assert_eq!(out.dimensions(), (512, 1536));
    }

    #[test]
    fn test_zero_height_is_an_error() {
        let err = normalize(&gray(2000, 1), 512, true).unwrap_err();
        assert_eq!(
            err,
            JobError::ImageDimension {
                width: 2000,
                height: 1,
                max_width: 512
            }
        );
    }

    #[test]
    fn test_input_is_not_mutated() {
        let input = DynamicImage::ImageRgb8(RgbImage::new(800, 600));
        let _ = normalize(&input, 512, false).unwrap();
        assert_eq!(input.dimensions(), (800, 600));
    }

    #[test]
    fn test_deterministic() {
        let mut img = GrayImage::new(700, 90);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Luma([((x * 7 + y * 13) % 256) as u8]);
        }
        let img = DynamicImage::ImageLuma8(img);
        let a = normalize(&img, 64, true).unwrap();
        let b = normalize(&img, 64, true).unwrap();
        assert_eq!(a.to_luma8().into_raw(), b.to_luma8().into_raw());
    }
}
