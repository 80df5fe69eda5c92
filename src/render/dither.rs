//! # Monochrome Conversion
//!
//! Thermal printers only print black dots, so a normalized image is reduced
//! to one bit per pixel before it is sent as a raster directive.
//!
//! ## Floyd-Steinberg Error Diffusion
//!
//! Each pixel is thresholded at 50% gray and the quantization error is pushed
//! to the neighbours that have not been visited yet:
//!
//! ```text
//!              pixel   7/16
//!     3/16     5/16    1/16
//! ```
//!
//! This is the same conversion most imaging libraries apply when asked for a
//! 1-bit image, so photos keep their tonal range on paper.
//!
//! ## Transparency
//!
//! Alpha is composited onto white paper first, so a transparent background
//! does not print as a black block.
//!
//! ## Usage Example
//!
//! ```
//! use directslip::render::dither;
//!
//! // Pack a row of boolean values into bytes
//! let row: Vec<bool> = vec![true, true, false, false, true, false, true, false];
//! let packed = dither::pack_row(&row);
//! assert_eq!(packed, vec![0b11001010]); // 0xCA
//! ```

use image::{DynamicImage, GrayImage, Luma};

/// Convert an image to grayscale, compositing any alpha onto white.
pub fn flatten_to_gray(img: &DynamicImage) -> GrayImage {
    if !img.color().has_alpha() {
        return img.to_luma8();
    }

    let gray_alpha = img.to_luma_alpha8();
    let (width, height) = gray_alpha.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [luma, alpha] = gray_alpha.get_pixel(x, y).0;
        let alpha = u32::from(alpha);
        let value = (u32::from(luma) * alpha + 255 * (255 - alpha) + 127) / 255;
        Luma([value as u8])
    })
}

/// Floyd-Steinberg dither a grayscale image into packed raster rows.
///
/// Returns `ceil(width / 8) * height` bytes, 1 = black.
pub fn floyd_steinberg(gray: &GrayImage) -> Vec<u8> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let width_bytes = width.div_ceil(8);

    // Two rows of accumulated error, in 1/16 units of intensity (0 = white)
    let mut current = vec![0i32; width + 2];
    let mut next = vec![0i32; width + 2];
    let mut data = Vec::with_capacity(width_bytes * height);
    let mut row = vec![false; width];

    for y in 0..height {
        for x in 0..width {
            let ink = 255 - i32::from(gray.get_pixel(x as u32, y as u32).0[0]);
            let value = ink + current[x + 1] / 16;
            let black = value >= 128;
            row[x] = black;

            let error = value - if black { 255 } else { 0 };
            current[x + 2] += error * 7;
            next[x] += error * 3;
            next[x + 1] += error * 5;
            next[x + 2] += error;
        }
        data.extend(pack_row(&row));

        std::mem::swap(&mut current, &mut next);
        next.iter_mut().for_each(|e| *e = 0);
    }

    data
}

/// Pack a row of pixels into bytes.
///
/// ## Bit Packing
///
/// - Bit 7 (MSB) = leftmost pixel
/// - Bit 0 (LSB) = rightmost pixel
/// - 1 = black (print dot), 0 = white (no dot)
///
/// ## Padding
///
/// If the row length is not a multiple of 8, the last byte is padded
/// with zeros (white) on the right.
///
/// ## Example
///
/// ```
/// use directslip::render::dither::pack_row;
///
/// // 8 pixels pack into 1 byte
/// let row = vec![true, true, true, true, false, false, false, false];
/// assert_eq!(pack_row(&row), vec![0xF0]); // 11110000
///
/// // 12 pixels pack into 2 bytes (4 bits padding)
/// let row = vec![true; 12];
/// assert_eq!(pack_row(&row), vec![0xFF, 0xF0]); // 11111111 11110000
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let num_bytes = pixels.len().div_ceil(8);
    let mut bytes = vec![0u8; num_bytes];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            let byte_idx = i / 8;
            let bit_idx = 7 - (i % 8); // MSB first
            bytes[byte_idx] |= 1 << bit_idx;
        }
    }

    bytes
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, LumaA};

    fn solid(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    #[test]
    fn test_pack_row_8_pixels() {
        // All black
        assert_eq!(pack_row(&[true; 8]), vec![0xFF]);
        // All white
        assert_eq!(pack_row(&[false; 8]), vec![0x00]);
        // Alternating
        assert_eq!(
            pack_row(&[true, false, true, false, true, false, true, false]),
            vec![0xAA]
        );
    }

    #[test]
    fn test_pack_row_padding() {
        // 9 pixels should pad to 2 bytes
        let packed = pack_row(&[true; 9]);
        assert_eq!(packed, vec![0xFF, 0x80]);
    }

    #[test]
    fn test_pack_row_empty() {
        assert_eq!(pack_row(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_black_and_white_are_exact() {
        assert!(floyd_steinberg(&solid(16, 4, 0)).iter().all(|&b| b == 0xFF));
        assert!(floyd_steinberg(&solid(16, 4, 255)).iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_raster_dimensions() {
        let data = floyd_steinberg(&solid(13, 7, 128));
        assert_eq!(data.len(), 2 * 7);
    }

    #[test]
    fn test_mid_gray_prints_about_half() {
        let data = floyd_steinberg(&solid(64, 64, 128));
        let dots: u32 = data.iter().map(|b| b.count_ones()).sum();
        let total = 64 * 64;
        assert!(
            dots > total * 2 / 5 && dots < total * 3 / 5,
            "50% gray should print ~half the dots, got {}/{}",
            dots,
            total
        );
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let mut img = GrayAlphaImage::new(2, 1);
        img.put_pixel(0, 0, LumaA([0, 0]));
        img.put_pixel(1, 0, LumaA([0, 255]));
        let gray = flatten_to_gray(&DynamicImage::ImageLumaA8(img));
        assert_eq!(gray.get_pixel(0, 0), &Luma([255]));
        assert_eq!(gray.get_pixel(1, 0), &Luma([0]));
    }
}
