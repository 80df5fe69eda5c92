//! # ESC/POS Raster Graphics
//!
//! Images are sent with the raster bit image command (`GS v 0`).
//!
//! ## Bit Packing
//!
//! Graphics data is packed as bytes where each bit represents one dot:
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = black (print), 0 = white (no print)
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0x0F = 00001111 = ░░░░████
//! ```
//!
//! ## Chunking
//!
//! Many printers have a small receive buffer and stall (or drop data) on a
//! single tall raster command, so images are split into bands of at most
//! [`MAX_CHUNK_ROWS`] rows, each sent as its own `GS v 0` command.

use super::commands::{GS, u16_le};

/// Maximum rows per raster command.
pub const MAX_CHUNK_ROWS: usize = 256;

/// # Print Raster Bit Image (GS v 0 m xL xH yL yH d1...dk)
///
/// | Parameter | Meaning |
/// |-----------|---------|
/// | m | Scale mode, 0 = normal |
/// | xL xH | Width in **bytes** (little-endian) |
/// | yL yH | Height in dots (little-endian) |
/// | d | `width_bytes * height` bytes of packed rows |
///
/// ## Panics
///
/// Panics in debug builds if `data` does not hold exactly
/// `ceil(width_dots / 8) * height` bytes.
///
/// ```
/// use directslip::protocol::graphics;
///
/// let cmd = graphics::raster(16, 1, &[0xFF, 0x00]);
/// assert_eq!(cmd, vec![0x1D, 0x76, 0x30, 0x00, 0x02, 0x00, 0x01, 0x00, 0xFF, 0x00]);
/// ```
pub fn raster(width_dots: u16, height: u16, data: &[u8]) -> Vec<u8> {
    let width_bytes = width_dots.div_ceil(8);
    debug_assert_eq!(
        data.len(),
        width_bytes as usize * height as usize,
        "raster data length does not match {}x{}",
        width_dots,
        height
    );

    let mut cmd = Vec::with_capacity(8 + data.len());
    cmd.extend([GS, b'v', b'0', 0]);
    cmd.extend(u16_le(width_bytes));
    cmd.extend(u16_le(height));
    cmd.extend_from_slice(data);
    cmd
}

/// Split a packed image into `GS v 0` commands of at most [`MAX_CHUNK_ROWS`] rows.
pub fn raster_chunked(width_dots: u16, height: u16, data: &[u8]) -> Vec<u8> {
    let width_bytes = width_dots.div_ceil(8) as usize;
    let total_height = height as usize;
    let mut out = Vec::with_capacity(data.len() + 8 * total_height.div_ceil(MAX_CHUNK_ROWS));

    let mut row_offset = 0;
    while row_offset < total_height {
        let chunk_height = (total_height - row_offset).min(MAX_CHUNK_ROWS);
        let byte_start = row_offset * width_bytes;
        let byte_end = (row_offset + chunk_height) * width_bytes;
        out.extend(raster(
            width_dots,
            chunk_height as u16,
            &data[byte_start..byte_end],
        ));
        row_offset += chunk_height;
    }

    out
}
