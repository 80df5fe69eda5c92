//! # Rendering Module
//!
//! Image preparation for the printer.
//!
//! - [`image`]: orientation and downscaling to the paper width
//! - [`dither`]: 1-bit conversion and row packing for raster directives

pub mod dither;
pub mod image;

use ::image::DynamicImage;

use crate::ir::Op;

/// Convert a normalized image into a raster directive.
pub fn raster_op(img: &DynamicImage) -> Op {
    let gray = dither::flatten_to_gray(img);
    let width = gray.width() as u16;
    let height = gray.height() as u16;
    Op::Raster {
        width,
        height,
        data: dither::floyd_steinberg(&gray),
    }
}
