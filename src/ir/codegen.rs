//! # Code Generation
//!
//! Converts directives to ESC/POS bytes.

use super::ops::{Op, Program};
use crate::protocol::{commands, cp437, graphics};

impl Op {
    /// Compile a single directive to ESC/POS bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Op::Init => {
                let mut out = commands::init();
                out.extend(commands::select_cp437());
                out
            }
            Op::SetLineSpacing(Some(n)) => commands::line_spacing(*n),
            Op::SetLineSpacing(None) => commands::line_spacing_default(),
            Op::SetFont(font) => commands::font(*font),
            Op::ResetStyle => commands::reset_style(),
            Op::TextLine(line) => {
                let mut out = cp437::encode(line);
                out.push(commands::LF);
                out
            }
            Op::Newline => vec![commands::LF],
            Op::Raster {
                width,
                height,
                data,
            } => graphics::raster_chunked(*width, *height, data),
            Op::Cut => commands::cut(),
        }
    }
}

impl Program {
    /// Compile the whole program to ESC/POS bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.ops.iter().flat_map(Op::to_bytes).collect()
    }
}
