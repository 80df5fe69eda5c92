//! # ESC/POS Protocol Implementation
//!
//! Low-level command builders for the ESC/POS protocol spoken by USB receipt
//! printers (Epson TM series and compatibles).
//!
//! ## Module Structure
//!
//! - [`commands`]: Printer control (init, line spacing, fonts, feed, cut)
//! - [`cp437`]: Code Page 437 text encoding and sanitizing
//! - [`graphics`]: Raster bit image commands
//! - [`status`]: Real-time status queries and response decoding
//!
//! ## Usage Example
//!
//! ```
//! use directslip::protocol::{commands, cp437};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(commands::line_spacing(0));
//! data.extend(cp437::encode("Café"));
//! data.push(commands::LF);
//! data.extend(commands::cut());
//! ```

pub mod commands;
pub mod cp437;
pub mod graphics;
pub mod status;
