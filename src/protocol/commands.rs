//! # ESC/POS Printer Commands
//!
//! Command builders for the subset of ESC/POS used to print a fax: printer
//! initialization, line spacing, font selection, style reset, paper feed and
//! the cutter.
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`
//! - Two bytes: `ESC @`, `ESC 2`
//! - Multi-byte with parameters: `ESC 3 n`, `GS V m`, `GS v 0 m xL xH yL yH d...`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`

// ============================================================================
// CONTROL BYTES
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix (graphics, cutter, sizes)
pub const GS: u8 = 0x1D;

/// DLE (Data Link Escape) - Real-time command prefix
pub const DLE: u8 = 0x10;

/// EOT (End Of Transmission) - Used with DLE for status transmission
pub const EOT: u8 = 0x04;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

/// Lines fed before cutting so the last printed line clears the cutter.
pub const CUT_FEED_LINES: u8 = 6;

/// Encode a u16 as little-endian bytes.
#[inline]
pub fn u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Clears the print buffer and resets every mode to its power-on default.
/// This is the hardware-initialize directive sent when trying to wake up a
/// printer that reports itself offline.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ```
/// use directslip::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// Select character code table (ESC t n).
///
/// Table 0 is PC437 (USA, Standard Europe) on every ESC/POS printer.
#[inline]
pub fn select_cp437() -> Vec<u8> {
    vec![ESC, b't', 0]
}

// ============================================================================
// LINE SPACING
// ============================================================================

/// # Set Line Spacing (ESC 3 n)
///
/// Sets the line spacing to `n` motion units. `0` packs lines as tightly as
/// the font allows.
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC 3 n  |
/// | Hex     | 1B 33 n  |
#[inline]
pub fn line_spacing(n: u8) -> Vec<u8> {
    vec![ESC, b'3', n]
}

/// Restore the default line spacing (ESC 2), about 4.23mm.
#[inline]
pub fn line_spacing_default() -> Vec<u8> {
    vec![ESC, b'2']
}

// ============================================================================
// FONTS AND STYLE
// ============================================================================

/// Character fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    /// Font A: 12×24 dots, 42 columns on 512-dot paper
    #[default]
    A = 0,
    /// Font B: 9×17 dots, 56 columns on 512-dot paper
    B = 1,
}

/// # Select Font (ESC M n)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC M n  |
/// | Hex     | 1B 4D n  |
///
/// ```
/// use directslip::protocol::commands::{font, Font};
///
/// assert_eq!(font(Font::B), vec![0x1B, 0x4D, 0x01]);
/// ```
#[inline]
pub fn font(f: Font) -> Vec<u8> {
    vec![ESC, b'M', f as u8]
}

/// Reset text styling to the printer defaults.
///
/// Left alignment, font A, emphasis off, underline off, normal character
/// size and white-on-black off.
pub fn reset_style() -> Vec<u8> {
    let mut cmds = Vec::with_capacity(18);
    cmds.extend([ESC, b'a', 0]);
    cmds.extend(font(Font::A));
    cmds.extend([ESC, b'E', 0]);
    cmds.extend([ESC, b'-', 0]);
    cmds.extend([GS, b'!', 0]);
    cmds.extend([GS, b'B', 0]);
    cmds
}

// ============================================================================
// PAPER HANDLING
// ============================================================================

/// Print the buffer and feed `n` lines (ESC d n).
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

/// # Feed and Full Cut
///
/// Feeds [`CUT_FEED_LINES`] lines so the last printed line clears the cutter,
/// then performs a full cut (GS V 0).
///
/// ```
/// use directslip::protocol::commands;
///
/// assert_eq!(commands::cut(), vec![0x1B, 0x64, 6, 0x1D, 0x56, 0x00]);
/// ```
pub fn cut() -> Vec<u8> {
    let mut cmds = feed_lines(CUT_FEED_LINES);
    cmds.extend([GS, b'V', 0]);
    cmds
}
