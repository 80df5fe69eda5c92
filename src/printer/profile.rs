//! # Printer Profiles
//!
//! Hardware characteristics of supported receipt printers, selected by the
//! profile name from the configuration.
//!
//! ## Supported Printers
//!
//! | Profile | Width (dots) | Font B |
//! |---------|--------------|--------|
//! | default | 512 | 56 cols |
//! | TM-T88V | 512 | 56 cols |
//! | TM-T20 | 576 | 64 cols |
//! | TSP650II | 576 | 64 cols |
//!
//! The width bounds the raster image; the font B column count sizes the
//! default message length limit, since messages print in font B.
//!
//! ## Usage
//!
//! ```
//! use directslip::printer::PrinterProfile;
//!
//! let profile = PrinterProfile::by_name("TM-T20");
//! assert_eq!(profile.width_dots, 576);
//! assert_eq!(profile.max_message_len(), 64 * 200);
//! ```

use tracing::warn;

/// Lines of font B text a message may fill by default.
pub const MAX_MESSAGE_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterProfile {
    /// Profile name
    pub name: &'static str,

    /// Maximum print width in dots (pixels)
    pub width_dots: u32,

    /// Characters per line with font B
    pub font_b_columns: u16,
}

impl PrinterProfile {
    /// Generic 80mm ESC/POS printer.
    pub const DEFAULT: Self = Self {
        name: "default",
        width_dots: 512,
        font_b_columns: 56,
    };

    /// # Epson TM-T88V
    ///
    /// 80mm paper, 72mm (512 dots) printable.
    pub const TM_T88V: Self = Self {
        name: "TM-T88V",
        ..Self::DEFAULT
    };

    /// Epson TM-T20, 80mm paper at 203 DPI.
    pub const TM_T20: Self = Self {
        name: "TM-T20",
        width_dots: 576,
        font_b_columns: 64,
    };

    /// Star TSP650II in ESC/POS emulation.
    pub const TSP650II: Self = Self {
        name: "TSP650II",
        ..Self::TM_T20
    };

    const ALL: [Self; 4] = [Self::DEFAULT, Self::TM_T88V, Self::TM_T20, Self::TSP650II];

    /// Look up a profile by name (case-insensitive).
    ///
    /// Unknown names fall back to [`PrinterProfile::DEFAULT`] with a warning.
    pub fn by_name(name: &str) -> Self {
        match Self::ALL
            .iter()
            .find(|profile| profile.name.eq_ignore_ascii_case(name))
        {
            Some(profile) => *profile,
            None => {
                warn!(profile = name, "unknown printer profile, using default");
                Self::DEFAULT
            }
        }
    }

    /// Default message length limit: [`MAX_MESSAGE_LINES`] full font B lines.
    #[inline]
    pub const fn max_message_len(&self) -> usize {
        self.font_b_columns as usize * MAX_MESSAGE_LINES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(PrinterProfile::by_name("tm-t20"), PrinterProfile::TM_T20);
        assert_eq!(PrinterProfile::by_name("tsp650ii").width_dots, 576);
    }

    #[test]
    fn test_unknown_falls_back_to_default() {
        assert_eq!(PrinterProfile::by_name("XP-58"), PrinterProfile::DEFAULT);
    }

    #[test]
    fn test_message_limit_follows_font_b_columns() {
        assert_eq!(PrinterProfile::DEFAULT.max_message_len(), 11200);
        assert_eq!(PrinterProfile::TM_T20.max_message_len(), 12800);
    }
}
