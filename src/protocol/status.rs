//! # Real-Time Status (DLE EOT n)
//!
//! ESC/POS printers answer a `DLE EOT n` request with a single status byte,
//! even while their input buffer is busy. Two requests are used:
//!
//! | n | Request | Decoded as |
//! |---|---------|------------|
//! | 1 | Printer status | online / offline |
//! | 4 | Roll paper sensor status | missing / low / ok |
//!
//! A printer that does not answer within the read timeout produces an empty
//! response. An empty printer-status response means offline; an empty paper
//! response is reported as paper OK, because some models never answer `n = 4`.

use super::commands::{DLE, EOT};
use crate::driver::PaperLevel;

/// Printer status request (`n = 1`).
pub const PRINTER_STATUS: u8 = 1;

/// Roll paper sensor status request (`n = 4`).
pub const PAPER_STATUS: u8 = 4;

/// Bit set in the printer status when the printer is offline.
const MASK_OFFLINE: u8 = 0x08;

/// Paper present (fixed bits 1 and 4).
const MASK_PAPER: u8 = 0x12;

/// Paper near end (bits 2 and 3 on top of the fixed bits).
const MASK_LOW_PAPER: u8 = 0x1E;

/// Paper end (bits 5 and 6 on top of the fixed bits).
const MASK_NO_PAPER: u8 = 0x72;

/// Build a `DLE EOT n` status request.
#[inline]
pub fn request(n: u8) -> Vec<u8> {
    vec![DLE, EOT, n]
}

/// Decode a printer status response.
pub fn decode_online(response: &[u8]) -> bool {
    match response.first() {
        Some(status) => status & MASK_OFFLINE == 0,
        None => false,
    }
}

/// Decode a roll paper sensor response.
pub fn decode_paper(response: &[u8]) -> PaperLevel {
    let Some(&status) = response.first() else {
        return PaperLevel::Ok;
    };

    if status & MASK_NO_PAPER == MASK_NO_PAPER {
        PaperLevel::Missing
    } else if status & MASK_LOW_PAPER == MASK_LOW_PAPER {
        PaperLevel::Low
    } else {
        if status & MASK_PAPER != MASK_PAPER {
            tracing::debug!("unexpected paper status byte {:#04x}", status);
        }
        PaperLevel::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_bytes() {
        assert_eq!(request(PRINTER_STATUS), vec![0x10, 0x04, 0x01]);
        assert_eq!(request(PAPER_STATUS), vec![0x10, 0x04, 0x04]);
    }

    #[test]
    fn test_online() {
        // Fixed bits 1 and 4 set, offline bit clear
        assert!(decode_online(&[0x12]));
        assert!(!decode_online(&[0x1A]));
    }

    #[test]
    fn test_no_response_is_offline() {
        assert!(!decode_online(&[]));
    }

    #[test]
    fn test_paper_levels() {
        assert_eq!(decode_paper(&[0x12]), PaperLevel::Ok);
        assert_eq!(decode_paper(&[0x1E]), PaperLevel::Low);
        assert_eq!(decode_paper(&[0x72]), PaperLevel::Missing);
        assert_eq!(decode_paper(&[0x7E]), PaperLevel::Missing);
    }

    #[test]
    fn test_no_paper_response_is_ok() {
        assert_eq!(decode_paper(&[]), PaperLevel::Ok);
    }
}
