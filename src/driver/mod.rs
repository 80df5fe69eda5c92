//! # Printer Driver Layer
//!
//! The seam between the printer state machine and the physical device.
//!
//! A [`Backend`] knows how to find and open a device by its USB identity; the
//! [`Device`] it returns is an exclusively owned handle that can be queried
//! for status and fed print directives.
//!
//! ## Available Backends
//!
//! - [`usblp`]: Linux USB printer class (`/dev/usb/lp*`)
//! - [`dummy`]: logs directives instead of printing (dry run)
//!
//! ## Error Categories
//!
//! | Variant | When |
//! |---------|------|
//! | [`DriverError::DeviceNotFound`] | no matching device at open time |
//! | [`DriverError::Transport`] | the device vanished mid-session |
//! | [`DriverError::Other`] | anything else; not handled by the health check |

pub mod dummy;
pub mod usblp;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::{Op, Program};

pub use dummy::DummyBackend;
pub use usblp::UsblpBackend;

/// Static identity of the printer this process drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdent {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Printer profile name (see [`crate::printer::profile`])
    pub profile: String,
}

impl fmt::Display for DeviceIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} ({})",
            self.vendor_id, self.product_id, self.profile
        )
    }
}

/// Errors surfaced by printer drivers.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No device with this identity is attached.
    #[error("Printer {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// Communication failed, usually because the device disappeared.
    #[error("Printer communication failed: {0}")]
    Transport(#[source] std::io::Error),

    /// Any other driver failure.
    #[error("Printer driver error: {0}")]
    Other(String),
}

/// Roll paper sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PaperLevel {
    Missing = 0,
    Low = 1,
    Ok = 2,
}

impl PaperLevel {
    /// Emoji used by the status display.
    pub fn emoji(self) -> &'static str {
        match self {
            PaperLevel::Missing => "❌",
            PaperLevel::Low => "⚠️",
            PaperLevel::Ok => "✅",
        }
    }
}

/// Finds and opens printer devices.
pub trait Backend: Send + 'static {
    type Device: Device;

    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Whether the host has what this backend needs (kernel driver,
    /// permissions). An unusable backend cannot be fixed by retrying.
    fn is_usable(&self) -> bool;

    /// Open the device with the given identity.
    fn open(&mut self, ident: &DeviceIdent) -> Result<Self::Device, DriverError>;
}

/// An open printer handle.
pub trait Device: Send {
    fn is_online(&mut self) -> Result<bool, DriverError>;

    fn paper_status(&mut self) -> Result<PaperLevel, DriverError>;

    /// Send the hardware initialize directive.
    fn initialize(&mut self) -> Result<(), DriverError>;

    /// Reset the transport (drops anything buffered on the device side).
    fn reset(&mut self) -> Result<(), DriverError>;

    /// Release the device. The handle must not be used afterwards.
    fn close(&mut self) -> Result<(), DriverError>;

    /// Carry out one print directive.
    fn execute(&mut self, op: &Op) -> Result<(), DriverError>;

    /// Carry out a whole program, stopping at the first failure.
    fn run(&mut self, program: &Program) -> Result<(), DriverError> {
        for op in program {
            self.execute(op)?;
        }
        Ok(())
    }
}
