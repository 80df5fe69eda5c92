//! # Printer Connection
//!
//! Owns the device handle for the one printer this process drives and runs
//! the health check that must pass before every print.
//!
//! ## States
//!
//! ```text
//!            ┌──────────── ensure_ready() ────────────┐
//!            ▼                                        │
//! Unknown ─► Unusable            (backend not usable, no recovery)
//!        ─► OfflineNotFound      (device absent at open)
//!        ─► OfflineUnreachable   (transport error, handle discarded)
//!        ─► NotBooted            (offline after one init + delay)
//!        ─► Online
//! ```
//!
//! Transitions only happen inside [`PrinterConnection::ensure_ready`].
//! Expected device conditions come back as a [`Health`] value; only
//! unclassified driver errors are returned as `Err`.
//!
//! ## Modules
//!
//! - [`profile`]: printer hardware profiles
//! - [`queue`]: single-worker print queue that serializes device access

pub mod profile;
pub mod queue;

use std::fmt;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::driver::{Backend, Device, DeviceIdent, DriverError, PaperLevel};
use crate::ir::Program;

pub use profile::PrinterProfile;
pub use queue::PrintQueue;

/// Wait between the init directive and the second online check.
pub const DEFAULT_BOOT_DELAY: Duration = Duration::from_millis(750);

/// Last known state of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterState {
    Unknown,
    Unusable,
    OfflineNotFound,
    OfflineUnreachable,
    NotBooted,
    Online,
}

/// Outcome of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Ready,
    /// Driver or permission problem; needs an operator.
    Unusable,
    /// No device with the configured identity.
    OfflineNotFound,
    /// The device vanished mid-session.
    OfflineUnreachable,
    /// Present but still offline after the recovery attempt.
    NotBooted,
}

impl Health {
    pub fn is_ready(self) -> bool {
        self == Health::Ready
    }

    /// Connection state this outcome leaves behind.
    pub fn state(self) -> PrinterState {
        match self {
            Health::Ready => PrinterState::Online,
            Health::Unusable => PrinterState::Unusable,
            Health::OfflineNotFound => PrinterState::OfflineNotFound,
            Health::OfflineUnreachable => PrinterState::OfflineUnreachable,
            Health::NotBooted => PrinterState::NotBooted,
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Health::Ready => "ready",
            Health::Unusable => "unusable (missing driver or permissions)",
            Health::OfflineNotFound => "offline (device not found)",
            Health::OfflineUnreachable => "offline (device unreachable)",
            Health::NotBooted => "offline (did not boot in time)",
        };
        f.write_str(text)
    }
}

/// Snapshot returned by [`PrinterConnection::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrinterStatus {
    pub ready: bool,
    pub online: bool,
    /// `None` when the printer is not ready.
    pub paper: Option<PaperLevel>,
    pub health: Health,
}

impl PrinterStatus {
    fn not_ready(health: Health) -> Self {
        Self {
            ready: false,
            online: false,
            paper: None,
            health,
        }
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ready, self.paper) {
            (true, Some(paper)) => write!(f, "ONLINE ✅:\n  PAPER: {}", paper.emoji()),
            _ => f.write_str("OFFLINE ❌"),
        }
    }
}

/// Exclusive owner of the printer handle.
///
/// Opened lazily on the first health check, discarded on transport errors
/// and reopened on the next check. All output to the device goes through
/// [`PrinterConnection::print`].
pub struct PrinterConnection<B: Backend> {
    backend: B,
    ident: DeviceIdent,
    handle: Option<B::Device>,
    state: PrinterState,
    boot_delay: Duration,
}

impl<B: Backend> PrinterConnection<B> {
    pub fn new(backend: B, ident: DeviceIdent) -> Self {
        Self {
            backend,
            ident,
            handle: None,
            state: PrinterState::Unknown,
            boot_delay: DEFAULT_BOOT_DELAY,
        }
    }

    pub fn with_boot_delay(mut self, boot_delay: Duration) -> Self {
        self.boot_delay = boot_delay;
        self
    }

    pub fn state(&self) -> PrinterState {
        self.state
    }

    pub fn ident(&self) -> &DeviceIdent {
        &self.ident
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether a device handle is currently open.
    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Probe the device and attempt one bounded recovery.
    ///
    /// ## Errors
    ///
    /// Only [`DriverError::Other`]; not-found and transport errors are
    /// folded into the returned [`Health`].
    pub fn ensure_ready(&mut self) -> Result<Health, DriverError> {
        let health = match self.probe() {
            Ok(health) => health,
            Err(err) => self.recover(err)?,
        };
        self.transition(health.state());
        Ok(health)
    }

    /// Health check followed by a live status read.
    pub fn status(&mut self) -> Result<PrinterStatus, DriverError> {
        let health = self.ensure_ready()?;
        if !health.is_ready() {
            return Ok(PrinterStatus::not_ready(health));
        }

        match self.read_status() {
            Ok((online, paper)) => Ok(PrinterStatus {
                ready: true,
                online,
                paper: Some(paper),
                health,
            }),
            Err(err) => {
                let health = self.recover(err)?;
                self.transition(health.state());
                Ok(PrinterStatus::not_ready(health))
            }
        }
    }

    /// Send a rendered program to the device.
    ///
    /// Failures are reported to the caller and not retried; the next health
    /// check rediscovers the device state.
    pub fn print(&mut self, program: &Program) -> Result<(), DriverError> {
        debug!(ops = program.len(), "printing program");
        let result = self.device()?.run(program);
        if let Err(err) = &result {
            error!(error = %err, "print failed mid-job");
        }
        result
    }

    fn probe(&mut self) -> Result<Health, DriverError> {
        if !self.backend.is_usable() {
            error!(
                backend = self.backend.name(),
                "Printer KO: missing driver or permissions"
            );
            return Ok(Health::Unusable);
        }

        let boot_delay = self.boot_delay;
        let device = self.device()?;
        if device.is_online()? {
            return Ok(Health::Ready);
        }

        info!("Printer not online, waiting {:?} for it to boot", boot_delay);
        device.initialize()?;
        thread::sleep(boot_delay);

        if device.is_online()? {
            Ok(Health::Ready)
        } else {
            warn!("Printer did not boot in time");
            Ok(Health::NotBooted)
        }
    }

    /// Classify an expected device failure, or hand back anything else.
    fn recover(&mut self, err: DriverError) -> Result<Health, DriverError> {
        match err {
            DriverError::DeviceNotFound { .. } => {
                warn!(device = %self.ident, "Printer KO: unable to open device, it is surely offline");
                self.handle = None;
                Ok(Health::OfflineNotFound)
            }
            DriverError::Transport(e) => {
                warn!(device = %self.ident, error = %e, "Printer KO: device unreachable, likely lost connection");
                self.discard_handle();
                Ok(Health::OfflineUnreachable)
            }
            other => {
                self.transition(PrinterState::Unknown);
                Err(other)
            }
        }
    }

    fn read_status(&mut self) -> Result<(bool, PaperLevel), DriverError> {
        let device = self.device()?;
        let online = device.is_online()?;
        let paper = device.paper_status()?;
        Ok((online, paper))
    }

    /// Borrow the open handle, opening the device first if needed.
    fn device(&mut self) -> Result<&mut B::Device, DriverError> {
        let device = match self.handle.take() {
            Some(device) => device,
            None => {
                debug!(device = %self.ident, backend = self.backend.name(), "opening printer");
                self.backend.open(&self.ident)?
            }
        };
        Ok(self.handle.insert(device))
    }

    /// Best-effort reset and close; the handle is dropped either way.
    fn discard_handle(&mut self) {
        let Some(mut device) = self.handle.take() else {
            return;
        };
        if let Err(e) = device.reset() {
            debug!(error = %e, "reset failed while discarding printer handle");
        }
        if let Err(e) = device.close() {
            debug!(error = %e, "close failed while discarding printer handle");
        }
    }

    fn transition(&mut self, next: PrinterState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, "printer state changed");
            self.state = next;
        }
    }
}

impl<B: Backend> Drop for PrinterConnection<B> {
    fn drop(&mut self) {
        if let Some(mut device) = self.handle.take() {
            if let Err(e) = device.close() {
                debug!(error = %e, "close failed on shutdown");
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
