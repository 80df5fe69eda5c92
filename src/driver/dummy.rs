//! # Dummy Backend
//!
//! A printer that is always online with paper loaded. Directives are logged
//! instead of being sent anywhere, which makes it the backend for dry runs.
//! [`DummyBackend::recording`] additionally keeps every directive in a
//! journal for inspection; the journal is unbounded, so it is meant for
//! short-lived test runs only.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use super::{Backend, Device, DeviceIdent, DriverError, PaperLevel};
use crate::ir::Op;

/// Directives sent to dummy devices, shared so callers can inspect them.
pub type Journal = Arc<Mutex<Vec<Op>>>;

/// Backend whose devices only log what they are asked to do.
#[derive(Debug, Clone, Default)]
pub struct DummyBackend {
    journal: Option<Journal>,
}

impl DummyBackend {
    /// Log-only backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that also records every executed directive.
    pub fn recording() -> Self {
        Self {
            journal: Some(Journal::default()),
        }
    }

    /// Directives executed by devices from this backend, when recording.
    pub fn journal(&self) -> Option<Journal> {
        self.journal.clone()
    }
}

impl Backend for DummyBackend {
    type Device = DummyDevice;

    fn name(&self) -> &'static str {
        "dummy"
    }

    fn is_usable(&self) -> bool {
        true
    }

    fn open(&mut self, ident: &DeviceIdent) -> Result<DummyDevice, DriverError> {
        info!(%ident, "opened dummy printer");
        Ok(DummyDevice {
            journal: self.journal.clone(),
        })
    }
}

/// Device handle from [`DummyBackend`].
#[derive(Debug)]
pub struct DummyDevice {
    journal: Option<Journal>,
}

impl Device for DummyDevice {
    fn is_online(&mut self) -> Result<bool, DriverError> {
        Ok(true)
    }

    fn paper_status(&mut self) -> Result<PaperLevel, DriverError> {
        Ok(PaperLevel::Ok)
    }

    fn initialize(&mut self) -> Result<(), DriverError> {
        info!("[dummy] initialize");
        Ok(())
    }

    fn reset(&mut self) -> Result<(), DriverError> {
        info!("[dummy] reset");
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        info!("[dummy] close");
        Ok(())
    }

    fn execute(&mut self, op: &Op) -> Result<(), DriverError> {
        match op {
            Op::TextLine(line) => info!("[dummy] {}", line),
            Op::Raster { width, height, .. } => info!("[dummy] raster {}x{}", width, height),
            other => info!("[dummy] {}", other.name()),
        }
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(op.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Program;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dummy_records_program() {
        let mut backend = DummyBackend::recording();
        let journal = backend.journal().unwrap();
        let ident = DeviceIdent {
            vendor_id: 1,
            product_id: 2,
            profile: "default".into(),
        };

        let mut device = backend.open(&ident).unwrap();
        assert!(device.is_online().unwrap());
        assert_eq!(device.paper_status().unwrap(), PaperLevel::Ok);

        let program: Program = [Op::TextLine("hello".into()), Op::Cut].into_iter().collect();
        device.run(&program).unwrap();

        assert_eq!(
            *journal.lock().unwrap(),
            vec![Op::TextLine("hello".into()), Op::Cut]
        );
    }

    #[test]
    fn test_log_only_backend_keeps_nothing() {
        let mut backend = DummyBackend::new();
        assert!(backend.journal().is_none());

        let ident = DeviceIdent {
            vendor_id: 1,
            product_id: 2,
            profile: "default".into(),
        };
        let mut device = backend.open(&ident).unwrap();
        let raster = Op::Raster {
            width: 512,
            height: 2000,
            data: vec![0xAA; 64 * 2000],
        };
        for _ in 0..40 {
            device.execute(&raster).unwrap();
        }

        assert!(device.journal.is_none());
        assert!(backend.journal().is_none());
    }
}
