//! Server state shared across handlers.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::service::FaxService;

/// Application state shared across handlers.
pub struct AppState {
    pub service: FaxService,
    /// Unix timestamp of server boot.
    pub boot_time: u64,
}

impl AppState {
    pub fn new(service: FaxService) -> Self {
        let boot_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self { service, boot_time }
    }
}
