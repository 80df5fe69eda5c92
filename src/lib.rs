//! # DirectSlip - Remote Fax on a Receipt Printer
//!
//! DirectSlip accepts short messages and images from known users and prints
//! them on a USB-attached ESC/POS receipt printer. It provides:
//!
//! - **Job rendering**: CP437 text, image rotation, downscaling and dithering
//! - **Printer health**: a probe-and-recover state machine run before every print
//! - **Serialized device access**: a single-worker print queue
//! - **Admission control**: per-user sliding-window rate limiting
//! - **HTTP API**: JSON endpoints for submission and status
//!
//! ## Quick Start
//!
//! ```no_run
//! use directslip::{
//!     driver::{DeviceIdent, UsblpBackend},
//!     job::FaxJob,
//!     printer::PrinterConnection,
//! };
//!
//! let ident = DeviceIdent {
//!     vendor_id: 0x04b8,
//!     product_id: 0x0202,
//!     profile: "TM-T88V".into(),
//! };
//! let mut printer = PrinterConnection::new(UsblpBackend::new(), ident);
//!
//! if printer.ensure_ready()?.is_ready() {
//!     let job = FaxJob::builder().sender("alice").message("Hello").build()?;
//!     printer.print(&job.render())?;
//! }
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | ESC/POS command builders and status decoding |
//! | [`ir`] | Print directives and codegen |
//! | [`render`] | Image normalization and dithering |
//! | [`job`] | Fax jobs and their receipt layout |
//! | [`driver`] | Printer backends (usblp, dummy) |
//! | [`printer`] | Connection state machine, profiles, print queue |
//! | [`rate_limit`] | Per-user admission control |
//! | [`service`] | Submission boundary |
//! | [`server`] | HTTP API |
//! | [`config`] | JSON configuration |
//! | [`error`] | Error types |

pub mod config;
pub mod driver;
pub mod error;
pub mod ir;
pub mod job;
pub mod printer;
pub mod protocol;
pub mod rate_limit;
pub mod render;
pub mod server;
pub mod service;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, DirectslipError, JobError, SubmitError};
pub use job::FaxJob;
pub use printer::{Health, PrinterConnection, PrinterStatus};
pub use service::{FaxService, SubmitRequest};
