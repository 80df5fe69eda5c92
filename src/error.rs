//! # Error Types
//!
//! Error types used throughout directslip.
//!
//! | Type | Raised by | Meaning |
//! |------|-----------|---------|
//! | [`JobError`] | job construction, image normalization | caller mistake, never reaches the device |
//! | [`DriverError`] | printer driver | device absent, transport lost, or unclassified |
//! | [`SubmitError`] | submission boundary | every way a submission can be rejected |
//! | [`ConfigError`] | configuration loading | unreadable, malformed or inconsistent config |
//! | [`DirectslipError`] | process setup | config, I/O, server |
//!
//! `SubmitError` messages are meant for end users: they never embed the
//! text of an underlying driver error, which stays reachable through
//! [`std::error::Error::source`].

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

pub use crate::driver::DriverError;
use crate::printer::Health;

/// Errors raised while constructing a fax job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Neither a message nor an image was supplied.
    #[error("Please add a text and/or image to the message")]
    Empty,

    /// The image is not a bitmap we can decode.
    #[error("Unsupported image type")]
    UnsupportedImageType { detail: String },

    /// Downscaling would collapse the image height to zero.
    #[error("Image {width}x{height} cannot be scaled to {max_width} dots wide")]
    ImageDimension {
        width: u32,
        height: u32,
        max_width: u32,
    },
}

/// Errors surfaced to the submission layer.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Please add a text and/or image to the message")]
    Empty,

    #[error("Text message too long, should not exceed {max} characters")]
    MessageTooLong { len: usize, max: usize },

    #[error("Image too large ({width}x{height}), should not exceed {max_width}x{max_height}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("Image too small ({width}x{height}), should be at least {min_width}x{min_height}")]
    ImageTooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    #[error("Unsupported image type")]
    UnsupportedImageType,

    #[error("Image {width}x{height} cannot be scaled to {max_width} dots wide")]
    ImageDimension {
        width: u32,
        height: u32,
        max_width: u32,
    },

    /// The sender is not in the user table.
    #[error("Unknown user")]
    UnknownUser,

    #[error("Too many messages, retry in a minute")]
    RateLimited,

    #[error("FAX OFFLINE ❌: Retry later")]
    PrinterNotReady(Health),

    /// The device failed mid-job after a successful health check.
    #[error("Error while sending message")]
    PrinterTransmit(#[source] DriverError),

    /// Unclassified driver failure.
    #[error("Printer error")]
    PrinterFault(#[source] DriverError),

    #[error("Printer is busy, retry later")]
    QueueFull,

    #[error("Printer did not answer in time")]
    Timeout,

    #[error("Printer worker is not running")]
    WorkerGone,

    #[error("Error while creating message")]
    Internal(String),
}

impl SubmitError {
    /// Whether the caller supplied an invalid submission.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SubmitError::Empty
                | SubmitError::MessageTooLong { .. }
                | SubmitError::ImageTooLarge { .. }
                | SubmitError::ImageTooSmall { .. }
                | SubmitError::UnsupportedImageType
                | SubmitError::ImageDimension { .. }
        )
    }
}

impl From<JobError> for SubmitError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Empty => SubmitError::Empty,
            JobError::UnsupportedImageType { .. } => SubmitError::UnsupportedImageType,
            JobError::ImageDimension {
                width,
                height,
                max_width,
            } => SubmitError::ImageDimension {
                width,
                height,
                max_width,
            },
        }
    }
}

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("{0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid USB id `{raw}`: {source}")]
    UsbId {
        raw: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    #[error("minimum image size {min_width}x{min_height} exceeds maximum {max_width}x{max_height}")]
    ImageBounds {
        min_width: u32,
        min_height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("users must list at least one user")]
    NoUsers,

    #[error("user names must not be empty")]
    EmptyUserName,

    #[error("duplicate user `{0}`")]
    DuplicateUser(String),
}

/// Main error type for process-level operations.
#[derive(Debug, Error)]
pub enum DirectslipError {
    /// Invalid or unreadable configuration file
    #[error("Configuration error in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// Server or device transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_job_error_maps_to_submit_error() {
        let err: SubmitError = JobError::UnsupportedImageType {
            detail: "garbage bytes".into(),
        }
        .into();
        assert!(matches!(err, SubmitError::UnsupportedImageType));
        assert!(err.is_validation());
    }

    #[test]
    fn test_transmit_error_hides_driver_text() {
        let driver = DriverError::Transport(std::io::Error::other("LIBUSB_ERROR_NO_DEVICE"));
        let err = SubmitError::PrinterTransmit(driver);
        assert_eq!(err.to_string(), "Error while sending message");
        assert!(err.source().is_some());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_job_error_is_wrapped_not_flattened() {
        let err: DirectslipError = JobError::ImageDimension {
            width: 2000,
            height: 1,
            max_width: 512,
        }
        .into();
        assert!(matches!(
            err,
            DirectslipError::Job(JobError::ImageDimension { width: 2000, .. })
        ));
        assert_eq!(
            err.to_string(),
            "Image 2000x1 cannot be scaled to 512 dots wide"
        );
    }

    #[test]
    fn test_config_error_names_the_file() {
        let err = DirectslipError::Config {
            path: PathBuf::from("/etc/directslip.json"),
            source: ConfigError::NoUsers,
        };
        assert_eq!(
            err.to_string(),
            "Configuration error in /etc/directslip.json: users must list at least one user"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_message_too_long_display() {
        let err = SubmitError::MessageTooLong { len: 12, max: 10 };
        assert_eq!(
            err.to_string(),
            "Text message too long, should not exceed 10 characters"
        );
    }
}
