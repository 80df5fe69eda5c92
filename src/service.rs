//! # Fax Service
//!
//! The application context: everything a submission needs, constructed once
//! at startup and shared by every request handler.
//!
//! ```text
//! submit ─► strip controls, trim ─► content/length checks ─► rate limiter ─► build job
//!        ─► image bounds ─► print queue ─► worker (health check, print)
//! ```
//!
//! Cheap checks run before the rate limiter so that a malformed submission
//! does not cost the user a slot.

use std::io;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{Config, LimitsSection};
use crate::driver::Backend;
use crate::error::SubmitError;
use crate::job::{FaxJob, ImageSource, TIMESTAMP_FORMAT};
use crate::printer::{PrintQueue, PrinterConnection, PrinterProfile, PrinterStatus};
use crate::protocol::cp437;
use crate::rate_limit::{Admission, RateLimiter};

/// One incoming submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    /// Authenticated user name, if any.
    pub sender: Option<String>,
    pub message: String,
    pub image: Option<ImageSource>,
    /// The image is a scanned paper document.
    pub scan: bool,
}

/// Acknowledgement for a printed fax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub job_id: Uuid,
    pub sender: Option<String>,
    pub received_at: String,
}

impl Receipt {
    fn for_job(job: &FaxJob) -> Self {
        Self {
            job_id: job.id(),
            sender: job.sender().map(str::to_string),
            received_at: job.timestamp().format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

pub struct FaxService {
    title: String,
    limits: LimitsSection,
    /// Paper width the image is fitted to.
    max_width: u32,
    limiter: RateLimiter,
    queue: PrintQueue,
}

impl FaxService {
    pub fn new(config: &Config, queue: PrintQueue) -> Self {
        let profile = PrinterProfile::by_name(&config.printer.profile);
        let limits = config.limits.clone();

        Self {
            title: config.server_title.clone(),
            max_width: limits.max_image_width.min(profile.width_dots),
            limiter: RateLimiter::new(
                config.users.iter().cloned(),
                limits.rate_limit_per_minute,
                limits.rate_window(),
            ),
            limits,
            queue,
        }
    }

    /// Spawn the printer worker for `backend` and build the service around it.
    pub fn start<B: Backend>(config: &Config, backend: B) -> io::Result<Self> {
        let conn = PrinterConnection::new(backend, config.printer.ident())
            .with_boot_delay(config.printer.boot_delay());
        let queue = PrintQueue::spawn(
            conn,
            config.queue.capacity,
            config.queue.submit_timeout(),
        )?;
        Ok(Self::new(config, queue))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn limits(&self) -> &LimitsSection {
        &self.limits
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Validate, rate-limit, build and print one submission.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Receipt, SubmitError> {
        let message = cp437::strip_controls(&request.message).trim().to_string();
        FaxJob::check_content(&message, request.image.is_some())?;

        let len = message.chars().count();
        if len > self.limits.max_message_len {
            return Err(SubmitError::MessageTooLong {
                len,
                max: self.limits.max_message_len,
            });
        }

        let Some(sender) = request.sender else {
            warn!("submission without a user name");
            return Err(SubmitError::UnknownUser);
        };
        match self.limiter.check_at(&sender, Instant::now()) {
            Admission::Admitted => {}
            Admission::Limited { uses } => {
                info!(user = %sender, uses, "submission rate limited");
                return Err(SubmitError::RateLimited);
            }
            Admission::UnknownUser => return Err(SubmitError::UnknownUser),
        }

        let mut builder = FaxJob::builder()
            .sender(sender)
            .message(message)
            .scan(request.scan)
            .max_width(self.max_width);
        if let Some(image) = request.image {
            builder = builder.image(image);
        }

        // Decoding and resampling are CPU-bound
        let job = tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(|e| SubmitError::Internal(e.to_string()))??;

        self.check_image_bounds(&job)?;

        let receipt = Receipt::for_job(&job);
        self.queue.print(job).await?;

        info!(job = %receipt.job_id, user = ?receipt.sender, "fax sent");
        Ok(receipt)
    }

    /// Live printer status, or [`SubmitError::PrinterNotReady`].
    pub async fn status(&self) -> Result<PrinterStatus, SubmitError> {
        let status = self.queue.status().await?;
        if !status.ready {
            return Err(SubmitError::PrinterNotReady(status.health));
        }
        Ok(status)
    }

    fn check_image_bounds(&self, job: &FaxJob) -> Result<(), SubmitError> {
        let Some(image) = job.image() else {
            return Ok(());
        };
        let (width, height) = (image.width(), image.height());
        let limits = &self.limits;

        if width > limits.max_image_width || height > limits.max_image_height {
            return Err(SubmitError::ImageTooLarge {
                width,
                height,
                max_width: limits.max_image_width,
                max_height: limits.max_image_height,
            });
        }
        if width < limits.min_image_width || height < limits.min_image_height {
            return Err(SubmitError::ImageTooSmall {
                width,
                height,
                min_width: limits.min_image_width,
                min_height: limits.min_image_height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DummyBackend;
    use crate::ir::Program;
    use image::{DynamicImage, GrayImage};

    fn service() -> FaxService {
        let config = Config {
            users: vec!["alice".into()],
            ..Config::default()
        };
        FaxService::start(&config, DummyBackend::new()).unwrap()
    }

    fn request(message: &str) -> SubmitRequest {
        SubmitRequest {
            sender: Some("alice".into()),
            message: message.into(),
            ..SubmitRequest::default()
        }
    }

    #[tokio::test]
    async fn test_whitespace_only_is_empty() {
        let err = service().submit(request("  \n\t ")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Empty));
    }

    #[tokio::test]
    async fn test_message_length_counts_characters() {
        let service = service();
        let max = service.limits().max_message_len;

        // Multi-byte characters count once each
        service.submit(request(&"é".repeat(max))).await.unwrap();

        let err = service.submit(request(&"x".repeat(max + 1))).await.unwrap_err();
        assert!(matches!(err, SubmitError::MessageTooLong { .. }));
    }

    #[tokio::test]
    async fn test_missing_sender_is_unknown_user() {
        let err = service()
            .submit(SubmitRequest {
                message: "hi".into(),
                ..SubmitRequest::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::UnknownUser));
    }

    #[tokio::test]
    async fn test_tiny_image_is_rejected() {
        let err = service()
            .submit(SubmitRequest {
                image: Some(DynamicImage::ImageLuma8(GrayImage::new(4, 4)).into()),
                ..request("")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::ImageTooSmall { .. }));
    }

    #[tokio::test]
    async fn test_too_tall_image_is_rejected() {
        let err = service()
            .submit(SubmitRequest {
                image: Some(DynamicImage::ImageLuma8(GrayImage::new(100, 6000)).into()),
                ..request("")
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::ImageTooLarge {
                width: 100,
                height: 6000,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_control_characters_never_reach_the_printer() {
        let backend = DummyBackend::recording();
        let journal = backend.journal().unwrap();
        let config = Config {
            users: vec!["alice".into()],
            ..Config::default()
        };
        let service = FaxService::start(&config, backend).unwrap();

        service
            .submit(request("\x1b@hi\x1dV\x00\nthere\x10\x04\x01"))
            .await
            .unwrap();

        let ops = journal.lock().unwrap().clone();
        let program = Program { ops };
        // Command prefixes are gone, their arguments print as plain text
        assert_eq!(&program.text_lines()[2..], &["@hiV", "there"]);
    }

    #[tokio::test]
    async fn test_controls_only_is_empty() {
        let err = service().submit(request("\x1b\x1d\x10")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Empty));
    }

    #[tokio::test]
    async fn test_submit_returns_receipt() {
        let receipt = service().submit(request("Hello")).await.unwrap();
        assert_eq!(receipt.sender.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_status_ready_with_dummy() {
        let status = service().status().await.unwrap();
        assert_eq!(status.to_string(), "ONLINE ✅:\n  PAPER: ✅");
    }
}
