//! # Fax Jobs
//!
//! A [`FaxJob`] is one submission bound for paper: sender, message, optional
//! image, capture time and framing flags. Construction does the expensive,
//! fallible work (decoding, rotating and scaling the image, restricting the
//! text to CP437) so that [`FaxJob::render`] is a pure transformation into
//! print directives.
//!
//! ## Receipt Layout
//!
//! ```text
//! FROM       : alice               ┐ font B, compact line spacing
//! RECEIVED AT: 2024-05-01T12:30:00 │
//!                                  │ (blank line, only with a message)
//! Hello                            ┘
//!                                  ← default spacing and font restored
//! ▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓▓                 ← feed + raster image, if any
//! ─ ─ ─ ─ ─ ─ ─ ─ ─ cut
//! ```
//!
//! ## Example
//!
//! ```
//! use directslip::job::FaxJob;
//!
//! let job = FaxJob::builder().sender("alice").message("Hello").build()?;
//! let program = job.render();
//! assert_eq!(program.text_lines()[2], "Hello");
//! # Ok::<(), directslip::error::JobError>(())
//! ```

use chrono::{Local, NaiveDateTime};
use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;
use uuid::Uuid;

use crate::error::JobError;
use crate::ir::{Op, Program};
use crate::protocol::commands::Font;
use crate::protocol::cp437;
use crate::render::{self, image::DEFAULT_MAX_WIDTH};

/// Printed when a job has no sender.
pub const UNKNOWN_SENDER: &str = "<UNKNOWN>";

/// Local time, second precision, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Image as handed in by the caller.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Already decoded.
    Bitmap(DynamicImage),
    /// Encoded file contents (PNG, JPEG, ...), decoded at construction.
    Encoded(Vec<u8>),
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        ImageSource::Bitmap(image)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Encoded(bytes)
    }
}

/// One submission, immutable once built.
#[derive(Debug, Clone)]
pub struct FaxJob {
    id: Uuid,
    sender: Option<String>,
    message: String,
    image: Option<DynamicImage>,
    timestamp: NaiveDateTime,
    force_portrait: bool,
    is_scan: bool,
}

impl FaxJob {
    pub fn builder() -> FaxJobBuilder {
        FaxJobBuilder::default()
    }

    /// Reject a submission that has neither text nor image.
    ///
    /// Lives outside the builder so that generated jobs are never subject to
    /// it; the submission boundary calls it on the trimmed message.
    pub fn check_content(message: &str, has_image: bool) -> Result<(), JobError> {
        if message.is_empty() && !has_image {
            return Err(JobError::Empty);
        }
        Ok(())
    }

    /// The built-in test receipt printed by `directslip test-print`.
    pub fn test_job() -> Result<Self, JobError> {
        Self::builder()
            .sender("TEST_USER")
            .message("THIS IS A TEST MESSAGE")
            .image(test_image())
            .build()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// Message text, already restricted to CP437.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Normalized image.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn force_portrait(&self) -> bool {
        self.force_portrait
    }

    pub fn is_scan(&self) -> bool {
        self.is_scan
    }

    /// The two header lines.
    pub fn header_lines(&self) -> [String; 2] {
        [
            format!("FROM       : {}", self.sender().unwrap_or(UNKNOWN_SENDER)),
            format!("RECEIVED AT: {}", self.timestamp.format(TIMESTAMP_FORMAT)),
        ]
    }

    /// Render into print directives. Same job, same program.
    pub fn render(&self) -> Program {
        let mut program = Program::new();

        program.push(Op::SetLineSpacing(Some(0)));
        program.push(Op::SetFont(Font::B));
        program.extend(self.header_lines().into_iter().map(Op::TextLine));

        if !self.message.is_empty() {
            program.push(Op::Newline);
            program.extend(self.message.lines().map(|line| Op::TextLine(line.to_string())));
        }

        program.push(Op::SetLineSpacing(None));
        program.push(Op::ResetStyle);

        if let Some(image) = &self.image {
            program.push(Op::Newline);
            program.push(render::raster_op(image));
        }

        program.push(Op::Cut);
        program
    }
}

/// Builder for [`FaxJob`].
#[derive(Debug, Clone)]
pub struct FaxJobBuilder {
    sender: Option<String>,
    message: String,
    image: Option<ImageSource>,
    timestamp: Option<NaiveDateTime>,
    force_portrait: bool,
    is_scan: bool,
    max_width: u32,
}

impl Default for FaxJobBuilder {
    fn default() -> Self {
        Self {
            sender: None,
            message: String::new(),
            image: None,
            timestamp: None,
            force_portrait: false,
            is_scan: false,
            max_width: DEFAULT_MAX_WIDTH,
        }
    }
}

impl FaxJobBuilder {
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn image(mut self, image: impl Into<ImageSource>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Capture time; defaults to now.
    pub fn timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Keep landscape images landscape.
    pub fn force_portrait(mut self, force: bool) -> Self {
        self.force_portrait = force;
        self
    }

    /// Mark the image as a scanned paper document.
    pub fn scan(mut self, is_scan: bool) -> Self {
        self.is_scan = is_scan;
        self
    }

    /// Paper width in dots the image is scaled to.
    pub fn max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self
    }

    /// Decode and normalize the image, sanitize the text.
    ///
    /// ## Errors
    ///
    /// - [`JobError::UnsupportedImageType`]: the bytes are not a decodable image
    /// - [`JobError::ImageDimension`]: the image cannot be fitted to the paper
    pub fn build(self) -> Result<FaxJob, JobError> {
        let image = match self.image {
            Some(source) => Some(prepare_image(
                source,
                self.max_width,
                self.force_portrait,
                self.is_scan,
            )?),
            None => None,
        };

        Ok(FaxJob {
            id: Uuid::new_v4(),
            sender: self
                .sender
                .filter(|s| !s.is_empty())
                .map(|s| cp437::sanitize(&s)),
            message: cp437::sanitize(&self.message),
            image,
            timestamp: self
                .timestamp
                .unwrap_or_else(|| Local::now().naive_local()),
            force_portrait: self.force_portrait,
            is_scan: self.is_scan,
        })
    }
}

fn prepare_image(
    source: ImageSource,
    max_width: u32,
    force_portrait: bool,
    is_scan: bool,
) -> Result<DynamicImage, JobError> {
    let decoded = match source {
        ImageSource::Bitmap(image) => image,
        ImageSource::Encoded(bytes) => {
            image::load_from_memory(&bytes).map_err(|e| JobError::UnsupportedImageType {
                detail: e.to_string(),
            })?
        }
    };

    let normalized = render::image::normalize(&decoded, max_width, force_portrait)?;

    // Raster directives carry 16-bit dimensions
    let (width, height) = (normalized.width(), normalized.height());
    if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
        return Err(JobError::ImageDimension {
            width,
            height,
            max_width,
        });
    }

    if is_scan {
        debug!("scan cleanup requested, printing image as is");
    }

    Ok(normalized)
}

/// Framed diagonal gradient, portrait, fits every profile.
fn test_image() -> DynamicImage {
    const WIDTH: u32 = 240;
    const HEIGHT: u32 = 320;
    const FRAME: u32 = 6;

    let image = GrayImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let on_frame = x < FRAME || y < FRAME || x >= WIDTH - FRAME || y >= HEIGHT - FRAME;
        if on_frame {
            Luma([0])
        } else {
            Luma([((x + y) * 255 / (WIDTH + HEIGHT)) as u8])
        }
    });
    DynamicImage::ImageLuma8(image)
}

// ============================================================================
// TESTS
// ============================================================================
