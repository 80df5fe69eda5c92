//! # USB Printer Class Backend (Linux)
//!
//! USB receipt printers implement the USB printer class, which the Linux
//! `usblp` driver exposes as `/dev/usb/lpN`. The device node carries the
//! ESC/POS byte stream in both directions: print data goes out, status bytes
//! answering `DLE EOT n` come back.
//!
//! ## Device Discovery
//!
//! `/sys/class/usbmisc/lpN/device` points at the USB interface; its parent
//! directory holds the `idVendor` and `idProduct` attributes of the device.
//! The first `lpN` whose attributes match the configured identity is opened.
//! An explicit device path skips discovery.
//!
//! ## Permissions
//!
//! The node is usually `root:lp` with mode `0660`; add the service user to
//! the `lp` group.
//!
//! ## Chunked Writes
//!
//! Large raster images are written in 4 KiB chunks with a short pause so the
//! printer's receive buffer keeps up.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use super::{Backend, Device, DeviceIdent, DriverError, PaperLevel};
use crate::ir::Op;
use crate::protocol::{commands, status};

/// Class directory listing usblp devices.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/usbmisc";

/// Directory holding the usblp device nodes.
pub const DEFAULT_DEV_ROOT: &str = "/dev/usb";

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// Upper bound on reads while discarding stale input.
const MAX_DRAIN_READS: usize = 16;

/// Default time to wait for a status byte.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// `_IOC(_IOC_NONE, 'P', IOCNR_SOFT_RESET, 0)` from the usblp driver.
#[cfg(unix)]
const LPIOC_SOFT_RESET: u32 = 0x5007;

/// Backend for printers attached through the Linux usblp driver.
#[derive(Debug, Clone)]
pub struct UsblpBackend {
    sysfs_root: PathBuf,
    dev_root: PathBuf,
    device_path: Option<PathBuf>,
    read_timeout: Duration,
}

impl Default for UsblpBackend {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            dev_root: PathBuf::from(DEFAULT_DEV_ROOT),
            device_path: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl UsblpBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always open this node instead of searching sysfs.
    pub fn with_device_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.device_path = Some(path.into());
        self
    }

    /// Time to wait for the answer to a status request.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Search `sysfs_root` for devices and open them under `dev_root`.
    pub fn with_roots(mut self, sysfs_root: impl Into<PathBuf>, dev_root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = sysfs_root.into();
        self.dev_root = dev_root.into();
        self
    }

    fn locate(&self, ident: &DeviceIdent) -> Result<PathBuf, DriverError> {
        if let Some(path) = &self.device_path {
            return Ok(path.clone());
        }

        let found = find_device(
            &self.sysfs_root,
            &self.dev_root,
            ident.vendor_id,
            ident.product_id,
        )
        .map_err(DriverError::Transport)?;

        found.ok_or(DriverError::DeviceNotFound {
            vendor_id: ident.vendor_id,
            product_id: ident.product_id,
        })
    }
}

impl Backend for UsblpBackend {
    type Device = UsblpDevice;

    fn name(&self) -> &'static str {
        "usblp"
    }

    fn is_usable(&self) -> bool {
        match &self.device_path {
            Some(path) => path.parent().is_some_and(Path::is_dir),
            None => self.sysfs_root.is_dir(),
        }
    }

    fn open(&mut self, ident: &DeviceIdent) -> Result<UsblpDevice, DriverError> {
        let path = self.locate(ident)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => DriverError::DeviceNotFound {
                    vendor_id: ident.vendor_id,
                    product_id: ident.product_id,
                },
                _ => DriverError::Transport(e),
            })?;

        debug!(path = %path.display(), "opened printer device");

        Ok(UsblpDevice {
            file,
            read_timeout: self.read_timeout,
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
            codepage_selected: false,
        })
    }
}

/// Find the usblp node whose USB device matches `vendor_id:product_id`.
///
/// A missing `sysfs_root` means no printer-class device is attached.
pub fn find_device(
    sysfs_root: &Path,
    dev_root: &Path,
    vendor_id: u16,
    product_id: u16,
) -> io::Result<Option<PathBuf>> {
    let entries = match fs::read_dir(sysfs_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("lp"))
        .collect();
    names.sort();

    for name in names {
        let usb_device = sysfs_root.join(&name).join("device").join("..");
        let vendor = read_hex_attr(&usb_device.join("idVendor"));
        let product = read_hex_attr(&usb_device.join("idProduct"));
        trace!(%name, ?vendor, ?product, "usblp candidate");

        if vendor == Some(vendor_id) && product == Some(product_id) {
            return Ok(Some(dev_root.join(name)));
        }
    }

    Ok(None)
}

fn read_hex_attr(path: &Path) -> Option<u16> {
    let raw = fs::read_to_string(path).ok()?;
    u16::from_str_radix(raw.trim(), 16).ok()
}

/// An open usblp device node.
pub struct UsblpDevice {
    file: File,
    read_timeout: Duration,
    chunk_size: usize,
    chunk_delay: Duration,
    codepage_selected: bool,
}

impl UsblpDevice {
    /// Write data to the printer, chunking large writes.
    fn write_all(&mut self, data: &[u8]) -> Result<(), DriverError> {
        if data.len() <= self.chunk_size {
            self.file.write_all(data).map_err(DriverError::Transport)?;
        } else {
            for chunk in data.chunks(self.chunk_size) {
                self.file.write_all(chunk).map_err(DriverError::Transport)?;

                if !self.chunk_delay.is_zero() {
                    thread::sleep(self.chunk_delay);
                }
            }
        }

        self.file.flush().map_err(DriverError::Transport)
    }

    /// Send `DLE EOT n` and read the answer. Empty when the printer is silent.
    fn query_status(&mut self, n: u8) -> Result<Vec<u8>, DriverError> {
        self.drain_input()?;
        self.write_all(&status::request(n))?;

        if !poll_readable(&self.file, self.read_timeout).map_err(DriverError::Transport)? {
            return Ok(Vec::new());
        }

        let mut buf = [0u8; 4];
        let read = self.file.read(&mut buf).map_err(DriverError::Transport)?;
        Ok(buf[..read].to_vec())
    }

    /// Discard bytes already waiting, such as a reply that arrived after a
    /// previous query timed out.
    fn drain_input(&mut self) -> Result<(), DriverError> {
        let mut buf = [0u8; 64];
        for _ in 0..MAX_DRAIN_READS {
            if !poll_readable(&self.file, Duration::ZERO).map_err(DriverError::Transport)? {
                break;
            }
            let read = self.file.read(&mut buf).map_err(DriverError::Transport)?;
            if read == 0 {
                break;
            }
            debug!(bytes = read, "discarded stale status bytes");
        }
        Ok(())
    }
}

impl Device for UsblpDevice {
    fn is_online(&mut self) -> Result<bool, DriverError> {
        let response = self.query_status(status::PRINTER_STATUS)?;
        Ok(status::decode_online(&response))
    }

    fn paper_status(&mut self) -> Result<PaperLevel, DriverError> {
        let response = self.query_status(status::PAPER_STATUS)?;
        Ok(status::decode_paper(&response))
    }

    fn initialize(&mut self) -> Result<(), DriverError> {
        self.write_all(&Op::Init.to_bytes())?;
        self.codepage_selected = true;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), DriverError> {
        self.codepage_selected = false;
        soft_reset(&self.file).map_err(DriverError::Transport)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.file.flush().map_err(DriverError::Transport)
    }

    fn execute(&mut self, op: &Op) -> Result<(), DriverError> {
        let mut bytes = Vec::new();
        if matches!(op, Op::TextLine(_)) && !self.codepage_selected {
            bytes.extend(commands::select_cp437());
            self.codepage_selected = true;
        }
        if matches!(op, Op::Init) {
            self.codepage_selected = true;
        }
        bytes.extend(op.to_bytes());
        self.write_all(&bytes)
    }
}

/// Wait until `file` has data to read.
#[cfg(unix)]
fn poll_readable(file: &File, timeout: Duration) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    let mut pfd = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;

    let result = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    if pfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
        return Err(io::Error::new(
            io::ErrorKind::NotConnected,
            "printer device hung up",
        ));
    }
    Ok(result > 0)
}

#[cfg(not(unix))]
fn poll_readable(_file: &File, _timeout: Duration) -> io::Result<bool> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "status polling not supported on this platform",
    ))
}

/// Ask the usblp driver to soft-reset the printer.
#[cfg(unix)]
fn soft_reset(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let result = unsafe { libc::ioctl(file.as_raw_fd(), LPIOC_SOFT_RESET as _) };
    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn soft_reset(_file: &File) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "soft reset not supported on this platform",
    ))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::commands::Font;

    fn ident() -> DeviceIdent {
        DeviceIdent {
            vendor_id: 0x04b8,
            product_id: 0x0202,
            profile: "default".into(),
        }
    }

    /// Fake sysfs entry whose `device/..` resolves to the entry itself.
    fn fake_lp(root: &Path, name: &str, vendor: &str, product: &str) {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("device")).unwrap();
        fs::write(dir.join("idVendor"), format!("{}\n", vendor)).unwrap();
        fs::write(dir.join("idProduct"), format!("{}\n", product)).unwrap();
    }

    #[test]
    fn test_find_device_matches_ids() {
        let sysfs = tempfile::tempdir().unwrap();
        fake_lp(sysfs.path(), "lp0", "0416", "5011");
        fake_lp(sysfs.path(), "lp1", "04b8", "0202");

        let found = find_device(sysfs.path(), Path::new("/dev/usb"), 0x04b8, 0x0202).unwrap();
        assert_eq!(found, Some(PathBuf::from("/dev/usb/lp1")));
    }

    #[test]
    fn test_find_device_no_match() {
        let sysfs = tempfile::tempdir().unwrap();
        fake_lp(sysfs.path(), "lp0", "0416", "5011");

        let found = find_device(sysfs.path(), Path::new("/dev/usb"), 0x04b8, 0x0202).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_missing_sysfs_root_is_not_an_error() {
        let found = find_device(
            Path::new("/nonexistent/usbmisc"),
            Path::new("/dev/usb"),
            1,
            2,
        )
        .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_usable_requires_sysfs_class() {
        let sysfs = tempfile::tempdir().unwrap();
        let backend = UsblpBackend::new().with_roots(sysfs.path(), "/dev/usb");
        assert!(backend.is_usable());

        let backend = UsblpBackend::new().with_roots("/nonexistent/usbmisc", "/dev/usb");
        assert!(!backend.is_usable());
    }

    #[test]
    fn test_open_unknown_device_is_not_found() {
        let sysfs = tempfile::tempdir().unwrap();
        let mut backend = UsblpBackend::new().with_roots(sysfs.path(), "/dev/usb");

        let err = backend.open(&ident()).err().unwrap();
        assert!(matches!(err, DriverError::DeviceNotFound { .. }));
    }

    #[test]
    fn test_open_missing_node_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = UsblpBackend::new().with_device_path(dir.path().join("lp9"));

        let err = backend.open(&ident()).err().unwrap();
        assert!(matches!(err, DriverError::DeviceNotFound { .. }));
    }

    #[test]
    fn test_execute_writes_escpos() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("lp0");
        fs::write(&node, b"").unwrap();

        let mut backend = UsblpBackend::new().with_device_path(&node);
        let mut device = backend.open(&ident()).unwrap();
        device.execute(&Op::SetFont(Font::B)).unwrap();
        device.execute(&Op::TextLine("hé".into())).unwrap();
        device.close().unwrap();

        let written = fs::read(&node).unwrap();
        assert_eq!(
            written,
            vec![0x1B, 0x4D, 0x01, 0x1B, 0x74, 0x00, b'h', 0x82, 0x0A]
        );
    }

    #[test]
    fn test_stale_reply_is_not_taken_as_the_answer() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("lp0");
        // Late "online" bytes from an earlier query are still waiting
        fs::write(&node, [0x12; 5]).unwrap();

        let mut backend = UsblpBackend::new()
            .with_device_path(&node)
            .with_read_timeout(Duration::from_millis(10));
        let mut device = backend.open(&ident()).unwrap();

        assert!(!device.is_online().unwrap());
        let written = fs::read(&node).unwrap();
        assert_eq!(&written[5..], &[0x10, 0x04, 0x01]);
    }

    #[test]
    fn test_silent_device_is_offline() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("lp0");
        fs::write(&node, b"").unwrap();

        let mut backend = UsblpBackend::new()
            .with_device_path(&node)
            .with_read_timeout(Duration::from_millis(10));
        let mut device = backend.open(&ident()).unwrap();

        assert!(!device.is_online().unwrap());
        assert_eq!(device.paper_status().unwrap(), PaperLevel::Ok);
    }
}
