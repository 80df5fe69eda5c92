//! # Configuration
//!
//! directslip reads one JSON file. Every section and key is optional and
//! falls back to a default; unknown keys are rejected so typos surface at
//! startup instead of being silently ignored.
//!
//! ## Example
//!
//! ```json
//! {
//!   "server_title": "Office Fax",
//!   "listen_addr": "0.0.0.0:7860",
//!   "log_level": "debug",
//!   "printer": {
//!     "vendor_id": "0x04b8",
//!     "product_id": "0x0202",
//!     "profile": "TM-T88V",
//!     "backend": "usblp"
//!   },
//!   "limits": { "rate_limit_per_minute": 5 },
//!   "queue": { "capacity": 4 },
//!   "users": ["alice", "bob"]
//! }
//! ```
//!
//! The core never sees raw JSON: [`Config::load`] deserializes and then
//! [`Config::validate`]s, and components receive the typed sections.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::driver::DeviceIdent;
use crate::printer::PrinterProfile;
use crate::error::{ConfigError, DirectslipError};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Title shown by the API's health endpoint.
    pub server_title: String,

    /// Address the HTTP server binds to.
    pub listen_addr: String,

    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_level: String,

    pub printer: PrinterSection,

    pub limits: LimitsSection,

    pub queue: QueueSection,

    /// Known user names. Submissions from anyone else are rejected.
    pub users: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_title: "DirectSlip".into(),
            listen_addr: "127.0.0.1:7860".into(),
            log_level: "info".into(),
            printer: PrinterSection::default(),
            limits: LimitsSection::default(),
            queue: QueueSection::default(),
            users: vec!["admin".into()],
        }
    }
}

/// Which driver backend talks to the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Linux USB printer class (`/dev/usb/lp*`).
    Usblp,
    /// Log directives instead of printing.
    Dummy,
}

/// The printer this process drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrinterSection {
    /// USB vendor ID, as a number or a `"0x04b8"` hex string.
    #[serde(deserialize_with = "usb_id")]
    pub vendor_id: u16,

    /// USB product ID, same formats as `vendor_id`.
    #[serde(deserialize_with = "usb_id")]
    pub product_id: u16,

    /// Printer profile name (see [`crate::printer::profile`]).
    pub profile: String,

    pub backend: BackendKind,

    /// Open this node instead of searching sysfs.
    pub device_path: Option<String>,

    /// Wait after the init directive before re-checking.
    pub boot_delay_ms: u64,

    /// Wait for a status byte before declaring the printer silent.
    pub status_timeout_ms: u64,
}

impl Default for PrinterSection {
    fn default() -> Self {
        Self {
            vendor_id: 0x04b8,
            product_id: 0x0202,
            profile: "default".into(),
            backend: BackendKind::Usblp,
            device_path: None,
            boot_delay_ms: 750,
            status_timeout_ms: 500,
        }
    }
}

impl PrinterSection {
    pub fn ident(&self) -> DeviceIdent {
        DeviceIdent {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            profile: self.profile.clone(),
        }
    }

    pub fn boot_delay(&self) -> Duration {
        Duration::from_millis(self.boot_delay_ms)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }
}

/// Submission limits enforced at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsSection {
    /// Accepted submissions per user and window; 0 disables limiting.
    pub rate_limit_per_minute: usize,

    pub rate_window_secs: u64,

    /// Characters, counted after trimming.
    pub max_message_len: usize,

    pub max_image_width: u32,
    pub max_image_height: u32,
    pub min_image_width: u32,
    pub min_image_height: u32,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 0,
            rate_window_secs: 60,
            max_message_len: PrinterProfile::DEFAULT.max_message_len(),
            max_image_width: 512,
            max_image_height: 512 * 10,
            min_image_width: 8,
            min_image_height: 8,
        }
    }
}

impl LimitsSection {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }
}

/// Print queue sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueSection {
    /// Tasks waiting for the printer before submissions are turned away.
    pub capacity: usize,

    /// How long a submitter waits for its job.
    pub submit_timeout_secs: u64,
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            capacity: 8,
            submit_timeout_secs: 60,
        }
    }
}

impl QueueSection {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}

impl Config {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, DirectslipError> {
        let in_file = |source: ConfigError| DirectslipError::Config {
            path: path.to_path_buf(),
            source,
        };

        let raw = fs::read_to_string(path).map_err(|e| in_file(e.into()))?;
        Self::from_json(&raw).map_err(in_file)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;

        if limits.rate_window_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "limits.rate_window_secs",
            });
        }
        if limits.max_image_width == 0 {
            return Err(ConfigError::NotPositive {
                field: "limits.max_image_width",
            });
        }
        if limits.max_image_height == 0 {
            return Err(ConfigError::NotPositive {
                field: "limits.max_image_height",
            });
        }
        if limits.min_image_width > limits.max_image_width
            || limits.min_image_height > limits.max_image_height
        {
            return Err(ConfigError::ImageBounds {
                min_width: limits.min_image_width,
                min_height: limits.min_image_height,
                max_width: limits.max_image_width,
                max_height: limits.max_image_height,
            });
        }
        if self.queue.capacity == 0 {
            return Err(ConfigError::NotPositive {
                field: "queue.capacity",
            });
        }
        if self.users.is_empty() {
            return Err(ConfigError::NoUsers);
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if user.trim().is_empty() {
                return Err(ConfigError::EmptyUserName);
            }
            if !seen.insert(user.as_str()) {
                return Err(ConfigError::DuplicateUser(user.clone()));
            }
        }

        Ok(())
    }

    /// Flattened `key = value` pairs for the startup dump.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(value) = serde_json::to_value(self) {
            flatten("", &value, &mut out);
        }
        out
    }
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&key, value, out);
            }
        }
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

/// Parse a USB ID: `"0x04b8"` / `"0X04B8"` as hex, anything else as decimal.
pub fn parse_usb_id(raw: &str) -> Result<u16, ConfigError> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|source| ConfigError::UsbId {
        raw: raw.to_string(),
        source,
    })
}

fn usb_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u16),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => parse_usb_id(&text).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_is_all_defaults() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.limits.max_message_len, 11200);
        assert_eq!(config.limits.max_image_height, 5120);
        assert_eq!(config.printer.boot_delay(), Duration::from_millis(750));
        assert_eq!(config.users, vec!["admin".to_string()]);
    }

    #[test]
    fn test_usb_ids_accept_hex_strings_and_numbers() {
        let config = Config::from_json(
            r#"{"printer": {"vendor_id": "0x0416", "product_id": 20497}}"#,
        )
        .unwrap();
        assert_eq!(config.printer.vendor_id, 0x0416);
        assert_eq!(config.printer.product_id, 0x5011);
    }

    #[test]
    fn test_bad_usb_id() {
        let err = Config::from_json(r#"{"printer": {"vendor_id": "0xZZZZ"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("invalid USB id `0xZZZZ`"), "{}", err);

        assert!(matches!(
            parse_usb_id("70000"),
            Err(ConfigError::UsbId { ref raw, .. }) if raw == "70000"
        ));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Config::from_json(r#"{"limits": {"max_msg_len": 5}}"#).unwrap_err();
        assert!(err.to_string().contains("max_msg_len"), "{}", err);
    }

    #[test]
    fn test_backend_flag() {
        let config = Config::from_json(r#"{"printer": {"backend": "dummy"}}"#).unwrap();
        assert_eq!(config.printer.backend, BackendKind::Dummy);
    }

    #[test]
    fn test_validation_failures() {
        for doc in [
            r#"{"limits": {"rate_window_secs": 0}}"#,
            r#"{"limits": {"max_image_width": 0}}"#,
            r#"{"limits": {"min_image_height": 6000}}"#,
            r#"{"queue": {"capacity": 0}}"#,
            r#"{"users": []}"#,
            r#"{"users": ["alice", " "]}"#,
            r#"{"users": ["alice", "alice"]}"#,
        ] {
            assert!(Config::from_json(doc).is_err(), "accepted {}", doc);
        }
    }

    #[test]
    fn test_validation_errors_are_typed() {
        assert!(matches!(
            Config::from_json(r#"{"queue": {"capacity": 0}}"#),
            Err(ConfigError::NotPositive {
                field: "queue.capacity"
            })
        ));
        assert!(matches!(
            Config::from_json(r#"{"users": ["alice", "alice"]}"#),
            Err(ConfigError::DuplicateUser(ref user)) if user == "alice"
        ));
        assert!(matches!(
            Config::from_json(r#"{"limits": {"min_image_height": 6000}}"#),
            Err(ConfigError::ImageBounds {
                min_height: 6000,
                max_height: 5120,
                ..
            })
        ));
    }

    #[test]
    fn test_load_reports_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directslip.json");
        fs::write(&path, r#"{"users": []}"#).unwrap();

        match Config::load(&path).unwrap_err() {
            DirectslipError::Config { path: reported, source } => {
                assert_eq!(reported, path);
                assert!(matches!(source, ConfigError::NoUsers));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directslip.json");
        fs::write(&path, r#"{"users": ["alice"], "limits": {"rate_limit_per_minute": 2}}"#)
            .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.users, vec!["alice".to_string()]);
        assert_eq!(config.limits.rate_limit_per_minute, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/directslip.json")).unwrap_err();
        assert!(matches!(
            err,
            DirectslipError::Config {
                source: ConfigError::Read(_),
                ..
            }
        ));
    }

    #[test]
    fn test_entries_are_flattened() {
        let entries = Config::default().entries();
        assert!(entries.contains(&("printer.vendor_id".to_string(), "1208".to_string())));
        assert!(entries.contains(&("limits.max_image_width".to_string(), "512".to_string())));
    }
}
