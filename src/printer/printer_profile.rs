extern crate serde;
extern crate serde_json;

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use crate::Error;

/// Vendors known to ship esc/pos receipt printers
pub const DEFAULT_VENDORS: [u16; 6] = [0x0483, 0x04b8, 0x0525, 0x0416, 0x0bda, 0x1a86];

/// Name fragments that give a receipt printer away, compared case-insensitively
pub const DEFAULT_NAME_HINTS: [&str; 7] = ["thermal", "printer", "receipt", "pos", "retsol", "82ue", "82 ue"];

/// Bytes per bulk transfer, the usual full speed packet size
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Details required to find and drive a printer
///
/// Loaded once at startup and shared by the whole session. The defaults recognize the common usb receipt printers; new models are supported by extending the vendor list or the name hints, either through the [builder](PrinterProfile::builder) or a json file.
#[derive(Clone, Debug, PartialEq)]
pub struct PrinterProfile {
    /// Vendor ids accepted regardless of the device name
    pub (crate) vendor_allowlist: Vec<u16>,
    /// Lowercase fragments searched for in the device name
    pub (crate) name_hints: Vec<String>,
    /// Maximum bytes per bulk write
    pub (crate) chunk_size: usize,
    /// Time to wait before giving up writing a chunk to the bulk endpoint
    pub (crate) write_timeout: Duration,
    /// Time to wait for the permission broker
    pub (crate) permission_timeout: Duration,
    /// Paper width, in characters, for text previews
    pub (crate) paper_columns: usize
}

impl Default for PrinterProfile {
    fn default() -> PrinterProfile {
        PrinterProfileBuilder::new().build()
    }
}

impl PrinterProfile {
    /// Creates a [PrinterProfileBuilder](crate::PrinterProfileBuilder) loaded with the defaults
    ///
    /// ```rust
    /// use escpos_receipt::PrinterProfile;
    /// let printer_profile = PrinterProfile::builder()
    ///     .with_vendor(0x6868)
    ///     .with_name_hint("XP-58")
    ///     .build();
    /// assert!(printer_profile.vendor_allowlist().contains(&0x6868));
    /// ```
    pub fn builder() -> PrinterProfileBuilder {
        PrinterProfileBuilder::new()
    }

    /// Reads a profile from json
    ///
    /// Every key is optional, absent keys keep their default. Timeouts are given in milliseconds.
    ///
    /// ```rust
    /// use escpos_receipt::PrinterProfile;
    /// let printer_profile = PrinterProfile::from_json_str(r#"{"vendorAllowlist": [26728], "writeTimeoutMs": 2000}"#).unwrap();
    /// assert_eq!(printer_profile.vendor_allowlist(), &[0x6868]);
    /// assert_eq!(printer_profile.write_timeout().as_millis(), 2000);
    /// ```
    pub fn from_json_str(json: &str) -> Result<PrinterProfile, Error> {
        let file: ProfileFile = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        file.into_profile()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<PrinterProfile, Error> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        PrinterProfile::from_json_str(&json)
    }

    pub fn vendor_allowlist(&self) -> &[u16] {
        &self.vendor_allowlist
    }

    pub fn name_hints(&self) -> &[String] {
        &self.name_hints
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn permission_timeout(&self) -> Duration {
        self.permission_timeout
    }

    pub fn paper_columns(&self) -> usize {
        self.paper_columns
    }
}

/// Helper structure to create a [PrinterProfile](crate::PrinterProfile)
///
/// Builder pattern for the [PrinterProfile](crate::PrinterProfile) structure.
pub struct PrinterProfileBuilder {
    vendor_allowlist: Vec<u16>,
    name_hints: Vec<String>,
    chunk_size: usize,
    write_timeout: Duration,
    permission_timeout: Duration,
    paper_columns: usize
}

impl Default for PrinterProfileBuilder {
    fn default() -> PrinterProfileBuilder {
        PrinterProfileBuilder::new()
    }
}

impl PrinterProfileBuilder {
    /// Default allowlist and hints, 64 byte chunks, 5 seconds per chunk, one minute for permission, 40 columns
    pub fn new() -> PrinterProfileBuilder {
        PrinterProfileBuilder {
            vendor_allowlist: DEFAULT_VENDORS.to_vec(),
            name_hints: DEFAULT_NAME_HINTS.iter().map(|hint| hint.to_string()).collect(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            write_timeout: Duration::from_millis(5000),
            permission_timeout: Duration::from_secs(60),
            paper_columns: 40
        }
    }

    /// Accepts every device of this vendor
    pub fn with_vendor(mut self, vendor_id: u16) -> PrinterProfileBuilder {
        if !self.vendor_allowlist.contains(&vendor_id) {
            self.vendor_allowlist.push(vendor_id);
        }
        self
    }

    /// Accepts devices whose name contains the hint, ignoring case
    pub fn with_name_hint<A: AsRef<str>>(mut self, hint: A) -> PrinterProfileBuilder {
        let hint = hint.as_ref().to_lowercase();
        if !hint.is_empty() && !self.name_hints.contains(&hint) {
            self.name_hints.push(hint);
        }
        self
    }

    /// Drops the default vendors and hints, only the ones added afterwards count
    pub fn without_defaults(mut self) -> PrinterProfileBuilder {
        self.vendor_allowlist.clear();
        self.name_hints.clear();
        self
    }

    /// Maximum bytes per bulk write, zero is taken as one
    pub fn with_chunk_size(mut self, chunk_size: usize) -> PrinterProfileBuilder {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Adds a bulk write timeout, per chunk
    ///
    /// ```rust
    /// use escpos_receipt::PrinterProfileBuilder;
    /// let printer_profile = PrinterProfileBuilder::new()
    ///     .with_write_timeout(std::time::Duration::from_secs(3))
    ///     .build();
    /// ```
    pub fn with_write_timeout(mut self, timeout: Duration) -> PrinterProfileBuilder {
        self.write_timeout = timeout;
        self
    }

    pub fn with_permission_timeout(mut self, timeout: Duration) -> PrinterProfileBuilder {
        self.permission_timeout = timeout;
        self
    }

    pub fn with_paper_columns(mut self, columns: usize) -> PrinterProfileBuilder {
        self.paper_columns = columns;
        self
    }

    /// Build the `PrinterProfile` that lies beneath the builder
    pub fn build(self) -> PrinterProfile {
        PrinterProfile {
            vendor_allowlist: self.vendor_allowlist,
            name_hints: self.name_hints,
            chunk_size: self.chunk_size,
            write_timeout: self.write_timeout,
            permission_timeout: self.permission_timeout,
            paper_columns: self.paper_columns
        }
    }
}

/// On-disk shape of a profile
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ProfileFile {
    vendor_allowlist: Vec<u16>,
    name_hints: Vec<String>,
    chunk_size: usize,
    write_timeout_ms: u64,
    permission_timeout_ms: u64,
    paper_columns: usize
}

impl Default for ProfileFile {
    fn default() -> ProfileFile {
        ProfileFile {
            vendor_allowlist: DEFAULT_VENDORS.to_vec(),
            name_hints: DEFAULT_NAME_HINTS.iter().map(|hint| hint.to_string()).collect(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            write_timeout_ms: 5000,
            permission_timeout_ms: 60_000,
            paper_columns: 40
        }
    }
}

impl ProfileFile {
    fn into_profile(self) -> Result<PrinterProfile, Error> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunkSize must be at least 1".to_string()));
        }
        if self.write_timeout_ms == 0 {
            return Err(Error::Config("writeTimeoutMs must be at least 1".to_string()));
        }
        let builder = PrinterProfileBuilder::new()
            .without_defaults()
            .with_chunk_size(self.chunk_size)
            .with_write_timeout(Duration::from_millis(self.write_timeout_ms))
            .with_permission_timeout(Duration::from_millis(self.permission_timeout_ms))
            .with_paper_columns(self.paper_columns);
        let builder = self.vendor_allowlist.into_iter().fold(builder, |builder, vendor| builder.with_vendor(vendor));
        let builder = self.name_hints.iter().fold(builder, |builder, hint| builder.with_name_hint(hint));
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_common_printers() {
        let profile = PrinterProfile::default();
        assert_eq!(profile.vendor_allowlist(), &[0x0483, 0x04b8, 0x0525, 0x0416, 0x0bda, 0x1a86]);
        assert_eq!(profile.name_hints().len(), 7);
        assert!(profile.name_hints().contains(&"82 ue".to_string()));
        assert_eq!(profile.chunk_size(), 64);
        assert_eq!(profile.write_timeout(), Duration::from_millis(5000));
        assert_eq!(profile.paper_columns(), 40);
    }

    #[test]
    fn hints_are_lowercased_and_deduplicated() {
        let profile = PrinterProfile::builder()
            .without_defaults()
            .with_name_hint("XP-58")
            .with_name_hint("xp-58")
            .with_name_hint("")
            .with_vendor(0x6868)
            .with_vendor(0x6868)
            .build();
        assert_eq!(profile.name_hints(), &["xp-58".to_string()]);
        assert_eq!(profile.vendor_allowlist(), &[0x6868]);
    }

    #[test]
    fn json_keeps_defaults_for_absent_keys() {
        let profile = PrinterProfile::from_json_str(r#"{"nameHints": ["Receipt", "TM-T20"]}"#).unwrap();
        assert_eq!(profile.name_hints(), &["receipt".to_string(), "tm-t20".to_string()]);
        assert_eq!(profile.vendor_allowlist(), PrinterProfile::default().vendor_allowlist());
        assert_eq!(profile.permission_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn json_rejects_unknown_keys_and_zero_chunks() {
        match PrinterProfile::from_json_str(r#"{"vendors": [1]}"#) {
            Err(Error::Config(_)) => (),
            other => panic!("unexpected {:?}", other)
        }
        match PrinterProfile::from_json_str(r#"{"chunkSize": 0}"#) {
            Err(Error::Config(message)) => assert!(message.contains("chunkSize")),
            other => panic!("unexpected {:?}", other)
        }
    }

    #[test]
    fn missing_file_is_a_config_error() {
        match PrinterProfile::from_path("/nonexistent/printer.json") {
            Err(Error::Config(message)) => assert!(message.contains("/nonexistent/printer.json")),
            other => panic!("unexpected {:?}", other)
        }
    }
}
