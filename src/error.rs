use thiserror::Error;

/// Errors that this crate throws.
#[derive(Debug, Error)]
pub enum Error {
    /// No usb device looked like a thermal printer
    #[error("No thermal printer could be found")]
    DeviceNotFound,
    /// The permission broker refused access to the printer
    #[error("Permission to use the printer was denied")]
    PermissionDenied,
    /// The permission broker did not answer in time
    #[error("Timed out waiting for printer permission")]
    PermissionTimeout,
    /// The session was torn down while an operation was waiting on it
    #[error("The print session was closed")]
    Cancelled,
    /// The device handle could not be opened or claimed
    #[error("Could not connect to the printer, {0}")]
    ConnectionFailed(String),
    /// This means no bulk endpoint could be found
    #[error("No bulk out endpoint could be found")]
    EndpointNotFound,
    /// A receipt section is missing or has the wrong shape
    #[error("Malformed receipt document, section {0}")]
    MalformedDocument(String),
    /// Writing to the bulk endpoint failed
    #[error(transparent)]
    Transfer(#[from] TransferError),
    /// Another print is already running on this session
    #[error("Another print is already in progress")]
    SessionBusy,
    /// Error related to rusb
    #[error("rusb error: {0}")]
    Usb(#[from] rusb::Error),
    /// The printer profile could not be loaded
    #[error("Invalid printer profile: {0}")]
    Config(String)
}

/// Failures of the chunked bulk write loop
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransferError {
    /// A chunk write returned an error, `offset` bytes had been sent before it
    #[error("Bulk transfer failed at byte offset {offset}")]
    ChunkFailed {
        offset: usize
    },
    /// A chunk write reported no progress at all
    #[error("Bulk transfer stalled at byte offset {offset}")]
    Stalled {
        offset: usize
    }
}

impl TransferError {
    /// Number of bytes that reached the printer before the failure
    pub fn offset(&self) -> usize {
        match self {
            TransferError::ChunkFailed{offset} => *offset,
            TransferError::Stalled{offset} => *offset
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
