use std::cmp;
use std::time::Duration;

use log::{debug, warn};
use crate::{
    PrinterProfile, TransferError,
    usb::UsbHandle
};
use super::OpenConnection;

/// Chunked, timeout bounded writes to the bulk out endpoint
#[derive(Clone, Copy, Debug)]
pub struct Transport {
    chunk_size: usize,
    timeout: Duration
}

impl Transport {
    pub fn new(chunk_size: usize, timeout: Duration) -> Transport {
        Transport {
            chunk_size: chunk_size.max(1),
            timeout
        }
    }

    pub fn from_profile(profile: &PrinterProfile) -> Transport {
        Transport::new(profile.chunk_size, profile.write_timeout)
    }

    /// Sends `bytes`, one chunk per bulk transfer
    ///
    /// A short write moves the offset by what the device accepted and the next chunk starts from there. The first failing chunk aborts the whole write, reporting how far it got.
    pub fn write<H: UsbHandle>(&self, connection: &mut OpenConnection<H>, bytes: &[u8]) -> Result<usize, TransferError> {
        let endpoint = connection.endpoint().address;
        let mut offset = 0;
        while offset < bytes.len() {
            let end = cmp::min(offset + self.chunk_size, bytes.len());
            match connection.handle_mut().write_bulk(endpoint, &bytes[offset..end], self.timeout) {
                Ok(0) => {
                    warn!("Printer accepted nothing at offset {}", offset);
                    return Err(TransferError::Stalled { offset });
                },
                Ok(written) => {
                    if written < end - offset {
                        debug!("Short write at offset {}, {} of {} bytes", offset, written, end - offset);
                    }
                    offset += cmp::min(written, end - offset);
                },
                Err(e) => {
                    warn!("Bulk write failed at offset {}: {}", offset, e);
                    return Err(TransferError::ChunkFailed { offset });
                }
            }
        }
        Ok(offset)
    }
}
