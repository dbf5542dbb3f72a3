use log::{debug, info};
use crate::{
    Error,
    command::Command,
    usb::{BulkEndpoint, DeviceKey, UsbBackend, UsbHandle}
};
use super::{PrinterDevice, Transport};

/// Keeps the actual living connection to the device
pub struct OpenConnection<H: UsbHandle> {
    device: PrinterDevice,
    /// Bulk write endpoint
    endpoint: BulkEndpoint,
    /// Device handle, released when the connection is dropped
    handle: H
}

impl<H: UsbHandle> OpenConnection<H> {
    pub fn new(device: PrinterDevice, endpoint: BulkEndpoint, handle: H) -> OpenConnection<H> {
        OpenConnection {
            device,
            endpoint,
            handle
        }
    }

    pub fn device(&self) -> &PrinterDevice {
        &self.device
    }

    pub fn endpoint(&self) -> BulkEndpoint {
        self.endpoint
    }

    pub(crate) fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    fn close(mut self) {
        self.handle.release();
        info!("Disconnected from {}", self.device.name());
    }
}

/// Owner of the one open printer connection
///
/// Opening a new device closes the previous one first. Dropping the manager closes whatever is open.
pub struct ConnectionManager<H: UsbHandle> {
    connection: Option<OpenConnection<H>>,
    transport: Transport
}

impl<H: UsbHandle> ConnectionManager<H> {
    pub fn new(transport: Transport) -> ConnectionManager<H> {
        ConnectionManager {
            connection: None,
            transport
        }
    }

    /// Opens the device, claims the interface of its bulk out endpoint and initializes the printer
    ///
    /// Nothing happens when the device is already connected. On failure no handle is left open.
    pub fn connect<B: UsbBackend<Handle = H>>(&mut self, backend: &B, device: &PrinterDevice) -> Result<(), Error> {
        if self.is_connected_to(&device.key()) {
            return Ok(());
        }
        self.disconnect();

        let mut handle = backend.open(device.usb()).map_err(|e| match e {
            Error::ConnectionFailed(detail) => Error::ConnectionFailed(detail),
            other => Error::ConnectionFailed(other.to_string())
        })?;
        let endpoint = match device.endpoint() {
            Some(endpoint) => endpoint,
            None => {
                handle.release();
                return Err(Error::EndpointNotFound);
            }
        };
        if let Err(e) = handle.claim_interface(endpoint.interface) {
            handle.release();
            return Err(Error::ConnectionFailed(format!("could not claim interface {}, {}", endpoint.interface, e)));
        }
        debug!("Using bulk endpoint {:#04x} on interface {}", endpoint.address, endpoint.interface);

        let mut connection = OpenConnection::new(device.clone(), endpoint, handle);
        if let Err(e) = self.transport.write(&mut connection, Command::Init.as_bytes()) {
            connection.close();
            return Err(e.into());
        }
        info!("Connected to {} ({:04x}:{:04x})", device.name(), device.vendor_id(), device.product_id());
        self.connection = Some(connection);
        Ok(())
    }

    /// Writes through the open connection
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        let transport = &self.transport;
        match self.connection.as_mut() {
            Some(connection) => Ok(transport.write(connection, bytes)?),
            // Torn down between connecting and writing
            None => Err(Error::Cancelled)
        }
    }

    /// Closes the connection, if any. Safe to call at any time
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }

    pub fn connection(&self) -> Option<&OpenConnection<H>> {
        self.connection.as_ref()
    }

    pub fn is_connected_to(&self, key: &DeviceKey) -> bool {
        match &self.connection {
            Some(connection) => connection.device.key() == *key,
            None => false
        }
    }
}

impl<H: UsbHandle> Drop for ConnectionManager<H> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
