//! Seam between the print session and the operating system's usb stack
//!
//! The session only talks to a [UsbBackend](crate::usb::UsbBackend). [RusbBackend](crate::usb::RusbBackend) is the libusb implementation; platforms with a permission broker plug in their own backend and answer permission requests through the [PermissionResponder](crate::PermissionResponder) they receive.

pub use self::rusb_backend::{RusbBackend, RusbHandle};

#[cfg(test)]
pub(crate) mod mock;
mod rusb_backend;

use std::time::Duration;
use crate::{Error, PermissionResponder};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointDirection {
    /// Device to host
    In,
    /// Host to device
    Out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferKind {
    Control,
    Isochronous,
    Bulk,
    Interrupt
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointInfo {
    /// Endpoint address, direction bit included
    pub address: u8,
    pub direction: EndpointDirection,
    pub transfer_kind: TransferKind
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub number: u8,
    /// Endpoints in declaration order
    pub endpoints: Vec<EndpointInfo>
}

/// Identity of an attached device, stable while it stays plugged in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub bus_number: u8,
    pub address: u8,
    pub vendor_id: u16,
    pub product_id: u16
}

/// What enumeration tells about an attached device
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsbDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus_number: u8,
    pub address: u8,
    /// Advertised product name, or a bus location when the device has none
    pub name: String,
    /// Interfaces of the active configuration, in declaration order
    pub interfaces: Vec<InterfaceInfo>
}

impl UsbDeviceInfo {
    pub fn key(&self) -> DeviceKey {
        DeviceKey {
            bus_number: self.bus_number,
            address: self.address,
            vendor_id: self.vendor_id,
            product_id: self.product_id
        }
    }
}

/// Bulk out endpoint of a printer, and the interface that owns it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BulkEndpoint {
    pub interface: u8,
    pub address: u8
}

impl BulkEndpoint {
    /// First endpoint that is both bulk and host to device, scanning interfaces and endpoints in declaration order
    pub fn find(interfaces: &[InterfaceInfo]) -> Option<BulkEndpoint> {
        interfaces.iter().find_map(|interface| {
            interface.endpoints.iter()
                .find(|endpoint| endpoint.direction == EndpointDirection::Out && endpoint.transfer_kind == TransferKind::Bulk)
                .map(|endpoint| BulkEndpoint {
                    interface: interface.number,
                    address: endpoint.address
                })
        })
    }
}

/// An open device
///
/// Dropping the handle must release it, [release](UsbHandle::release) does the same eagerly and must tolerate being called twice.
pub trait UsbHandle: Send {
    /// Takes the interface away from any kernel driver and claims it
    fn claim_interface(&mut self, interface: u8) -> Result<(), Error>;
    /// Single bulk transfer, returns the number of bytes the device accepted
    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, Error>;
    fn release(&mut self);
}

/// Enumeration, permission and open primitives of a usb stack
pub trait UsbBackend: Send + Sync {
    type Handle: UsbHandle;

    fn devices(&self) -> Result<Vec<UsbDeviceInfo>, Error>;
    /// Whether the device may be opened right now
    fn has_permission(&self, device: &UsbDeviceInfo) -> bool;
    /// Asks the permission broker for access
    ///
    /// The broker answers exactly once, from any thread, through `responder`.
    fn request_permission(&self, device: &UsbDeviceInfo, responder: PermissionResponder);
    fn open(&self, device: &UsbDeviceInfo) -> Result<Self::Handle, Error>;
}
