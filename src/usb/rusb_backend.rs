extern crate log;

use std::time::Duration;

use log::{debug, warn};
use rusb::{ConfigDescriptor, Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext};
use crate::{Error, PermissionResponder};
use super::{EndpointDirection, EndpointInfo, InterfaceInfo, TransferKind, UsbBackend, UsbDeviceInfo, UsbHandle};

/// Time allowed for reading string descriptors during enumeration
const STRING_TIMEOUT: Duration = Duration::from_millis(200);

/// libusb backed [UsbBackend](crate::usb::UsbBackend)
///
/// libusb has no permission broker, access rights are settled by the operating system when the device is opened. Every device is then reported as permitted, and a denied access shows up as a connection failure.
pub struct RusbBackend {
    context: Context
}

impl RusbBackend {
    pub fn new() -> Result<RusbBackend, Error> {
        Ok(RusbBackend {
            context: Context::new()?
        })
    }

    fn describe(&self, device: &Device<Context>) -> Result<UsbDeviceInfo, rusb::Error> {
        let descriptor = device.device_descriptor()?;
        let interfaces = match device.active_config_descriptor() {
            Ok(config) => interfaces_of(&config),
            Err(e) => {
                debug!("No active configuration for bus {:03} device {:03}: {}", device.bus_number(), device.address(), e);
                Vec::new()
            }
        };
        let name = read_name(device, &descriptor)
            .unwrap_or_else(|| format!("usb bus {:03} device {:03}", device.bus_number(), device.address()));
        Ok(UsbDeviceInfo {
            vendor_id: descriptor.vendor_id(),
            product_id: descriptor.product_id(),
            bus_number: device.bus_number(),
            address: device.address(),
            name,
            interfaces
        })
    }
}

impl UsbBackend for RusbBackend {
    type Handle = RusbHandle;

    fn devices(&self) -> Result<Vec<UsbDeviceInfo>, Error> {
        let mut found = Vec::new();
        for device in self.context.devices()?.iter() {
            match self.describe(&device) {
                Ok(info) => found.push(info),
                Err(e) => warn!("Skipping bus {:03} device {:03}: {}", device.bus_number(), device.address(), e)
            }
        }
        Ok(found)
    }

    fn has_permission(&self, _device: &UsbDeviceInfo) -> bool {
        true
    }

    fn request_permission(&self, _device: &UsbDeviceInfo, responder: PermissionResponder) {
        responder.grant();
    }

    fn open(&self, device: &UsbDeviceInfo) -> Result<RusbHandle, Error> {
        for candidate in self.context.devices()?.iter() {
            if candidate.bus_number() == device.bus_number && candidate.address() == device.address {
                let handle = candidate.open()?;
                debug!("Opened {:04x}:{:04x} on bus {:03}", device.vendor_id, device.product_id, device.bus_number);
                return Ok(RusbHandle {
                    handle: Some(handle),
                    claimed: Vec::new()
                });
            }
        }
        Err(Error::ConnectionFailed(format!("{} is no longer attached", device.name)))
    }
}

/// Open libusb device
pub struct RusbHandle {
    handle: Option<DeviceHandle<Context>>,
    /// Claimed interfaces, and whether a kernel driver was detached from them
    claimed: Vec<(u8, bool)>
}

impl UsbHandle for RusbHandle {
    fn claim_interface(&mut self, interface: u8) -> Result<(), Error> {
        let handle = match self.handle.as_mut() {
            Some(handle) => handle,
            None => return Err(Error::ConnectionFailed("the device handle was released".to_string()))
        };
        let detached = match handle.kernel_driver_active(interface) {
            Ok(true) => {
                // The kernel is active, we have to detach it
                handle.detach_kernel_driver(interface)?;
                true
            },
            Ok(false) => false,
            Err(_) => {
                warn!("Could not find out if kernel driver is active, might encounter a problem soon.");
                false
            }
        };
        handle.claim_interface(interface)?;
        self.claimed.push((interface, detached));
        Ok(())
    }

    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, Error> {
        match self.handle.as_ref() {
            Some(handle) => Ok(handle.write_bulk(endpoint, data, timeout)?),
            None => Err(Error::ConnectionFailed("the device handle was released".to_string()))
        }
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            for (interface, detached) in self.claimed.drain(..) {
                if let Err(e) = handle.release_interface(interface) {
                    warn!("Failed to release interface {}: {}", interface, e);
                }
                if detached {
                    if let Err(e) = handle.attach_kernel_driver(interface) {
                        debug!("Could not reattach kernel driver to interface {}: {}", interface, e);
                    }
                }
            }
        }
    }
}

impl Drop for RusbHandle {
    fn drop(&mut self) {
        self.release();
    }
}

fn interfaces_of(config: &ConfigDescriptor) -> Vec<InterfaceInfo> {
    let mut interfaces = Vec::new();
    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            interfaces.push(InterfaceInfo {
                number: descriptor.interface_number(),
                endpoints: descriptor.endpoint_descriptors().map(|endpoint| EndpointInfo {
                    address: endpoint.address(),
                    direction: match endpoint.direction() {
                        Direction::In => EndpointDirection::In,
                        Direction::Out => EndpointDirection::Out
                    },
                    transfer_kind: match endpoint.transfer_type() {
                        TransferType::Control => TransferKind::Control,
                        TransferType::Isochronous => TransferKind::Isochronous,
                        TransferType::Bulk => TransferKind::Bulk,
                        TransferType::Interrupt => TransferKind::Interrupt
                    }
                }).collect()
            });
        }
    }
    interfaces
}

/// Manufacturer and product strings, when the device lets us read them
fn read_name(device: &Device<Context>, descriptor: &DeviceDescriptor) -> Option<String> {
    let handle = device.open().ok()?;
    let language = *handle.read_languages(STRING_TIMEOUT).ok()?.first()?;
    let manufacturer = handle.read_manufacturer_string(language, descriptor, STRING_TIMEOUT).ok();
    let product = handle.read_product_string(language, descriptor, STRING_TIMEOUT).ok();
    match (manufacturer, product) {
        (Some(manufacturer), Some(product)) => Some(format!("{} {}", manufacturer.trim(), product.trim())),
        (None, Some(product)) => Some(product.trim().to_string()),
        (Some(manufacturer), None) => Some(manufacturer.trim().to_string()),
        (None, None) => None
    }
}
