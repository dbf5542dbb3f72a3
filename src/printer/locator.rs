use log::debug;
use crate::{
    Error, PrinterProfile,
    usb::{BulkEndpoint, DeviceKey, UsbBackend, UsbDeviceInfo}
};

/// A usb device classified as a receipt printer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrinterDevice {
    usb: UsbDeviceInfo,
    /// Bulk out endpoint found at discovery, if the device has one
    endpoint: Option<BulkEndpoint>
}

impl PrinterDevice {
    pub fn new(usb: UsbDeviceInfo) -> PrinterDevice {
        let endpoint = BulkEndpoint::find(&usb.interfaces);
        PrinterDevice {
            usb,
            endpoint
        }
    }

    pub fn vendor_id(&self) -> u16 {
        self.usb.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.usb.product_id
    }

    pub fn name(&self) -> &str {
        &self.usb.name
    }

    pub fn endpoint(&self) -> Option<BulkEndpoint> {
        self.endpoint
    }

    pub fn key(&self) -> DeviceKey {
        self.usb.key()
    }

    pub fn usb(&self) -> &UsbDeviceInfo {
        &self.usb
    }
}

/// Picks receipt printers out of the attached usb devices
///
/// A device qualifies when its vendor is allowlisted, or when its name contains one of the hints. Enumeration order is kept, so the first candidate is the one to print on.
pub struct DeviceLocator {
    vendor_allowlist: Vec<u16>,
    name_hints: Vec<String>
}

impl DeviceLocator {
    pub fn new(profile: &PrinterProfile) -> DeviceLocator {
        DeviceLocator {
            vendor_allowlist: profile.vendor_allowlist.clone(),
            name_hints: profile.name_hints.iter().map(|hint| hint.to_lowercase()).collect()
        }
    }

    pub fn is_candidate(&self, device: &UsbDeviceInfo) -> bool {
        if self.vendor_allowlist.contains(&device.vendor_id) {
            return true;
        }
        let name = device.name.to_lowercase();
        self.name_hints.iter().any(|hint| name.contains(hint.as_str()))
    }

    /// Candidates among `devices`, in the order given
    pub fn classify<I: IntoIterator<Item = UsbDeviceInfo>>(&self, devices: I) -> Vec<PrinterDevice> {
        devices.into_iter()
            .filter(|device| self.is_candidate(device))
            .map(PrinterDevice::new)
            .collect()
    }

    /// Enumerates the backend, an empty list means no printer is attached
    pub fn find_candidates<B: UsbBackend>(&self, backend: &B) -> Result<Vec<PrinterDevice>, Error> {
        let devices = backend.devices()?;
        let total = devices.len();
        let candidates = self.classify(devices);
        debug!("{} of {} usb devices look like receipt printers", candidates.len(), total);
        Ok(candidates)
    }
}
