//! Scripted usb stack for tests

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::{Error, PermissionResponder};
use super::{DeviceKey, EndpointDirection, EndpointInfo, InterfaceInfo, TransferKind, UsbBackend, UsbDeviceInfo, UsbHandle};

/// How the mock broker treats devices
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionScript {
    AlreadyGranted,
    Grant,
    Deny,
    /// Keeps the responder for the test to answer
    Hold
}

/// Answer of one scripted bulk write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockWrite {
    Full,
    Short(usize),
    Fail
}

#[derive(Default)]
pub struct MockLog {
    /// Bytes accepted by each write, in order
    pub writes: Vec<Vec<u8>>,
    /// Length of each chunk that was offered
    pub offered: Vec<usize>,
    pub endpoints: Vec<u8>,
    pub timeouts: Vec<Duration>,
    pub claimed: Vec<u8>,
    pub opens: usize,
    pub releases: usize,
    pub requests: usize,
    script: VecDeque<MockWrite>
}

impl MockLog {
    /// Everything the device accepted, concatenated
    pub fn received(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

pub struct MockBackend {
    devices: Vec<UsbDeviceInfo>,
    permission: PermissionScript,
    permitted: Mutex<HashSet<DeviceKey>>,
    held: Mutex<Vec<PermissionResponder>>,
    open_fails: bool,
    log: Arc<Mutex<MockLog>>
}

impl MockBackend {
    pub fn new(devices: Vec<UsbDeviceInfo>, permission: PermissionScript) -> MockBackend {
        MockBackend {
            devices,
            permission,
            permitted: Mutex::new(HashSet::new()),
            held: Mutex::new(Vec::new()),
            open_fails: false,
            log: Arc::new(Mutex::new(MockLog::default()))
        }
    }

    pub fn failing_open(mut self) -> MockBackend {
        self.open_fails = true;
        self
    }

    /// Queues answers for the next bulk writes, later writes succeed in full
    pub fn script_writes(self, writes: Vec<MockWrite>) -> MockBackend {
        lock(&self.log).script.extend(writes);
        self
    }

    pub fn log(&self) -> Arc<Mutex<MockLog>> {
        self.log.clone()
    }

    pub fn requests(&self) -> usize {
        lock(&self.log).requests
    }

    pub fn take_responder(&self) -> Option<PermissionResponder> {
        self.held.lock().unwrap().pop()
    }
}

impl UsbBackend for MockBackend {
    type Handle = MockHandle;

    fn devices(&self) -> Result<Vec<UsbDeviceInfo>, Error> {
        Ok(self.devices.clone())
    }

    fn has_permission(&self, device: &UsbDeviceInfo) -> bool {
        self.permission == PermissionScript::AlreadyGranted || self.permitted.lock().unwrap().contains(&device.key())
    }

    fn request_permission(&self, device: &UsbDeviceInfo, responder: PermissionResponder) {
        lock(&self.log).requests += 1;
        match self.permission {
            PermissionScript::AlreadyGranted | PermissionScript::Grant => {
                self.permitted.lock().unwrap().insert(device.key());
                responder.grant();
            },
            PermissionScript::Deny => responder.deny(),
            PermissionScript::Hold => self.held.lock().unwrap().push(responder)
        }
    }

    fn open(&self, _device: &UsbDeviceInfo) -> Result<MockHandle, Error> {
        if self.open_fails {
            return Err(Error::Usb(rusb::Error::Access));
        }
        lock(&self.log).opens += 1;
        Ok(MockHandle {
            log: self.log.clone(),
            released: false
        })
    }
}

pub struct MockHandle {
    log: Arc<Mutex<MockLog>>,
    released: bool
}

impl UsbHandle for MockHandle {
    fn claim_interface(&mut self, interface: u8) -> Result<(), Error> {
        lock(&self.log).claimed.push(interface);
        Ok(())
    }

    fn write_bulk(&mut self, endpoint: u8, data: &[u8], timeout: Duration) -> Result<usize, Error> {
        let mut log = lock(&self.log);
        log.offered.push(data.len());
        log.endpoints.push(endpoint);
        log.timeouts.push(timeout);
        let accepted = match log.script.pop_front().unwrap_or(MockWrite::Full) {
            MockWrite::Full => data.len(),
            MockWrite::Short(count) => count.min(data.len()),
            MockWrite::Fail => return Err(Error::Usb(rusb::Error::Timeout))
        };
        log.writes.push(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            lock(&self.log).releases += 1;
        }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock(log: &Mutex<MockLog>) -> MutexGuard<'_, MockLog> {
    log.lock().unwrap()
}

/// A printer with a bulk in endpoint declared before its bulk out endpoint 0x02
pub fn printer(vendor_id: u16, product_id: u16, name: &str) -> UsbDeviceInfo {
    device(vendor_id, product_id, name, vec![InterfaceInfo {
        number: 0,
        endpoints: vec![
            EndpointInfo { address: 0x81, direction: EndpointDirection::In, transfer_kind: TransferKind::Bulk },
            EndpointInfo { address: 0x02, direction: EndpointDirection::Out, transfer_kind: TransferKind::Bulk }
        ]
    }])
}

pub fn device(vendor_id: u16, product_id: u16, name: &str, interfaces: Vec<InterfaceInfo>) -> UsbDeviceInfo {
    UsbDeviceInfo {
        vendor_id,
        product_id,
        bus_number: 1,
        address: (product_id & 0x7f) as u8,
        name: name.to_string(),
        interfaces
    }
}
