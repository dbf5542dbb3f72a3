pub use self::printer_profile::{PrinterProfile, PrinterProfileBuilder, DEFAULT_VENDORS, DEFAULT_NAME_HINTS, DEFAULT_CHUNK_SIZE};
pub use self::locator::{DeviceLocator, PrinterDevice};
pub use self::permission::{PermissionGate, PermissionState, PermissionOutcome, PermissionResponder, PermissionTicket, Admission};
pub use self::connection::{ConnectionManager, OpenConnection};
pub use self::transport::Transport;

mod printer_profile;
mod locator;
mod permission;
mod connection;
mod transport;

extern crate log;

use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use log::{info, warn};
use serde::Serialize;
use crate::{
    Error, Formatter, ReceiptDocument, ReceiptEncoder,
    usb::{RusbBackend, UsbBackend}
};

/// Identification of a printer, as reported to callers
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub device_name: String,
    pub vendor_id: u16,
    pub product_id: u16
}

impl From<&PrinterDevice> for DeviceDescriptor {
    fn from(device: &PrinterDevice) -> DeviceDescriptor {
        DeviceDescriptor {
            device_name: device.name().to_string(),
            vendor_id: device.vendor_id(),
            product_id: device.product_id()
        }
    }
}

/// Answer of [is_available](PrintSession::is_available)
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
    #[serde(flatten)]
    pub device: Option<DeviceDescriptor>
}

/// Answer of [get_status](PrintSession::get_status)
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub connected: bool,
    #[serde(flatten)]
    pub device: Option<DeviceDescriptor>
}

/// A completed print
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrintReport {
    pub bytes_written: usize,
    pub device: DeviceDescriptor
}

impl PrintReport {
    pub fn message(&self) -> String {
        format!("Receipt printed on {} ({} bytes)", self.device.device_name, self.bytes_written)
    }
}

/// Answer of a print request, in the shape callers of the plugin surface expect
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PrintResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

impl From<&Result<PrintReport, Error>> for PrintResponse {
    fn from(result: &Result<PrintReport, Error>) -> PrintResponse {
        match result {
            Ok(report) => PrintResponse {
                success: true,
                message: Some(report.message()),
                error: None
            },
            Err(e) => PrintResponse {
                success: false,
                message: None,
                error: Some(e.to_string())
            }
        }
    }
}

/// Where the session stands, without the handle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    AwaitingPermission(PrinterDevice),
    Connected(PrinterDevice)
}

struct SessionState<B: UsbBackend> {
    manager: ConnectionManager<B::Handle>,
    /// Device whose permission request is in flight
    awaiting: Option<PrinterDevice>
}

impl<B: UsbBackend> SessionState<B> {
    fn reset(&mut self) {
        self.awaiting = None;
        self.manager.disconnect();
    }
}

/// Main escpos-receipt structure
///
/// The session owns the one printer connection of the process. It finds the printer, asks for permission when needed, connects lazily on the first print and keeps the connection for the following ones.
///
/// ```rust,no_run
/// use escpos_receipt::{PrintSession, PrinterProfile, ReceiptDocument, SectionEntry, Column};
///
/// let session = PrintSession::with_rusb(PrinterProfile::default())?;
/// let document = ReceiptDocument {
///     header: vec![SectionEntry::text("Hello, world!")],
///     table_header: vec![Column::new("Item", 20), Column::new("Qty", 5)].into(),
///     ..ReceiptDocument::default()
/// };
/// let report = session.print_receipt(&document)?;
/// println!("{}", report.message());
/// # Ok::<(), escpos_receipt::Error>(())
/// ```
///
/// Prints are serialized: a print started while another one runs fails with `SessionBusy`. A print may block up to the permission timeout while the broker answers, and up to the write timeout per chunk, so keep it off latency sensitive threads.
pub struct PrintSession<B: UsbBackend> {
    backend: B,
    profile: PrinterProfile,
    locator: DeviceLocator,
    gate: PermissionGate,
    encoder: ReceiptEncoder,
    state: Mutex<SessionState<B>>,
    /// Held for the whole duration of a print
    busy: Mutex<()>
}

impl PrintSession<RusbBackend> {
    /// Creates a session over libusb
    pub fn with_rusb(profile: PrinterProfile) -> Result<PrintSession<RusbBackend>, Error> {
        Ok(PrintSession::new(RusbBackend::new()?, profile))
    }
}

impl<B: UsbBackend> PrintSession<B> {
    pub fn new(backend: B, profile: PrinterProfile) -> PrintSession<B> {
        PrintSession {
            locator: DeviceLocator::new(&profile),
            state: Mutex::new(SessionState {
                manager: ConnectionManager::new(Transport::from_profile(&profile)),
                awaiting: None
            }),
            gate: PermissionGate::new(),
            encoder: ReceiptEncoder::new(),
            busy: Mutex::new(()),
            backend,
            profile
        }
    }

    pub fn profile(&self) -> &PrinterProfile {
        &self.profile
    }

    pub fn permission_gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// Looks for a printer
    ///
    /// When permission is already held, the printer is also connected. A printer still waiting for permission, or one that could not be opened, is reported available all the same; no request is sent from here and the next print retries the connection.
    pub fn is_available(&self) -> Result<Availability, Error> {
        let device = match self.locate() {
            Ok(device) => device,
            Err(Error::DeviceNotFound) => return Ok(Availability {
                available: false,
                device: None
            }),
            Err(e) => return Err(e)
        };
        if self.backend.has_permission(device.usb()) {
            let mut state = self.lock_state();
            if let Err(e) = state.manager.connect(&self.backend, &device) {
                warn!("Found {} but could not connect to it: {}", device.name(), e);
                state.reset();
            }
        }
        Ok(Availability {
            available: true,
            device: Some(DeviceDescriptor::from(&device))
        })
    }

    /// Reports the open connection, if any
    pub fn get_status(&self) -> Status {
        let state = self.lock_state();
        match state.manager.connection() {
            Some(connection) => Status {
                connected: true,
                device: Some(DeviceDescriptor::from(connection.device()))
            },
            None => Status {
                connected: false,
                device: None
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        let state = self.lock_state();
        if let Some(connection) = state.manager.connection() {
            ConnectionState::Connected(connection.device().clone())
        } else if let Some(device) = &state.awaiting {
            ConnectionState::AwaitingPermission(device.clone())
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Locates, gets permission, connects if needed, encodes and sends the receipt
    ///
    /// Any failure leaves the session disconnected.
    pub fn print_receipt(&self, document: &ReceiptDocument) -> Result<PrintReport, Error> {
        let _busy = match self.busy.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(Error::SessionBusy),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner()
        };
        let result = self.run_print(document);
        if result.is_err() {
            self.lock_state().reset();
        }
        result
    }

    /// Validates a json document first, see [ReceiptDocument::from_value](crate::ReceiptDocument::from_value)
    pub fn print_receipt_value(&self, document: Option<&serde_json::Value>) -> Result<PrintReport, Error> {
        let document = ReceiptDocument::from_value(document)?;
        self.print_receipt(&document)
    }

    /// Plain text rendering of the receipt, at the profile's paper width
    pub fn preview(&self, document: &ReceiptDocument) -> String {
        Formatter::from_profile(&self.profile).preview(document)
    }

    /// Closes the connection, the next print reconnects
    pub fn disconnect(&self) {
        self.lock_state().manager.disconnect();
    }

    /// Cancels a pending permission request and closes the connection
    ///
    /// A print waiting for permission fails with `Cancelled`, and the broker's answer is ignored when it comes.
    pub fn shutdown(&self) {
        self.gate.cancel_all();
        self.lock_state().reset();
        info!("Print session shut down");
    }

    fn run_print(&self, document: &ReceiptDocument) -> Result<PrintReport, Error> {
        let device = self.locate()?;
        if !self.lock_state().manager.is_connected_to(&device.key()) {
            self.ensure_permission(&device)?;
            self.lock_state().manager.connect(&self.backend, &device)?;
        }
        let encoded = self.encoder.encode(document);
        let bytes_written = self.lock_state().manager.write(encoded.as_bytes())?;
        info!("Printed {} bytes on {}", bytes_written, device.name());
        Ok(PrintReport {
            bytes_written,
            device: DeviceDescriptor::from(&device)
        })
    }

    fn locate(&self) -> Result<PrinterDevice, Error> {
        self.locator.find_candidates(&self.backend)?
            .into_iter()
            .next()
            .ok_or(Error::DeviceNotFound)
    }

    /// Waits for the broker without holding the state lock
    fn ensure_permission(&self, device: &PrinterDevice) -> Result<(), Error> {
        match self.gate.admit(&self.backend, device.usb())? {
            Admission::Granted => Ok(()),
            Admission::Pending(ticket) => {
                self.lock_state().awaiting = Some(device.clone());
                info!("Waiting for permission to use {}", device.name());
                let outcome = self.gate.wait(ticket, self.profile.permission_timeout);
                self.lock_state().awaiting = None;
                outcome
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState<B>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: UsbBackend> Drop for PrintSession<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use serde_json::json;
    use crate::{Column, Justification, LineItem, SectionEntry, TransferError};
    use crate::usb::UsbDeviceInfo;
    use crate::usb::mock::{self, MockBackend, MockWrite, PermissionScript};
    use pretty_assertions::assert_eq;

    fn pos58() -> UsbDeviceInfo {
        mock::printer(0x0416, 0x5011, "POS-58")
    }

    fn document() -> ReceiptDocument {
        ReceiptDocument {
            header: vec![LineItem::new("SHOP").align(Justification::Center).bold().into()],
            table_header: vec![Column::new("Item", 10), Column::new("Qty", 5)].into(),
            items: (0..10).map(|i| vec![Column::new(format!("Item {}", i), 10), Column::new("1", 5)].into()).collect(),
            ..ReceiptDocument::default()
        }
    }

    fn session(backend: MockBackend) -> PrintSession<MockBackend> {
        PrintSession::new(backend, PrinterProfile::default())
    }

    fn wait_for_state(session: &PrintSession<MockBackend>, expected: fn(&ConnectionState) -> bool) {
        for _ in 0..500 {
            if expected(&session.state()) {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("session never reached the expected state, {:?}", session.state());
    }

    #[test]
    fn prints_on_a_permitted_printer() {
        let backend = MockBackend::new(vec![mock::printer(0x046d, 0xc52b, "Mouse"), pos58()], PermissionScript::AlreadyGranted);
        let log = backend.log();
        let session = session(backend);
        let report = session.print_receipt(&document()).unwrap();

        let encoded = ReceiptEncoder::new().encode(&document());
        assert_eq!(report.bytes_written, encoded.len());
        assert_eq!(report.device.device_name, "POS-58");
        let log = log.lock().unwrap();
        let mut expected = vec![0x1b, 0x40];
        expected.extend_from_slice(encoded.as_bytes());
        assert_eq!(log.received(), expected);
        assert!(log.offered.iter().all(|chunk| *chunk <= 64));
        assert_eq!(log.requests, 0);
        drop(log);
        assert_eq!(session.state(), ConnectionState::Connected(PrinterDevice::new(pos58())));
        assert!(session.get_status().connected);
    }

    #[test]
    fn second_print_reuses_the_connection() {
        let backend = MockBackend::new(vec![pos58()], PermissionScript::AlreadyGranted);
        let log = backend.log();
        let session = session(backend);
        session.print_receipt(&document()).unwrap();
        session.print_receipt(&document()).unwrap();
        assert_eq!(log.lock().unwrap().opens, 1);
    }

    #[test]
    fn no_printer_is_device_not_found() {
        let session = session(MockBackend::new(vec![mock::printer(0x046d, 0xc52b, "Mouse")], PermissionScript::AlreadyGranted));
        match session.print_receipt(&document()) {
            Err(Error::DeviceNotFound) => (),
            other => panic!("unexpected {:?}", other)
        }
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn granted_request_resumes_the_print() {
        let backend = MockBackend::new(vec![pos58()], PermissionScript::Grant);
        let log = backend.log();
        let session = session(backend);
        session.print_receipt(&document()).unwrap();
        assert_eq!(log.lock().unwrap().requests, 1);
        assert_eq!(session.permission_gate().state(&pos58().key()), PermissionState::Granted);
    }

    #[test]
    fn denied_request_leaves_the_session_disconnected() {
        let backend = MockBackend::new(vec![pos58()], PermissionScript::Deny);
        let log = backend.log();
        let session = session(backend);
        match session.print_receipt(&document()) {
            Err(Error::PermissionDenied) => (),
            other => panic!("unexpected {:?}", other)
        }
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(log.lock().unwrap().opens, 0);
    }

    #[test]
    fn print_waits_for_a_late_grant() {
        let session = session(MockBackend::new(vec![pos58()], PermissionScript::Hold));
        thread::scope(|scope| {
            let printing = scope.spawn(|| session.print_receipt(&document()));
            wait_for_state(&session, |state| matches!(state, ConnectionState::AwaitingPermission(_)));
            assert_eq!(session.permission_gate().state(&pos58().key()), PermissionState::Requested);
            session.backend.take_responder().unwrap().grant();
            assert!(printing.join().unwrap().is_ok());
        });
        assert!(session.get_status().connected);
    }

    #[test]
    fn concurrent_print_is_session_busy() {
        let session = session(MockBackend::new(vec![pos58()], PermissionScript::Hold));
        thread::scope(|scope| {
            let printing = scope.spawn(|| session.print_receipt(&document()));
            wait_for_state(&session, |state| matches!(state, ConnectionState::AwaitingPermission(_)));
            match session.print_receipt(&document()) {
                Err(Error::SessionBusy) => (),
                other => panic!("unexpected {:?}", other)
            }
            session.backend.take_responder().unwrap().grant();
            assert!(printing.join().unwrap().is_ok());
        });
    }

    #[test]
    fn shutdown_while_awaiting_permission_cancels_the_print() {
        let backend = MockBackend::new(vec![pos58()], PermissionScript::Hold);
        let log = backend.log();
        let session = session(backend);
        thread::scope(|scope| {
            let printing = scope.spawn(|| session.print_receipt(&document()));
            wait_for_state(&session, |state| matches!(state, ConnectionState::AwaitingPermission(_)));
            session.shutdown();
            match printing.join().unwrap() {
                Err(Error::Cancelled) => (),
                other => panic!("unexpected {:?}", other)
            }
        });
        // The broker answers after teardown, nothing resumes
        session.backend.take_responder().unwrap().grant();
        assert_eq!(log.lock().unwrap().opens, 0);
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn permission_timeout_is_reported() {
        let profile = PrinterProfile::builder().with_permission_timeout(Duration::from_millis(20)).build();
        let session = PrintSession::new(MockBackend::new(vec![pos58()], PermissionScript::Hold), profile);
        match session.print_receipt(&document()) {
            Err(Error::PermissionTimeout) => (),
            other => panic!("unexpected {:?}", other)
        }
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn transfer_failure_closes_the_connection() {
        // The init write succeeds, the second receipt chunk fails
        let backend = MockBackend::new(vec![pos58()], PermissionScript::AlreadyGranted)
            .script_writes(vec![MockWrite::Full, MockWrite::Full, MockWrite::Fail]);
        let log = backend.log();
        let session = session(backend);
        match session.print_receipt(&document()) {
            Err(Error::Transfer(TransferError::ChunkFailed { offset })) => assert_eq!(offset, 64),
            other => panic!("unexpected {:?}", other)
        }
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(log.lock().unwrap().releases, 1);
    }

    #[test]
    fn missing_endpoint_is_reported_and_released() {
        let device = mock::device(0x0416, 0x5011, "POS-58", vec![]);
        let backend = MockBackend::new(vec![device], PermissionScript::AlreadyGranted);
        let log = backend.log();
        let session = session(backend);
        match session.print_receipt(&document()) {
            Err(Error::EndpointNotFound) => (),
            other => panic!("unexpected {:?}", other)
        }
        let log = log.lock().unwrap();
        assert_eq!((log.opens, log.releases), (1, 1));
    }

    #[test]
    fn availability_connects_only_with_permission() {
        let session = session(MockBackend::new(vec![pos58()], PermissionScript::Hold));
        let availability = session.is_available().unwrap();
        assert!(availability.available);
        assert_eq!(availability.device.unwrap().vendor_id, 0x0416);
        assert_eq!(session.get_status(), Status { connected: false, device: None });
        assert_eq!(session.backend.requests(), 0);

        let session = self::session(MockBackend::new(vec![pos58()], PermissionScript::AlreadyGranted));
        session.is_available().unwrap();
        assert!(session.get_status().connected);
    }

    #[test]
    fn unopenable_printer_is_still_available() {
        let session = session(MockBackend::new(vec![pos58()], PermissionScript::AlreadyGranted).failing_open());
        let availability = session.is_available().unwrap();
        assert!(availability.available);
        assert_eq!(availability.device.unwrap().device_name, "POS-58");
        assert_eq!(session.state(), ConnectionState::Disconnected);

        let device = mock::device(0x0416, 0x5011, "POS-58", vec![]);
        let backend = MockBackend::new(vec![device], PermissionScript::AlreadyGranted);
        let log = backend.log();
        let session = self::session(backend);
        assert!(session.is_available().unwrap().available);
        assert_eq!(session.get_status(), Status { connected: false, device: None });
        let log = log.lock().unwrap();
        assert_eq!((log.opens, log.releases), (1, 1));
    }

    #[test]
    fn preview_follows_the_profile_width() {
        let document = ReceiptDocument {
            footer: vec![SectionEntry::text("Thank you for shopping")],
            ..ReceiptDocument::default()
        };
        let profile = PrinterProfile::builder().with_paper_columns(10).build();
        let session = PrintSession::new(MockBackend::new(vec![], PermissionScript::AlreadyGranted), profile);
        assert_eq!(session.preview(&document), "\nThank you\nfor\nshopping\n");
    }

    #[test]
    fn nothing_attached_is_unavailable() {
        let session = session(MockBackend::new(vec![], PermissionScript::AlreadyGranted));
        assert_eq!(session.is_available().unwrap(), Availability { available: false, device: None });
    }

    #[test]
    fn json_surface_shapes() {
        let session = session(MockBackend::new(vec![pos58()], PermissionScript::AlreadyGranted));
        let availability = serde_json::to_value(session.is_available().unwrap()).unwrap();
        assert_eq!(availability, json!({"available": true, "deviceName": "POS-58", "vendorId": 0x0416, "productId": 0x5011}));
        assert_eq!(serde_json::to_value(session.get_status()).unwrap()["connected"], json!(true));

        let result = session.print_receipt_value(None);
        match &result {
            Err(Error::MalformedDocument(section)) => assert_eq!(section, "document"),
            other => panic!("unexpected {:?}", other)
        }
        let response = serde_json::to_value(PrintResponse::from(&result)).unwrap();
        assert_eq!(response["success"], json!(false));

        let payload = json!({"tableHeader": [{"text": "Item", "width": 10}], "items": []});
        let result = session.print_receipt_value(Some(&payload));
        assert_eq!(PrintResponse::from(&result).success, true);
    }

    #[test]
    fn dropping_the_session_releases_the_printer() {
        let backend = MockBackend::new(vec![pos58()], PermissionScript::AlreadyGranted);
        let log = backend.log();
        {
            let session = session(backend);
            session.print_receipt(&document()).unwrap();
        }
        assert_eq!(log.lock().unwrap().releases, 1);
    }
}
