use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use log::{debug, warn};
use crate::{
    Error,
    usb::{DeviceKey, UsbBackend, UsbDeviceInfo}
};

/// Where a device stands with the permission broker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionState {
    Unknown,
    Requested,
    Granted,
    Denied
}

/// Terminal answer of the permission broker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied
}

/// Result of asking the gate for access
pub enum Admission {
    /// Permission was already held
    Granted,
    /// A request went out, wait on the ticket with [PermissionGate::wait](PermissionGate::wait)
    Pending(PermissionTicket)
}

/// Claim on the answer of one outstanding request
pub struct PermissionTicket {
    key: DeviceKey,
    receiver: Receiver<PermissionOutcome>
}

impl PermissionTicket {
    pub fn key(&self) -> DeviceKey {
        self.key
    }
}

#[derive(Default)]
struct GateInner {
    /// One sender per outstanding request
    pending: HashMap<DeviceKey, Sender<PermissionOutcome>>,
    states: HashMap<DeviceKey, PermissionState>
}

/// Answering end of a permission request, handed to the usb backend
///
/// Consumed by the answer, so a request is resolved at most once. Answers arriving after the request was cancelled are dropped.
pub struct PermissionResponder {
    gate: Weak<Mutex<GateInner>>,
    key: DeviceKey
}

impl PermissionResponder {
    pub fn key(&self) -> DeviceKey {
        self.key
    }

    pub fn grant(self) {
        self.respond(PermissionOutcome::Granted)
    }

    pub fn deny(self) {
        self.respond(PermissionOutcome::Denied)
    }

    pub fn respond(self, outcome: PermissionOutcome) {
        let gate = match self.gate.upgrade() {
            Some(gate) => gate,
            None => {
                warn!("Permission outcome for {:04x}:{:04x} arrived after the session ended", self.key.vendor_id, self.key.product_id);
                return;
            }
        };
        let mut inner = lock(&gate);
        match inner.pending.remove(&self.key) {
            Some(sender) => {
                let state = match outcome {
                    PermissionOutcome::Granted => PermissionState::Granted,
                    PermissionOutcome::Denied => PermissionState::Denied
                };
                inner.states.insert(self.key, state);
                if sender.send(outcome).is_err() {
                    debug!("Nobody is waiting for the permission outcome anymore");
                }
            },
            None => warn!("Ignoring late permission outcome for {:04x}:{:04x}", self.key.vendor_id, self.key.product_id)
        }
    }
}

/// Tracks permission requests, at most one outstanding per device
///
/// ```rust
/// use escpos_receipt::{PermissionGate, PermissionState};
/// use escpos_receipt::usb::DeviceKey;
///
/// let gate = PermissionGate::new();
/// let key = DeviceKey { bus_number: 1, address: 4, vendor_id: 0x0416, product_id: 0x5011 };
/// assert_eq!(gate.state(&key), PermissionState::Unknown);
/// ```
pub struct PermissionGate {
    inner: Arc<Mutex<GateInner>>
}

impl Default for PermissionGate {
    fn default() -> PermissionGate {
        PermissionGate::new()
    }
}

impl PermissionGate {
    pub fn new() -> PermissionGate {
        PermissionGate {
            inner: Arc::new(Mutex::new(GateInner::default()))
        }
    }

    pub fn state(&self, key: &DeviceKey) -> PermissionState {
        lock(&self.inner).states.get(key).copied().unwrap_or(PermissionState::Unknown)
    }

    /// Short-circuits when permission is held, otherwise sends a request to the broker
    ///
    /// Fails with `SessionBusy` when a request for the same device is still outstanding.
    pub fn admit<B: UsbBackend>(&self, backend: &B, device: &UsbDeviceInfo) -> Result<Admission, Error> {
        let key = device.key();
        if backend.has_permission(device) {
            lock(&self.inner).states.insert(key, PermissionState::Granted);
            return Ok(Admission::Granted);
        }
        let (sender, receiver) = mpsc::channel();
        {
            let mut inner = lock(&self.inner);
            if inner.pending.contains_key(&key) {
                return Err(Error::SessionBusy);
            }
            inner.pending.insert(key, sender);
            inner.states.insert(key, PermissionState::Requested);
        }
        debug!("Requesting permission for {} ({:04x}:{:04x})", device.name, device.vendor_id, device.product_id);
        // The broker may answer right away, the gate lock must not be held here
        backend.request_permission(device, PermissionResponder {
            gate: Arc::downgrade(&self.inner),
            key
        });
        Ok(Admission::Pending(PermissionTicket {
            key,
            receiver
        }))
    }

    /// Blocks until the broker answers, the timeout elapses, or the request is cancelled
    pub fn wait(&self, ticket: PermissionTicket, timeout: Duration) -> Result<(), Error> {
        match ticket.receiver.recv_timeout(timeout) {
            Ok(outcome) => settle(outcome),
            Err(RecvTimeoutError::Timeout) => self.expire(&ticket),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Cancelled)
        }
    }

    /// Withdraws a request whose wait ran out
    ///
    /// An answer that landed between the timeout and the withdrawal still counts.
    fn expire(&self, ticket: &PermissionTicket) -> Result<(), Error> {
        self.cancel(&ticket.key);
        match ticket.receiver.try_recv() {
            Ok(outcome) => settle(outcome),
            Err(_) => Err(Error::PermissionTimeout)
        }
    }

    /// Forgets the outstanding request for a device, its answer will be ignored
    pub fn cancel(&self, key: &DeviceKey) {
        let mut inner = lock(&self.inner);
        if inner.pending.remove(key).is_some() {
            inner.states.insert(*key, PermissionState::Unknown);
        }
    }

    /// Forgets every outstanding request, waiters wake up with `Cancelled`
    pub fn cancel_all(&self) {
        let mut guard = lock(&self.inner);
        let inner = &mut *guard;
        for (key, _sender) in inner.pending.drain() {
            debug!("Cancelled permission request for {:04x}:{:04x}", key.vendor_id, key.product_id);
            inner.states.insert(key, PermissionState::Unknown);
        }
    }
}

fn settle(outcome: PermissionOutcome) -> Result<(), Error> {
    match outcome {
        PermissionOutcome::Granted => Ok(()),
        PermissionOutcome::Denied => Err(Error::PermissionDenied)
    }
}

fn lock(inner: &Mutex<GateInner>) -> MutexGuard<'_, GateInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
