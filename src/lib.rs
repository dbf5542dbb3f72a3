//! Library for printing receipts on usb esc/pos thermal printers
//!
//! A receipt is described semantically with a [ReceiptDocument](crate::ReceiptDocument) (header, order information, a table of items, a summary, a footer), and the [ReceiptEncoder](crate::ReceiptEncoder) turns it into the esc/pos byte stream. The [PrintSession](crate::PrintSession) finds the printer, asks for permission to use it when the platform requires so, connects, and sends the bytes.
//!
//! ```rust,no_run
//! use escpos_receipt::{
//!     PrintSession, PrinterProfile, ReceiptDocument,
//!     SectionEntry, LineItem, Column, Justification
//! };
//!
//! // The default profile recognizes the common receipt printers
//! let session = match PrintSession::with_rusb(PrinterProfile::default()) {
//!     Ok(session) => session,
//!     Err(e) => panic!("Error: {}", e)
//! };
//! let document = ReceiptDocument {
//!     header: vec![LineItem::new("SHOP").align(Justification::Center).bold().large().into()],
//!     table_header: vec![Column::new("Item", 20), Column::new("Qty", 5).align(Justification::Right)].into(),
//!     items: vec![vec![Column::new("Coffee", 20), Column::new("2x", 5).align(Justification::Right)].into()],
//!     summary: vec![SectionEntry::Divider, SectionEntry::text("TOTAL: 5.00")],
//!     ..ReceiptDocument::default()
//! };
//! match session.print_receipt(&document) {
//!     Ok(report) => println!("{}", report.message()),
//!     Err(e) => println!("Error: {}", e)
//! }
//! ```
//!
//! ## Finding the printer
//!
//! Printers are recognized by vendor id, or by a fragment of their usb product name ("thermal", "pos", "receipt"...). The [PrinterProfile](crate::PrinterProfile) structure holds both lists, along with the transfer settings, and can be loaded from a json file.
//!
//! If you are running linux, the `lsusb` command lists the vendor and product ids of the attached devices.
//!
//! ### Orders
//!
//! Point of sale applications usually print from an order. [ReceiptDocument::from_order](crate::ReceiptDocument::from_order) lays an [Order](crate::Order) out in the usual receipt shape, and [Formatter::preview](crate::Formatter::preview) renders any document as plain text, for screens or when no printer is around.
//!
//! Documents implement both Serialize and Deserialize from [serde](https://docs.rs/serde), the json shape being the one received from the user interface layer.

pub use printer::{
    PrintSession, PrinterProfile, PrinterProfileBuilder, PrinterDevice, DeviceLocator,
    PermissionGate, PermissionState, PermissionOutcome, PermissionResponder, PermissionTicket, Admission,
    ConnectionManager, OpenConnection, Transport,
    DeviceDescriptor, Availability, Status, PrintReport, PrintResponse, ConnectionState,
    DEFAULT_VENDORS, DEFAULT_NAME_HINTS, DEFAULT_CHUNK_SIZE
};
pub use receipt::{
    ReceiptDocument, SectionEntry, LineItem, TextSize, TableRow, Column, Justification,
    ReceiptEncoder, EncodedBuffer, Order, OrderLine, ReceiptTemplate
};
pub use formatter::Formatter;
pub use error::{Error, TransferError, Result};

/// Contains raw esc/pos commands
pub mod command;
/// Usb access, behind a trait so the platform stack can be swapped
pub mod usb;
/// Text layout shared by the encoder and the previews
pub mod formatter;

mod printer;
mod receipt;
mod error;
