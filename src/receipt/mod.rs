pub use self::document::{ReceiptDocument, SectionEntry, LineItem, TextSize, TableRow, Column};
pub use self::justification::Justification;
pub use self::encoder::{ReceiptEncoder, EncodedBuffer};
pub use self::order::{Order, OrderLine, ReceiptTemplate};

mod document;
mod justification;
mod encoder;
mod order;
