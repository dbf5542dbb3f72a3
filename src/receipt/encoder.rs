use log::debug;
use crate::{
    Formatter,
    command::Command,
    formatter::{DIVIDER, COLUMN_SEPARATOR}
};
use super::{ReceiptDocument, SectionEntry, TableRow, TextSize};

/// Bytes produced for a single print request
///
/// Never modified once the encoder hands it out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBuffer {
    bytes: Vec<u8>
}

impl EncodedBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for EncodedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Turns a [ReceiptDocument](crate::ReceiptDocument) into esc/pos bytes
///
/// ```rust
/// use escpos_receipt::{ReceiptEncoder, ReceiptDocument};
///
/// let encoded = ReceiptEncoder::new().encode(&ReceiptDocument::default());
/// // Init, feed, the empty table header, two feeds and the cut
/// assert_eq!(encoded.as_bytes(), &[
///     0x1b, 0x40, 0x0a,
///     0x1b, 0x61, 0x00, 0x1b, 0x21, 0x00, 0x0d, 0x0a,
///     0x0a, 0x0a, 0x1d, 0x56, 0x00
/// ]);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ReceiptEncoder;

impl ReceiptEncoder {
    pub fn new() -> ReceiptEncoder {
        ReceiptEncoder
    }

    /// Encodes the whole document, section by section
    pub fn encode(&self, document: &ReceiptDocument) -> EncodedBuffer {
        let mut feed = Feed::with_capacity(512);
        feed.command(Command::Init);
        feed.command(Command::LineFeed);
        for section in [&document.header, &document.order_info, &document.title].iter() {
            for entry in section.iter() {
                feed.entry(entry);
            }
        }
        feed.row(&document.table_header);
        for row in &document.items {
            feed.row(row);
        }
        for section in [&document.summary, &document.footer].iter() {
            for entry in section.iter() {
                feed.entry(entry);
            }
        }
        feed.command(Command::LineFeed);
        feed.command(Command::LineFeed);
        feed.command(Command::CutPaper);
        debug!("Encoded receipt with {} item rows into {} bytes", document.items.len(), feed.bytes.len());
        EncodedBuffer {
            bytes: feed.bytes
        }
    }
}

struct Feed {
    bytes: Vec<u8>
}

impl Feed {
    fn with_capacity(capacity: usize) -> Feed {
        Feed {
            bytes: Vec::with_capacity(capacity)
        }
    }

    fn command(&mut self, command: Command) {
        self.bytes.extend_from_slice(command.as_bytes());
    }

    fn text(&mut self, text: &str) {
        self.bytes.extend_from_slice(text.as_bytes());
    }

    fn entry(&mut self, entry: &SectionEntry) {
        match entry {
            SectionEntry::Divider => self.text(DIVIDER),
            SectionEntry::Spacer => self.command(Command::LineFeed),
            SectionEntry::Line(line) => {
                self.command(line.align.command());
                match line.size {
                    TextSize::Large => {
                        self.command(Command::DoubleHeight);
                        self.command(Command::DoubleWidth);
                    },
                    TextSize::Normal => self.command(Command::FontNormal)
                }
                if line.bold {
                    self.command(Command::BoldOn);
                }
                self.text(&line.text);
                self.command(Command::NewLine);
                // Only what was switched on gets switched off
                if line.bold {
                    self.command(Command::BoldOff);
                }
                if line.size != TextSize::Normal {
                    self.command(Command::FontNormal);
                }
            }
        }
    }

    fn row(&mut self, row: &TableRow) {
        self.command(Command::AlignLeft);
        self.command(Command::FontNormal);
        let count = row.columns.len();
        for (index, column) in row.columns.iter().enumerate() {
            if column.width > 0 {
                self.text(&Formatter::pad(&column.text, column.width, column.align));
            } else {
                self.text(&column.text);
            }
            if index + 1 < count {
                self.text(COLUMN_SEPARATOR);
            }
        }
        self.command(Command::NewLine);
    }
}
