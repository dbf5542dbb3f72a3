extern crate serde;
extern crate serde_json;

use std::convert::TryFrom;

use log::debug;
use serde::{Serialize, Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use crate::Error;
use super::Justification;

/// Character size of a text line
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    Normal,
    /// Double height and double width
    Large
}

impl Default for TextSize {
    fn default() -> TextSize {
        TextSize::Normal
    }
}

/// A styled line of text
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    pub text: String,
    #[serde(default)]
    pub align: Justification,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub size: TextSize
}

impl LineItem {
    /// Left aligned, normal sized, regular weight text
    ///
    /// ```rust
    /// use escpos_receipt::{LineItem, Justification};
    /// let line = LineItem::new("SHOP").align(Justification::Center).bold();
    /// assert!(line.bold);
    /// ```
    pub fn new<A: Into<String>>(text: A) -> LineItem {
        LineItem {
            text: text.into(),
            align: Justification::Left,
            bold: false,
            size: TextSize::Normal
        }
    }

    pub fn align(mut self, align: Justification) -> LineItem {
        self.align = align;
        self
    }

    pub fn bold(mut self) -> LineItem {
        self.bold = true;
        self
    }

    pub fn large(mut self) -> LineItem {
        self.size = TextSize::Large;
        self
    }
}

/// One entry of a free-form receipt section
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub enum SectionEntry {
    Line(LineItem),
    /// A full row of dashes
    Divider,
    /// Blank paper feed
    Spacer
}

impl SectionEntry {
    /// Shorthand for a plain left aligned line
    pub fn text<A: Into<String>>(text: A) -> SectionEntry {
        SectionEntry::Line(LineItem::new(text))
    }
}

impl From<LineItem> for SectionEntry {
    fn from(line: LineItem) -> SectionEntry {
        SectionEntry::Line(line)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum EntryKind {
    Text,
    Divider,
    Spacer
}

/// Wire shape of a section entry, `type` is optional for text lines
#[derive(Serialize, Deserialize)]
struct RawEntry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<EntryKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default)]
    align: Justification,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    size: TextSize
}

impl TryFrom<RawEntry> for SectionEntry {
    type Error = String;

    fn try_from(raw: RawEntry) -> Result<SectionEntry, String> {
        match raw.kind {
            Some(EntryKind::Divider) => Ok(SectionEntry::Divider),
            Some(EntryKind::Spacer) => Ok(SectionEntry::Spacer),
            Some(EntryKind::Text) | None => match raw.text {
                Some(text) => Ok(SectionEntry::Line(LineItem {
                    text,
                    align: raw.align,
                    bold: raw.bold,
                    size: raw.size
                })),
                None => Err("text entry without a text field".to_string())
            }
        }
    }
}

impl From<SectionEntry> for RawEntry {
    fn from(entry: SectionEntry) -> RawEntry {
        match entry {
            SectionEntry::Line(line) => RawEntry {
                kind: None,
                text: Some(line.text),
                align: line.align,
                bold: line.bold,
                size: line.size
            },
            SectionEntry::Divider => RawEntry {
                kind: Some(EntryKind::Divider),
                text: None,
                align: Justification::Left,
                bold: false,
                size: TextSize::Normal
            },
            SectionEntry::Spacer => RawEntry {
                kind: Some(EntryKind::Spacer),
                text: None,
                align: Justification::Left,
                bold: false,
                size: TextSize::Normal
            }
        }
    }
}

/// A table cell, padded to `width` characters unless `width` is 0
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub text: String,
    #[serde(default)]
    pub align: Justification,
    #[serde(default)]
    pub width: usize
}

impl Column {
    pub fn new<A: Into<String>>(text: A, width: usize) -> Column {
        Column {
            text: text.into(),
            align: Justification::Left,
            width
        }
    }

    pub fn align(mut self, align: Justification) -> Column {
        self.align = align;
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct TableRow {
    pub columns: Vec<Column>
}

impl From<Vec<Column>> for TableRow {
    fn from(columns: Vec<Column>) -> TableRow {
        TableRow { columns }
    }
}

/// Semantic description of a receipt
///
/// Sections are printed in declaration order. The free-form sections hold [SectionEntry](crate::SectionEntry) values, the table is a header row followed by the item rows.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDocument {
    #[serde(default)]
    pub header: Vec<SectionEntry>,
    #[serde(default)]
    pub order_info: Vec<SectionEntry>,
    #[serde(default)]
    pub title: Vec<SectionEntry>,
    pub table_header: TableRow,
    pub items: Vec<TableRow>,
    #[serde(default)]
    pub summary: Vec<SectionEntry>,
    #[serde(default)]
    pub footer: Vec<SectionEntry>
}

impl ReceiptDocument {
    /// Validates an inbound json document, section by section
    ///
    /// `tableHeader` and `items` are required, the other sections are empty when absent. The error names the first offending section.
    ///
    /// ```rust
    /// use escpos_receipt::{ReceiptDocument, Error};
    /// let value = serde_json::json!({"header": [{"text": "SHOP"}], "tableHeader": []});
    /// match ReceiptDocument::from_value(Some(&value)) {
    ///     Err(Error::MalformedDocument(section)) => assert_eq!(section, "items"),
    ///     _ => panic!("items should be required")
    /// }
    /// ```
    pub fn from_value(value: Option<&Value>) -> Result<ReceiptDocument, Error> {
        let object = match value {
            Some(Value::Object(object)) => object,
            _ => return Err(Error::MalformedDocument("document".to_string()))
        };
        Ok(ReceiptDocument {
            header: optional_section(object, "header")?,
            order_info: optional_section(object, "orderInfo")?,
            title: optional_section(object, "title")?,
            table_header: required_section(object, "tableHeader")?,
            items: required_section(object, "items")?,
            summary: optional_section(object, "summary")?,
            footer: optional_section(object, "footer")?
        })
    }

    /// Same as [from_value](ReceiptDocument::from_value), from json text
    pub fn from_json_str(json: &str) -> Result<ReceiptDocument, Error> {
        let value: Value = serde_json::from_str(json).map_err(|e| {
            debug!("Receipt payload is not json: {}", e);
            Error::MalformedDocument("document".to_string())
        })?;
        ReceiptDocument::from_value(Some(&value))
    }
}

fn optional_section<T: DeserializeOwned + Default>(object: &Map<String, Value>, name: &str) -> Result<T, Error> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => parse_section(value, name)
    }
}

fn required_section<T: DeserializeOwned>(object: &Map<String, Value>, name: &str) -> Result<T, Error> {
    match object.get(name) {
        None | Some(Value::Null) => Err(Error::MalformedDocument(name.to_string())),
        Some(value) => parse_section(value, name)
    }
}

fn parse_section<T: DeserializeOwned>(value: &Value, name: &str) -> Result<T, Error> {
    T::deserialize(value).map_err(|e| {
        debug!("Section {} rejected: {}", name, e);
        Error::MalformedDocument(name.to_string())
    })
}
