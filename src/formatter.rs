use crate::{
    Justification, PrinterProfile, ReceiptDocument, SectionEntry, TableRow, TextSize
};

/// Forty dashes and a line feed, printed for every divider entry
pub const DIVIDER: &str = "----------------------------------------\n";

/// Separator placed between two table columns
pub const COLUMN_SEPARATOR: &str = "  ";

/// Helper structure to lay out receipt text
///
/// Holds the column arithmetic shared by the esc/pos encoder and the plain text preview. The preview is what a receipt looks like when there is no printer at hand, with the paper width given in characters.
pub struct Formatter {
    /// Width to use for formatting
    width: usize
}

impl Formatter {
    /// Creates a new formatter with the given paper width, in characters
    pub fn new(width: usize) -> Formatter {
        Formatter {
            width
        }
    }

    /// Formatter as wide as the profile's paper
    pub fn from_profile(profile: &PrinterProfile) -> Formatter {
        Formatter::new(profile.paper_columns)
    }

    /// Pads or truncates `text` to exactly `width` characters
    ///
    /// Longer text keeps its first `width` characters. Centered text puts the smaller half of the padding on the left.
    ///
    /// ```rust
    /// use escpos_receipt::{Formatter, Justification};
    ///
    /// assert_eq!("AB   ", Formatter::pad("AB", 5, Justification::Left));
    /// assert_eq!("   AB", Formatter::pad("AB", 5, Justification::Right));
    /// assert_eq!(" AB  ", Formatter::pad("AB", 5, Justification::Center));
    /// assert_eq!("ABC", Formatter::pad("ABCDEF", 3, Justification::Right));
    /// ```
    pub fn pad(text: &str, width: usize, justification: Justification) -> String {
        let length = text.chars().count();
        if length >= width {
            return text.chars().take(width).collect();
        }
        let padding = width - length;
        match justification {
            Justification::Left => format!("{}{}", text, " ".repeat(padding)),
            Justification::Right => format!("{}{}", " ".repeat(padding), text),
            Justification::Center => {
                let left = padding / 2;
                format!("{}{}{}", " ".repeat(left), text, " ".repeat(padding - left))
            }
        }
    }

    /// Text of a table row, without the line terminator
    ///
    /// Columns with a width of 0 are printed as they come.
    ///
    /// ```rust
    /// use escpos_receipt::{Formatter, Column, TableRow};
    ///
    /// let row: TableRow = vec![Column::new("Item", 10), Column::new("Qty", 5)].into();
    /// assert_eq!("Item        Qty  ", Formatter::row(&row));
    /// ```
    pub fn row(row: &TableRow) -> String {
        row.columns.iter().map(|column| {
            if column.width > 0 {
                Formatter::pad(&column.text, column.width, column.align)
            } else {
                column.text.clone()
            }
        }).collect::<Vec<_>>().join(COLUMN_SEPARATOR)
    }

    /// Splits a string by whitespaces, according to the given width
    ///
    /// Words longer than the width get split in pieces. Notice that the final line will not contain a new line at the end.
    ///
    /// ```rust
    /// use escpos_receipt::Formatter;
    ///
    /// let formatter = Formatter::new(16);
    /// let res = formatter.space_split("Sentence with two lines.", 16);
    /// assert_eq!("Sentence with\ntwo lines.", res.as_str());
    /// ```
    pub fn space_split<A: AsRef<str>>(&self, source: A, width: usize) -> String {
        let width = width.max(1);
        source.as_ref().split('\n').map(|line| {
            let mut current_line = String::new();
            let mut broken_lines = Vec::new();
            for word in line.split_whitespace() {
                let num_chars = word.chars().count();
                let current_chars = current_line.chars().count();
                if current_chars == 0 && num_chars <= width {
                    current_line = word.to_string();
                } else if current_chars > 0 && current_chars + num_chars + 1 <= width {
                    current_line.push(' ');
                    current_line.push_str(word);
                } else {
                    // We have to terminate the current line, in case it contains something
                    if !current_line.is_empty() {
                        broken_lines.push(std::mem::take(&mut current_line));
                    }
                    let mut chars = word.chars().peekable();
                    while chars.peek().is_some() {
                        let fragment: String = chars.by_ref().take(width).collect();
                        if fragment.chars().count() == width {
                            broken_lines.push(fragment);
                        } else {
                            current_line = fragment;
                        }
                    }
                }
            }
            if !current_line.is_empty() {
                broken_lines.push(current_line);
            }
            broken_lines.join("\n")
        }).collect::<Vec<_>>().join("\n")
    }

    /// Renders the receipt as plain text
    ///
    /// Large text takes two columns per character, so it wraps at half the width. Styling that text can not show (bold) is dropped.
    ///
    /// ```rust
    /// use escpos_receipt::{Formatter, ReceiptDocument, SectionEntry};
    ///
    /// let document = ReceiptDocument {
    ///     footer: vec![SectionEntry::text("Thanks!")],
    ///     ..ReceiptDocument::default()
    /// };
    /// assert_eq!("\nThanks!\n", Formatter::new(20).preview(&document));
    /// ```
    pub fn preview(&self, document: &ReceiptDocument) -> String {
        let mut content = String::new();
        for section in [&document.header, &document.order_info, &document.title].iter() {
            self.preview_section(&mut content, section);
        }
        content += &Formatter::row(&document.table_header);
        content.push('\n');
        for row in &document.items {
            content += &Formatter::row(row);
            content.push('\n');
        }
        for section in [&document.summary, &document.footer].iter() {
            self.preview_section(&mut content, section);
        }
        content
    }

    fn preview_section(&self, content: &mut String, entries: &[SectionEntry]) {
        for entry in entries {
            match entry {
                SectionEntry::Divider => *content += DIVIDER,
                SectionEntry::Spacer => content.push('\n'),
                SectionEntry::Line(line) => {
                    let width = match line.size {
                        TextSize::Normal => self.width,
                        TextSize::Large => self.width / 2
                    };
                    for piece in self.space_split(&line.text, width).split('\n') {
                        let placed = match line.align {
                            Justification::Left => piece.to_string(),
                            other => Formatter::pad(piece, width, other)
                        };
                        *content += placed.trim_end();
                        content.push('\n');
                    }
                }
            }
        }
    }
}
