/// Raw esc/pos commands understood by the receipt encoder
///
/// Every command maps to a fixed byte sequence, the printer will not accept anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Initializes the printer. Equivalent to ESC @
    Init,
    /// Equivalent to ESC a 0
    AlignLeft,
    /// Equivalent to ESC a 1
    AlignCenter,
    /// Equivalent to ESC a 2
    AlignRight,
    /// Print mode selected to reset the fonts. Equivalent to ESC ! 0
    FontNormal,
    /// Equivalent to ESC E 1
    BoldOn,
    /// Equivalent to ESC E 0
    BoldOff,
    /// Double height print mode, ESC ! 0x10
    DoubleHeight,
    /// Double width print mode, ESC ! 0x20
    DoubleWidth,
    /// Single line feed
    LineFeed,
    /// Carriage return followed by a line feed
    NewLine,
    /// Full cut. Equivalent to GS V 0
    CutPaper
}

impl Command {
    /// Byte representation of the command
    ///
    /// ```rust
    /// use escpos_receipt::command::Command;
    /// assert_eq!(Command::CutPaper.as_bytes(), &[0x1d, 0x56, 0x00]);
    /// ```
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Command::Init => &[0x1b, 0x40],
            Command::AlignLeft => &[0x1b, 0x61, 0x00],
            Command::AlignCenter => &[0x1b, 0x61, 0x01],
            Command::AlignRight => &[0x1b, 0x61, 0x02],
            Command::FontNormal => &[0x1b, 0x21, 0x00],
            Command::BoldOn => &[0x1b, 0x45, 0x01],
            Command::BoldOff => &[0x1b, 0x45, 0x00],
            Command::DoubleHeight => &[0x1b, 0x21, 0x10],
            Command::DoubleWidth => &[0x1b, 0x21, 0x20],
            Command::LineFeed => &[0x0a],
            Command::NewLine => &[0x0d, 0x0a],
            Command::CutPaper => &[0x1d, 0x56, 0x00]
        }
    }
}
