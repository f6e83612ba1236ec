//! Character display abstraction and field formatting.
//!
//! The gauge drives a 16x2 HD44780-style module with eight programmable glyph
//! slots. [`CharDisplay`] is the contract the display driver fulfils; the core
//! never talks to hardware directly.

use core::fmt::Write;

use heapless::String;

pub const LCD_COLUMNS: u8 = 16;
pub const LCD_ROWS: u8 = 2;
pub const GLYPH_SLOTS: u8 = 8;

/// Eight rows of five pixels, low five bits of each byte.
pub type GlyphPattern = [u8; 8];

/// Text buffer large enough for one display row.
pub type RowText = String<{ LCD_COLUMNS as usize }>;

pub trait CharDisplay {
    type Error;

    /// Blank the whole screen and home the cursor.
    fn clear(&mut self) -> Result<(), Self::Error>;

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error>;

    /// Write ASCII text at the cursor, advancing it.
    fn write_str(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Write the glyph stored in `slot` at the cursor, advancing it.
    fn write_glyph(&mut self, slot: u8) -> Result<(), Self::Error>;

    /// Store `pattern` in glyph memory. Cells already showing `slot` change too.
    fn program_glyph(&mut self, slot: u8, pattern: &GlyphPattern) -> Result<(), Self::Error>;
}

impl<T: CharDisplay + ?Sized> CharDisplay for &mut T {
    type Error = T::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        (**self).clear()
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
        (**self).set_cursor(col, row)
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        (**self).write_str(text)
    }

    fn write_glyph(&mut self, slot: u8) -> Result<(), Self::Error> {
        (**self).write_glyph(slot)
    }

    fn program_glyph(&mut self, slot: u8, pattern: &GlyphPattern) -> Result<(), Self::Error> {
        (**self).program_glyph(slot, pattern)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Format a fixed-point integer with `decimals` implied decimal places.
///
/// `format_fixed(1470, 2)` gives `"14.70"`, `format_fixed(-5, 1)` gives `"-0.5"`.
pub fn format_fixed(value: i32, decimals: u8) -> RowText {
    let mut text = RowText::new();
    let divisor = 10u32.pow(decimals as u32);
    let magnitude = value.unsigned_abs();
    if value < 0 {
        text.push('-').ok();
    }
    write!(&mut text, "{}", magnitude / divisor).ok();
    if decimals > 0 {
        write!(
            &mut text,
            ".{:0width$}",
            magnitude % divisor,
            width = decimals as usize
        )
        .ok();
    }
    text
}

/// Pad `text` with spaces to `width` characters.
///
/// Text longer than `width` is returned unchanged.
pub fn pad(text: &str, width: u8, align: Align) -> RowText {
    let mut padded = RowText::new();
    let fill = (width as usize).saturating_sub(text.len());
    if align == Align::Right {
        for _ in 0..fill {
            padded.push(' ').ok();
        }
    }
    padded.push_str(text).ok();
    if align == Align::Left {
        for _ in 0..fill {
            padded.push(' ').ok();
        }
    }
    padded
}

/// Overwrite a fixed-width field, blanking whatever it showed before.
pub fn write_field<L: CharDisplay>(
    lcd: &mut L,
    col: u8,
    row: u8,
    width: u8,
    text: &str,
    align: Align,
) -> Result<(), L::Error> {
    lcd.set_cursor(col, row)?;
    lcd.write_str(&pad(text, width, align))
}
