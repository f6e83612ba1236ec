//! RAM-backed character frame with per-cell change detection.
//!
//! Views draw into this buffer instead of the display module. After a refresh,
//! [`CharFrameBuffer::flush`] sends only the glyph slots and cells that changed,
//! which keeps the slow bus traffic of a character LCD to a minimum.

use core::convert::Infallible;

use heapless::String;
use log::debug;

use crate::display::{CharDisplay, GLYPH_SLOTS, GlyphPattern, LCD_COLUMNS, LCD_ROWS};

const COLUMNS: usize = LCD_COLUMNS as usize;
const ROWS: usize = LCD_ROWS as usize;
const SLOTS: usize = GLYPH_SLOTS as usize;

/// Content of one character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Char(u8),
    Glyph(u8),
}

impl Cell {
    const BLANK: Self = Self::Char(b' ');
}

pub struct CharFrameBuffer {
    cells: [[Cell; COLUMNS]; ROWS],
    dirty: [[bool; COLUMNS]; ROWS],
    glyphs: [GlyphPattern; SLOTS],
    glyph_dirty: [bool; SLOTS],
    cursor: (usize, usize),
    glyph_writes: u32,
}

impl Default for CharFrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CharFrameBuffer {
    pub const fn new() -> Self {
        Self {
            cells: [[Cell::BLANK; COLUMNS]; ROWS],
            dirty: [[false; COLUMNS]; ROWS],
            glyphs: [[0; 8]; SLOTS],
            glyph_dirty: [false; SLOTS],
            cursor: (0, 0),
            glyph_writes: 0,
        }
    }

    pub fn cell(&self, col: u8, row: u8) -> Cell {
        self.cells[row as usize][col as usize]
    }

    pub fn row(&self, row: u8) -> &[Cell; COLUMNS] {
        &self.cells[row as usize]
    }

    /// Text of a row with glyph cells replaced by `glyph_char`.
    pub fn row_text(&self, row: u8, glyph_char: char) -> String<COLUMNS> {
        let mut text = String::new();
        for cell in self.row(row) {
            let c = match *cell {
                Cell::Char(byte) => byte as char,
                Cell::Glyph(_) => glyph_char,
            };
            text.push(c).ok();
        }
        text
    }

    pub fn glyph(&self, slot: u8) -> &GlyphPattern {
        &self.glyphs[slot as usize]
    }

    /// Number of glyph programming calls received so far.
    pub fn glyph_writes(&self) -> u32 {
        self.glyph_writes
    }

    pub fn is_dirty(&self) -> bool {
        self.glyph_dirty.iter().any(|d| *d) || self.dirty.iter().flatten().any(|d| *d)
    }

    fn put(&mut self, cell: Cell) {
        let (col, row) = self.cursor;
        if col >= COLUMNS {
            // Off the visible area; the module would write into hidden memory.
            return;
        }
        if self.cells[row][col] != cell {
            self.cells[row][col] = cell;
            self.dirty[row][col] = true;
        }
        self.cursor.0 += 1;
    }

    /// Send changed glyph slots and cells to `display`, then mark everything clean.
    pub fn flush<D: CharDisplay>(&mut self, display: &mut D) -> Result<(), D::Error> {
        for slot in 0..SLOTS {
            if self.glyph_dirty[slot] {
                display.program_glyph(slot as u8, &self.glyphs[slot])?;
                self.glyph_dirty[slot] = false;
            }
        }

        let mut flushed = 0usize;
        for row in 0..ROWS {
            let mut col = 0;
            while col < COLUMNS {
                if !self.dirty[row][col] {
                    col += 1;
                    continue;
                }
                display.set_cursor(col as u8, row as u8)?;
                let mut run = String::<COLUMNS>::new();
                while col < COLUMNS && self.dirty[row][col] {
                    match self.cells[row][col] {
                        Cell::Char(byte) => {
                            run.push(byte as char).ok();
                        }
                        Cell::Glyph(slot) => {
                            if !run.is_empty() {
                                display.write_str(&run)?;
                                run.clear();
                            }
                            display.write_glyph(slot)?;
                        }
                    }
                    self.dirty[row][col] = false;
                    flushed += 1;
                    col += 1;
                }
                if !run.is_empty() {
                    display.write_str(&run)?;
                }
            }
        }

        if flushed > 0 {
            debug!("Flushed {} changed cells", flushed);
        }
        Ok(())
    }
}

impl CharDisplay for CharFrameBuffer {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        for row in 0..ROWS {
            for col in 0..COLUMNS {
                if self.cells[row][col] != Cell::BLANK {
                    self.cells[row][col] = Cell::BLANK;
                    self.dirty[row][col] = true;
                }
            }
        }
        self.cursor = (0, 0);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
        self.cursor = (
            (col as usize).min(COLUMNS),
            (row as usize).min(ROWS - 1),
        );
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
        for c in text.chars() {
            let byte = if c.is_ascii() { c as u8 } else { b'?' };
            self.put(Cell::Char(byte));
        }
        Ok(())
    }

    fn write_glyph(&mut self, slot: u8) -> Result<(), Self::Error> {
        self.put(Cell::Glyph(slot % GLYPH_SLOTS));
        Ok(())
    }

    fn program_glyph(&mut self, slot: u8, pattern: &GlyphPattern) -> Result<(), Self::Error> {
        let slot = (slot % GLYPH_SLOTS) as usize;
        self.glyph_writes += 1;
        if self.glyphs[slot] != *pattern {
            self.glyphs[slot] = *pattern;
            self.glyph_dirty[slot] = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the calls a flush makes.
    #[derive(Default)]
    struct CallLog {
        cursors: heapless::Vec<(u8, u8), 16>,
        text: heapless::String<64>,
        glyphs: heapless::Vec<u8, 32>,
        programmed: heapless::Vec<u8, 8>,
    }

    impl CharDisplay for CallLog {
        type Error = Infallible;

        fn clear(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error> {
            self.cursors.push((col, row)).ok();
            Ok(())
        }

        fn write_str(&mut self, text: &str) -> Result<(), Self::Error> {
            self.text.push_str(text).ok();
            Ok(())
        }

        fn write_glyph(&mut self, slot: u8) -> Result<(), Self::Error> {
            self.glyphs.push(slot).ok();
            Ok(())
        }

        fn program_glyph(&mut self, slot: u8, _pattern: &GlyphPattern) -> Result<(), Self::Error> {
            self.programmed.push(slot).ok();
            Ok(())
        }
    }

    #[test]
    fn writes_land_at_the_cursor() {
        let mut frame = CharFrameBuffer::new();
        frame.set_cursor(3, 1).unwrap();
        frame.write_str("abc").unwrap();
        frame.write_glyph(5).unwrap();
        assert_eq!(frame.cell(3, 1), Cell::Char(b'a'));
        assert_eq!(frame.cell(6, 1), Cell::Glyph(5));
        assert_eq!(frame.row_text(1, '#').as_str(), "   abc#         ");
    }

    #[test]
    fn text_past_the_last_column_is_dropped() {
        let mut frame = CharFrameBuffer::new();
        frame.set_cursor(14, 0).unwrap();
        frame.write_str("xyz").unwrap();
        assert_eq!(frame.row_text(0, '#').as_str(), "              xy");
        assert_eq!(frame.row_text(1, '#').as_str(), "                ");
    }

    #[test]
    fn flush_sends_only_changed_cells() {
        let mut frame = CharFrameBuffer::new();
        frame.set_cursor(0, 0).unwrap();
        frame.write_str("P 1013").unwrap();
        let mut first = CallLog::default();
        frame.flush(&mut first).unwrap();
        // The space matches the blank frame, so it splits the run.
        assert_eq!(first.cursors.as_slice(), &[(0, 0), (2, 0)]);
        assert_eq!(first.text.as_str(), "P1013");
        assert!(!frame.is_dirty());

        // Rewriting identical content is free, a changed digit is one cell.
        frame.set_cursor(0, 0).unwrap();
        frame.write_str("P 1012").unwrap();
        let mut second = CallLog::default();
        frame.flush(&mut second).unwrap();
        assert_eq!(second.cursors.as_slice(), &[(5, 0)]);
        assert_eq!(second.text.as_str(), "2");
    }

    #[test]
    fn blanks_over_a_blank_frame_cost_nothing() {
        let mut frame = CharFrameBuffer::new();
        frame.set_cursor(0, 1).unwrap();
        frame.write_str("                ").unwrap();
        frame.clear().unwrap();
        assert!(!frame.is_dirty());

        let mut log = CallLog::default();
        frame.flush(&mut log).unwrap();
        assert!(log.cursors.is_empty());
        assert!(log.text.is_empty());
    }

    #[test]
    fn glyph_slots_flush_once_per_change() {
        let mut frame = CharFrameBuffer::new();
        let pattern = [0x1f; 8];
        frame.program_glyph(2, &pattern).unwrap();
        frame.program_glyph(2, &pattern).unwrap();
        frame.set_cursor(0, 1).unwrap();
        frame.write_glyph(2).unwrap();

        let mut log = CallLog::default();
        frame.flush(&mut log).unwrap();
        assert_eq!(log.programmed.as_slice(), &[2]);
        assert_eq!(log.glyphs.as_slice(), &[2]);
        assert_eq!(frame.glyph_writes(), 2);
    }
}
