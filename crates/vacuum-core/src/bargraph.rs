//! Sub-character bargraph on the second display row.
//!
//! The row is 16 cells: a start cap, 14 gauge cells worth 5 units each, and an
//! end cap, for a full scale of 70 units. Each gauge cell shows 0 to 5 lit pixel
//! columns through six programmed glyphs:
//!
//! | slot | glyph            |
//! |------|------------------|
//! | 0    | start cap        |
//! | 1    | empty cell       |
//! | 2..6 | 1..5 columns lit |
//! | 7    | end cap          |
//!
//! The caps have an empty and a full variant. Their current variant is tracked
//! so glyph memory is only rewritten when the value crosses 0 or 70.

use crate::config::{BAR_MAX, BAR_MIN};
use crate::display::{CharDisplay, GlyphPattern, LCD_COLUMNS};
use crate::range::constrain;

pub const START_CAP_SLOT: u8 = 0;
pub const EMPTY_CELL_SLOT: u8 = 1;
pub const END_CAP_SLOT: u8 = 7;

/// Row the bargraph occupies.
pub const BAR_ROW: u8 = 1;
/// Gauge cells between the caps.
pub const BAR_CELLS: usize = 14;
/// Units represented by one fully lit gauge cell.
pub const UNITS_PER_CELL: i32 = 5;

const BORDER: u8 = 0b11111;

/// Gauge cell with `lit` of its five pixel columns filled from the left.
const fn cell_glyph(lit: u8) -> GlyphPattern {
    let fill = (0b11111u8 << (5 - lit)) & 0b11111;
    [BORDER, fill, fill, fill, fill, fill, fill, BORDER]
}

/// Cell glyphs indexed by lit columns; slot is `EMPTY_CELL_SLOT + index`.
pub const CELL_GLYPHS: [GlyphPattern; 6] = [
    cell_glyph(0),
    cell_glyph(1),
    cell_glyph(2),
    cell_glyph(3),
    cell_glyph(4),
    cell_glyph(5),
];

pub const START_CAP_EMPTY: GlyphPattern = [
    BORDER, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, BORDER,
];
pub const START_CAP_FULL: GlyphPattern = [BORDER; 8];
pub const END_CAP_EMPTY: GlyphPattern = [
    BORDER, 0b00001, 0b00001, 0b00001, 0b00001, 0b00001, 0b00001, BORDER,
];
pub const END_CAP_FULL: GlyphPattern = [BORDER; 8];

/// Glyph slots for a bar of `value` units, left to right.
///
/// `value` is clamped to `[BAR_MIN, BAR_MAX]`.
pub fn layout(value: i32) -> [u8; LCD_COLUMNS as usize] {
    let value = constrain(value, BAR_MIN, BAR_MAX);
    let mut slots = [EMPTY_CELL_SLOT; LCD_COLUMNS as usize];
    slots[0] = START_CAP_SLOT;
    slots[LCD_COLUMNS as usize - 1] = END_CAP_SLOT;

    let mut remaining = value;
    for slot in slots.iter_mut().skip(1).take(BAR_CELLS) {
        let lit = remaining.min(UNITS_PER_CELL);
        *slot = EMPTY_CELL_SLOT + lit as u8;
        remaining = (remaining - UNITS_PER_CELL).max(0);
    }
    slots
}

/// Renders the bargraph and remembers which cap variants are loaded.
#[derive(Debug, Clone, Default)]
pub struct BarGraph {
    /// `Some(full)` once the start cap slot holds a known variant.
    start_full: Option<bool>,
    end_full: Option<bool>,
}

impl BarGraph {
    pub const fn new() -> Self {
        Self {
            start_full: None,
            end_full: None,
        }
    }

    /// Forget the cap variants, e.g. after another screen reused the slots.
    pub fn invalidate(&mut self) {
        self.start_full = None;
        self.end_full = None;
    }

    /// Load the six gauge cell glyphs and both empty caps.
    pub fn program_glyphs<L: CharDisplay>(&mut self, lcd: &mut L) -> Result<(), L::Error> {
        for (lit, pattern) in CELL_GLYPHS.iter().enumerate() {
            lcd.program_glyph(EMPTY_CELL_SLOT + lit as u8, pattern)?;
        }
        self.invalidate();
        self.sync_caps(lcd, BAR_MIN)
    }

    /// Draw `value` (clamped to `[0, 70]`) on the bargraph row.
    pub fn render<L: CharDisplay>(&mut self, lcd: &mut L, value: i32) -> Result<(), L::Error> {
        let value = constrain(value, BAR_MIN, BAR_MAX);
        self.sync_caps(lcd, value)?;

        lcd.set_cursor(0, BAR_ROW)?;
        for slot in layout(value) {
            lcd.write_glyph(slot)?;
        }
        Ok(())
    }

    fn sync_caps<L: CharDisplay>(&mut self, lcd: &mut L, value: i32) -> Result<(), L::Error> {
        let start_full = value > BAR_MIN;
        if self.start_full != Some(start_full) {
            let pattern = if start_full {
                &START_CAP_FULL
            } else {
                &START_CAP_EMPTY
            };
            lcd.program_glyph(START_CAP_SLOT, pattern)?;
            self.start_full = Some(start_full);
        }

        let end_full = value >= BAR_MAX;
        if self.end_full != Some(end_full) {
            let pattern = if end_full {
                &END_CAP_FULL
            } else {
                &END_CAP_EMPTY
            };
            lcd.program_glyph(END_CAP_SLOT, pattern)?;
            self.end_full = Some(end_full);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char_buffer::{Cell, CharFrameBuffer};

    const FULL: u8 = EMPTY_CELL_SLOT + 5;

    fn interior(value: i32) -> [u8; BAR_CELLS] {
        let mut cells = [0; BAR_CELLS];
        cells.copy_from_slice(&layout(value)[1..1 + BAR_CELLS]);
        cells
    }

    #[test]
    fn zero_is_all_empty() {
        assert_eq!(interior(0), [EMPTY_CELL_SLOT; BAR_CELLS]);

        let mut frame = CharFrameBuffer::new();
        let mut bar = BarGraph::new();
        bar.render(&mut frame, 0).unwrap();
        assert_eq!(frame.glyph(START_CAP_SLOT), &START_CAP_EMPTY);
        assert_eq!(frame.glyph(END_CAP_SLOT), &END_CAP_EMPTY);
    }

    #[test]
    fn seventy_is_all_full() {
        assert_eq!(interior(70), [FULL; BAR_CELLS]);

        let mut frame = CharFrameBuffer::new();
        let mut bar = BarGraph::new();
        bar.render(&mut frame, 70).unwrap();
        assert_eq!(frame.glyph(START_CAP_SLOT), &START_CAP_FULL);
        assert_eq!(frame.glyph(END_CAP_SLOT), &END_CAP_FULL);
    }

    #[test]
    fn half_scale_fills_seven_cells() {
        let cells = interior(35);
        assert_eq!(cells[..7], [FULL; 7]);
        assert_eq!(cells[7..], [EMPTY_CELL_SLOT; 7]);
    }

    #[test]
    fn partial_cell_uses_intermediate_glyph() {
        let cells = interior(13);
        assert_eq!(cells[0], FULL);
        assert_eq!(cells[1], FULL);
        assert_eq!(cells[2], EMPTY_CELL_SLOT + 3);
        assert_eq!(cells[3], EMPTY_CELL_SLOT);
    }

    #[test]
    fn out_of_range_values_saturate() {
        assert_eq!(layout(-20), layout(0));
        assert_eq!(layout(500), layout(70));
    }

    #[test]
    fn fill_is_monotonic() {
        let lit = |value: i32| -> i32 {
            interior(value)
                .iter()
                .map(|slot| (*slot - EMPTY_CELL_SLOT) as i32)
                .sum()
        };
        for value in 0..=70 {
            assert_eq!(lit(value), value);
        }
    }

    #[test]
    fn row_is_written_with_caps() {
        let mut frame = CharFrameBuffer::new();
        let mut bar = BarGraph::new();
        bar.render(&mut frame, 35).unwrap();
        assert_eq!(frame.cell(0, BAR_ROW), Cell::Glyph(START_CAP_SLOT));
        assert_eq!(frame.cell(1, BAR_ROW), Cell::Glyph(FULL));
        assert_eq!(frame.cell(15, BAR_ROW), Cell::Glyph(END_CAP_SLOT));
    }

    #[test]
    fn caps_are_reprogrammed_only_on_boundary_crossings() {
        let mut frame = CharFrameBuffer::new();
        let mut bar = BarGraph::new();

        bar.render(&mut frame, 10).unwrap();
        let after_first = frame.glyph_writes();
        assert_eq!(after_first, 2);

        for value in [11, 30, 69, 42] {
            bar.render(&mut frame, value).unwrap();
        }
        assert_eq!(frame.glyph_writes(), after_first);

        bar.render(&mut frame, 70).unwrap();
        assert_eq!(frame.glyph_writes(), after_first + 1);
        bar.render(&mut frame, 0).unwrap();
        assert_eq!(frame.glyph_writes(), after_first + 3);

        bar.invalidate();
        bar.render(&mut frame, 0).unwrap();
        assert_eq!(frame.glyph_writes(), after_first + 5);
    }

    #[test]
    fn cell_glyphs_light_columns_from_the_left() {
        assert_eq!(CELL_GLYPHS[0][3], 0b00000);
        assert_eq!(CELL_GLYPHS[1][3], 0b10000);
        assert_eq!(CELL_GLYPHS[3][3], 0b11100);
        assert_eq!(CELL_GLYPHS[5][3], 0b11111);
    }
}
