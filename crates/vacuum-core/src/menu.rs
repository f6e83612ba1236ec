//! Rotary-encoder menu shown while the gauge is in [`DisplayMode::Menu`].
//!
//! Layout:
//!
//! ```text
//! Synchro
//! Vacuum
//! P.absolute
//! Settings
//!   Units      -> mBar / PSI / mmHg / inHg
//!   Calibrate
//! ```
//!
//! Rotation moves the highlight and stops at the first and last entries.
//! Click opens the highlighted entry, long-click steps back out of a submenu.
//! Handlers only update the menu state and a dirty flag; drawing happens later
//! from the main loop.

use crate::display::{Align, CharDisplay, GlyphPattern, LCD_COLUMNS, RowText, write_field};
use crate::gauge::DisplayMode;
use crate::units::PressureUnit;

pub const ARROW_UP_SLOT: u8 = 0;
pub const ARROW_DOWN_SLOT: u8 = 1;

pub const ARROW_UP: GlyphPattern = [
    0b00100, 0b01110, 0b11111, 0b00100, 0b00100, 0b00100, 0b00000, 0b00000,
];
pub const ARROW_DOWN: GlyphPattern = [
    0b00000, 0b00000, 0b00100, 0b00100, 0b00100, 0b11111, 0b01110, 0b00100,
];

const MAIN_ITEMS: [(&str, MainEntry); 4] = [
    ("Synchro", MainEntry::Open(DisplayMode::Synchronization)),
    ("Vacuum", MainEntry::Open(DisplayMode::DifferentialPressure)),
    ("P.absolute", MainEntry::Open(DisplayMode::AbsolutePressure)),
    ("Settings", MainEntry::Settings),
];

const SETTINGS_ITEMS: [(&str, SettingsEntry); 2] = [
    ("Units", SettingsEntry::Units),
    ("Calibrate", SettingsEntry::Calibrate),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainEntry {
    Open(DisplayMode),
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingsEntry {
    Units,
    Calibrate,
}

/// Screen currently shown by the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuScreen {
    Main { cursor: usize },
    Settings { cursor: usize },
    /// Unit picker; `candidate` is committed on click.
    Units { candidate: PressureUnit },
}

/// What a click asks the gauge to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// The click was handled inside the menu.
    Stay,
    /// Leave the menu for a display or calibration mode.
    Enter(DisplayMode),
    /// Commit a new display unit.
    SelectUnit(PressureUnit),
}

#[derive(Debug, Clone)]
pub struct Menu {
    screen: MenuScreen,
    main_cursor: usize,
    dirty: bool,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub const fn new() -> Self {
        Self {
            screen: MenuScreen::Main { cursor: 0 },
            main_cursor: 0,
            dirty: true,
        }
    }

    pub fn screen(&self) -> MenuScreen {
        self.screen
    }

    pub fn on_rotate(&mut self, delta: i8) {
        self.screen = match self.screen {
            MenuScreen::Main { cursor } => {
                let cursor = step_clamped(cursor, delta, MAIN_ITEMS.len());
                self.main_cursor = cursor;
                MenuScreen::Main { cursor }
            }
            MenuScreen::Settings { cursor } => MenuScreen::Settings {
                cursor: step_clamped(cursor, delta, SETTINGS_ITEMS.len()),
            },
            MenuScreen::Units { candidate } => MenuScreen::Units {
                candidate: candidate.step(delta),
            },
        };
        self.dirty = true;
    }

    pub fn on_click(&mut self, unit: PressureUnit) -> MenuAction {
        self.dirty = true;
        match self.screen {
            MenuScreen::Main { cursor } => match MAIN_ITEMS[cursor].1 {
                MainEntry::Open(mode) => MenuAction::Enter(mode),
                MainEntry::Settings => {
                    self.screen = MenuScreen::Settings { cursor: 0 };
                    MenuAction::Stay
                }
            },
            MenuScreen::Settings { cursor } => match SETTINGS_ITEMS[cursor].1 {
                SettingsEntry::Units => {
                    self.screen = MenuScreen::Units { candidate: unit };
                    MenuAction::Stay
                }
                SettingsEntry::Calibrate => MenuAction::Enter(DisplayMode::Calibrating),
            },
            MenuScreen::Units { candidate } => {
                self.screen = MenuScreen::Settings { cursor: 0 };
                MenuAction::SelectUnit(candidate)
            }
        }
    }

    /// Step back one level. Returns `false` on the main list, where there is
    /// nothing to go back to.
    pub fn on_long_click(&mut self) -> bool {
        self.screen = match self.screen {
            MenuScreen::Main { .. } => return false,
            MenuScreen::Settings { .. } => MenuScreen::Main {
                cursor: self.main_cursor,
            },
            MenuScreen::Units { .. } => MenuScreen::Settings { cursor: 0 },
        };
        self.dirty = true;
        true
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Load the scroll arrow glyphs. Call when the menu takes over the screen.
    pub fn program_glyphs<L: CharDisplay>(&self, lcd: &mut L) -> Result<(), L::Error> {
        lcd.program_glyph(ARROW_UP_SLOT, &ARROW_UP)?;
        lcd.program_glyph(ARROW_DOWN_SLOT, &ARROW_DOWN)
    }

    pub fn draw<L: CharDisplay>(
        &mut self,
        lcd: &mut L,
        unit: PressureUnit,
    ) -> Result<(), L::Error> {
        match self.screen {
            MenuScreen::Main { cursor } => {
                draw_list(lcd, &MAIN_ITEMS.map(|(label, _)| label), cursor)?
            }
            MenuScreen::Settings { cursor } => {
                draw_list(lcd, &SETTINGS_ITEMS.map(|(label, _)| label), cursor)?
            }
            MenuScreen::Units { candidate } => {
                let mut title = RowText::new();
                title.push_str("Units").ok();
                if candidate == unit {
                    title.push_str(" *").ok();
                }
                write_field(lcd, 0, 0, LCD_COLUMNS, &title, Align::Left)?;
                draw_item(lcd, 1, candidate.label(), true)?;
            }
        }
        self.dirty = false;
        Ok(())
    }
}

fn step_clamped(cursor: usize, delta: i8, len: usize) -> usize {
    (cursor as isize + delta as isize).clamp(0, len as isize - 1) as usize
}

/// Two-row window over `labels` keeping `cursor` visible, with scroll arrows
/// in the last column.
fn draw_list<L: CharDisplay>(lcd: &mut L, labels: &[&str], cursor: usize) -> Result<(), L::Error> {
    let top = cursor.min(labels.len().saturating_sub(2));
    for row in 0..2u8 {
        let index = top + row as usize;
        let label = labels.get(index).copied().unwrap_or("");
        draw_item(lcd, row, label, index == cursor)?;
    }

    let last = LCD_COLUMNS - 1;
    lcd.set_cursor(last, 0)?;
    if top > 0 {
        lcd.write_glyph(ARROW_UP_SLOT)?;
    } else {
        lcd.write_str(" ")?;
    }
    lcd.set_cursor(last, 1)?;
    if top + 2 < labels.len() {
        lcd.write_glyph(ARROW_DOWN_SLOT)
    } else {
        lcd.write_str(" ")
    }
}

fn draw_item<L: CharDisplay>(
    lcd: &mut L,
    row: u8,
    label: &str,
    selected: bool,
) -> Result<(), L::Error> {
    let mut text = RowText::new();
    text.push(if selected { '>' } else { ' ' }).ok();
    text.push_str(label).ok();
    write_field(lcd, 0, row, LCD_COLUMNS - 1, &text, Align::Left)
}
