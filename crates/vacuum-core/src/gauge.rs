//! Display state machine.
//!
//! [`Gauge`] owns everything the main loop mutates: the active mode, the menu,
//! the selected unit, the calibration result and the bargraph renderer. It
//! reads the interrupt side only through [`SharedState`].
//!
//! ```text
//!            click (Synchro / Vacuum / P.absolute)
//!   +------+ ---------------------------------> +--------------+
//!   | Menu |                                    | display mode |
//!   +------+ <--------------------------------- +--------------+
//!     |  ^               long-click
//!     |  |  long-click or run complete
//!     |  +--------------------------+
//!     |   Settings > Calibrate      |
//!     +---------------------> +-------------+
//!                             | Calibrating |
//!                             +-------------+
//! ```
//!
//! Every transition runs the old mode's exit step and the new mode's enter
//! step. Entering sets a flag that makes the next draw repaint the whole
//! screen; later refreshes only touch the numeric fields and the bargraph.

use log::{debug, info, trace, warn};

use crate::bargraph::BarGraph;
use crate::calibration::{CalibrationState, Calibrator};
use crate::config::{ConfigError, GaugeConfig};
use crate::display::CharDisplay;
use crate::menu::{Menu, MenuAction};
use crate::shared::{NavEvent, SharedState};
use crate::units::PressureUnit;
use crate::views::{self, AbsoluteValues, DifferentialValues, SynchroValues};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Menu,
    Synchronization,
    DifferentialPressure,
    AbsolutePressure,
    Calibrating,
}

impl DisplayMode {
    /// Whether the mode draws the bargraph on the second row.
    pub fn has_bargraph(self) -> bool {
        matches!(self, Self::Synchronization | Self::DifferentialPressure)
    }
}

pub struct Gauge<'a> {
    config: GaugeConfig,
    shared: &'a SharedState,
    mode: DisplayMode,
    menu: Menu,
    unit: PressureUnit,
    calibration: CalibrationState,
    calibrator: Calibrator,
    bargraph: BarGraph,
    entered: bool,
}

impl<'a> Gauge<'a> {
    /// Create a gauge in [`DisplayMode::Menu`] with a zeroed calibration.
    pub fn new(config: GaugeConfig, shared: &'a SharedState) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "Gauge ready, ADC {}..{} -> {}..{} mbar",
            config.sensor.adc_min,
            config.sensor.adc_max,
            config.sensor.pressure_min,
            config.sensor.pressure_max
        );
        Ok(Self {
            config,
            shared,
            mode: DisplayMode::Menu,
            menu: Menu::new(),
            unit: PressureUnit::default(),
            calibration: CalibrationState::default(),
            calibrator: Calibrator::new(config.calibration_samples),
            bargraph: BarGraph::new(),
            entered: true,
        })
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn unit(&self) -> PressureUnit {
        self.unit
    }

    pub fn calibration(&self) -> CalibrationState {
        self.calibration
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Apply one navigation event. Only state changes here, drawing waits for
    /// the next [`poll`](Self::poll).
    pub fn handle_event(&mut self, event: NavEvent) {
        match (self.mode, event) {
            (DisplayMode::Menu, NavEvent::Rotate(delta)) => self.menu.on_rotate(delta),
            (DisplayMode::Menu, NavEvent::Click) => match self.menu.on_click(self.unit) {
                MenuAction::Stay => {}
                MenuAction::Enter(mode) => self.transition(mode),
                MenuAction::SelectUnit(unit) => {
                    if unit != self.unit {
                        info!("Unit changed: {} -> {}", self.unit.label(), unit.label());
                    }
                    self.unit = unit;
                }
            },
            (DisplayMode::Menu, NavEvent::LongClick) => {
                if !self.menu.on_long_click() {
                    debug!("Long-click ignored on the main menu");
                }
            }
            (_, NavEvent::LongClick) => self.transition(DisplayMode::Menu),
            (mode, event) => debug!("Ignored {:?} in {:?}", event, mode),
        }
    }

    /// Begin a calibration run from any mode. The previous result stays in
    /// effect until the run completes.
    pub fn start_calibration(&mut self) {
        self.transition(DisplayMode::Calibrating);
    }

    /// One main loop iteration: drain navigation events, then draw whatever
    /// is due. Returns `true` when anything was written to `lcd`.
    pub fn poll<L: CharDisplay>(&mut self, lcd: &mut L) -> Result<bool, L::Error> {
        let dropped = self.shared.take_dropped_events();
        if dropped > 0 {
            warn!("Navigation queue full, dropped {} events", dropped);
        }
        while let Some(event) = self.shared.next_event() {
            self.handle_event(event);
        }

        let mut drawn = false;
        if self.shared.take_refresh() && self.mode != DisplayMode::Menu {
            self.refresh(lcd)?;
            drawn = true;
        }
        // A finished calibration lands here in the same iteration.
        if self.mode == DisplayMode::Menu {
            drawn |= self.draw_menu(lcd)?;
        }
        Ok(drawn)
    }

    fn draw_menu<L: CharDisplay>(&mut self, lcd: &mut L) -> Result<bool, L::Error> {
        if self.entered {
            debug!("Full redraw: {:?}", self.mode);
            lcd.clear()?;
            self.menu.program_glyphs(lcd)?;
            self.bargraph.invalidate();
            self.entered = false;
            self.menu.mark_dirty();
        }
        if !self.menu.is_dirty() {
            return Ok(false);
        }
        self.menu.draw(lcd, self.unit)?;
        Ok(true)
    }

    /// Recompute and draw the active measurement view, or advance a
    /// calibration run.
    fn refresh<L: CharDisplay>(&mut self, lcd: &mut L) -> Result<(), L::Error> {
        let readings = self.shared.latest();

        if self.entered {
            debug!("Full redraw: {:?}", self.mode);
            lcd.clear()?;
            match self.mode {
                DisplayMode::Synchronization => views::draw_synchro_static(lcd, self.unit)?,
                DisplayMode::DifferentialPressure => {
                    views::draw_differential_static(lcd, self.unit)?
                }
                DisplayMode::AbsolutePressure => views::draw_absolute_static(lcd, self.unit)?,
                DisplayMode::Calibrating => views::draw_calibrating_static(lcd)?,
                DisplayMode::Menu => {}
            }
            if self.mode.has_bargraph() {
                self.bargraph.program_glyphs(lcd)?;
            }
            self.entered = false;
        }

        match self.mode {
            DisplayMode::Synchronization => {
                let values =
                    SynchroValues::compute(readings, &self.calibration, &self.config.sensor);
                trace!("Synchro {} / {} mbar, bar {}", values.left, values.right, values.bar);
                values.draw(lcd, self.unit)?;
                self.bargraph.render(lcd, values.bar)?;
            }
            DisplayMode::DifferentialPressure => {
                let values = DifferentialValues::compute(readings, &self.calibration, &self.config);
                trace!("Differential {} mbar, bar {}", values.pressure, values.bar);
                values.draw(lcd, self.unit)?;
                self.bargraph.render(lcd, values.bar)?;
            }
            DisplayMode::AbsolutePressure => {
                let values = AbsoluteValues::compute(readings, &self.config.sensor);
                trace!("Absolute {} mbar, {} mmHg", values.pressure, values.mmhg);
                values.draw(lcd, self.unit)?;
            }
            DisplayMode::Calibrating => {
                match self.calibrator.step(readings, &self.config.sensor) {
                    Some(state) => {
                        info!(
                            "Calibration complete: atmosphere {} mbar, channel offset {} mbar",
                            state.atmospheric_reference, state.channel_offset
                        );
                        self.calibration = state;
                        self.transition(DisplayMode::Menu);
                    }
                    None => views::draw_calibration_progress(lcd, self.calibrator.progress())?,
                }
            }
            DisplayMode::Menu => {}
        }
        Ok(())
    }

    fn transition(&mut self, next: DisplayMode) {
        if next == self.mode {
            return;
        }

        if self.mode == DisplayMode::Calibrating {
            let (done, total) = self.calibrator.progress();
            if done > 0 {
                info!("Calibration abandoned after {}/{} samples", done, total);
            }
            self.calibrator.reset();
        }

        info!("Mode {:?} -> {:?}", self.mode, next);
        self.mode = next;
        self.entered = true;
    }
}
