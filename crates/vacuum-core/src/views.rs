//! Measurement screens.
//!
//! Each view has a static part (labels and unit) drawn once when the view is
//! entered, and a value part redrawn on every refresh tick. The `*Values`
//! structs hold what a refresh computes so the arithmetic can be checked
//! without a display.
//!
//! ```text
//!  Synchronization     Differential        Absolute
//! +----------------+  +----------------+  +----------------+
//! |648   mBar   652|  |Vac.   -498 mBar|  |Abs.    648 mBar|
//! |[##########    ]|  |[########      ]|  |        486 mmHg|
//! +----------------+  +----------------+  +----------------+
//! ```

use core::fmt::Write;

use crate::calibration::CalibrationState;
use crate::config::{BAR_MAX, BAR_MIN, GaugeConfig, MBAR_PER_MMHG};
use crate::display::{Align, CharDisplay, RowText, format_fixed, write_field};
use crate::range::{SensorRange, constrain, map_range};
use crate::shared::CalibratedReadings;
use crate::units::PressureUnit;

const VALUE_WIDTH: u8 = 5;
const VALUE_COL: u8 = 6;
const UNIT_COL: u8 = 12;
const SYNCHRO_UNIT_COL: u8 = 6;
const SYNCHRO_RIGHT_COL: u8 = 11;

// Labels end before column 5 so a five character value never touches them.
const DIFFERENTIAL_LABEL: &str = "Vac.";
const ABSOLUTE_LABEL: &str = "Abs.";
const CALIBRATING_LABEL: &str = "Calibrating...";

/// Both ports side by side, for balancing two throttle bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynchroValues {
    /// Vacuum port, millibar.
    pub left: i32,
    /// Reference port corrected by the calibration offset, millibar.
    pub right: i32,
    /// Centred at 35 when both ports agree.
    pub bar: i32,
}

impl SynchroValues {
    pub fn compute(
        readings: CalibratedReadings,
        calibration: &CalibrationState,
        sensor: &SensorRange,
    ) -> Self {
        let left = sensor.to_pressure(readings.vacuum);
        let right = sensor.to_pressure(readings.reference) + calibration.channel_offset;
        Self {
            left,
            right,
            bar: constrain((right - left + BAR_MAX) / 2, BAR_MIN, BAR_MAX),
        }
    }

    pub fn draw<L: CharDisplay>(&self, lcd: &mut L, unit: PressureUnit) -> Result<(), L::Error> {
        write_field(lcd, 0, 0, VALUE_WIDTH, &value_text(self.left, unit), Align::Left)?;
        write_field(
            lcd,
            SYNCHRO_RIGHT_COL,
            0,
            VALUE_WIDTH,
            &value_text(self.right, unit),
            Align::Right,
        )
    }
}

/// Vacuum relative to the ambient pressure captured by the last calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifferentialValues {
    /// Millibar, negative under vacuum.
    pub pressure: i32,
    /// Grows with deeper vacuum, full at `differential_min`.
    pub bar: i32,
}

impl DifferentialValues {
    pub fn compute(
        readings: CalibratedReadings,
        calibration: &CalibrationState,
        config: &GaugeConfig,
    ) -> Self {
        let pressure =
            config.sensor.to_pressure(readings.vacuum) - calibration.atmospheric_reference;
        let bar = map_range(
            pressure,
            config.differential_min,
            config.differential_max,
            BAR_MAX,
            BAR_MIN,
        );
        Self {
            pressure,
            bar: constrain(bar, BAR_MIN, BAR_MAX),
        }
    }

    pub fn draw<L: CharDisplay>(&self, lcd: &mut L, unit: PressureUnit) -> Result<(), L::Error> {
        write_field(
            lcd,
            VALUE_COL,
            0,
            VALUE_WIDTH,
            &value_text(self.pressure, unit),
            Align::Right,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsoluteValues {
    /// Millibar at the vacuum port.
    pub pressure: i32,
    /// Same pressure in whole mmHg, rounded down.
    pub mmhg: i32,
}

impl AbsoluteValues {
    pub fn compute(readings: CalibratedReadings, sensor: &SensorRange) -> Self {
        let pressure = sensor.to_pressure(readings.vacuum);
        Self {
            pressure,
            mmhg: floor_div(pressure, MBAR_PER_MMHG),
        }
    }

    pub fn draw<L: CharDisplay>(&self, lcd: &mut L, unit: PressureUnit) -> Result<(), L::Error> {
        write_field(
            lcd,
            VALUE_COL,
            0,
            VALUE_WIDTH,
            &value_text(self.pressure, unit),
            Align::Right,
        )?;
        write_field(
            lcd,
            VALUE_COL,
            1,
            VALUE_WIDTH,
            &format_fixed(self.mmhg, 0),
            Align::Right,
        )
    }
}

/// `floor(value / divisor)` without the float intrinsics `core` lacks.
fn floor_div(value: i32, divisor: f32) -> i32 {
    let quotient = value as f32 / divisor;
    let truncated = quotient as i32;
    if (truncated as f32) > quotient {
        truncated - 1
    } else {
        truncated
    }
}

fn value_text(mbar: i32, unit: PressureUnit) -> RowText {
    format_fixed(unit.convert(mbar), unit.decimals())
}

pub fn draw_synchro_static<L: CharDisplay>(
    lcd: &mut L,
    unit: PressureUnit,
) -> Result<(), L::Error> {
    lcd.set_cursor(SYNCHRO_UNIT_COL, 0)?;
    lcd.write_str(unit.label())
}

pub fn draw_differential_static<L: CharDisplay>(
    lcd: &mut L,
    unit: PressureUnit,
) -> Result<(), L::Error> {
    draw_labelled_static(lcd, DIFFERENTIAL_LABEL, unit)
}

pub fn draw_absolute_static<L: CharDisplay>(
    lcd: &mut L,
    unit: PressureUnit,
) -> Result<(), L::Error> {
    draw_labelled_static(lcd, ABSOLUTE_LABEL, unit)?;
    lcd.set_cursor(UNIT_COL, 1)?;
    lcd.write_str(PressureUnit::MmHg.label())
}

fn draw_labelled_static<L: CharDisplay>(
    lcd: &mut L,
    label: &str,
    unit: PressureUnit,
) -> Result<(), L::Error> {
    lcd.set_cursor(0, 0)?;
    lcd.write_str(label)?;
    lcd.set_cursor(UNIT_COL, 0)?;
    lcd.write_str(unit.label())
}

pub fn draw_calibrating_static<L: CharDisplay>(lcd: &mut L) -> Result<(), L::Error> {
    lcd.set_cursor(0, 0)?;
    lcd.write_str(CALIBRATING_LABEL)
}

/// Second row of the calibration screen, e.g. `3/10`.
pub fn draw_calibration_progress<L: CharDisplay>(
    lcd: &mut L,
    (done, total): (u8, u8),
) -> Result<(), L::Error> {
    let mut text = RowText::new();
    write!(&mut text, "{}/{}", done, total).ok();
    write_field(lcd, 0, 1, VALUE_WIDTH, &text, Align::Left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::char_buffer::CharFrameBuffer;
    use crate::config::{ADC_MAX, ADC_MIN, DIFFERENTIAL_MIN, PRESSURE_MAX, PRESSURE_MIN};

    fn calibrated_at(vacuum: u16, reference: u16) -> CalibrationState {
        let sensor = SensorRange::DEFAULT;
        let atmospheric_reference = sensor.to_pressure(vacuum);
        CalibrationState {
            atmospheric_reference,
            channel_offset: atmospheric_reference - sensor.to_pressure(reference),
        }
    }

    #[test]
    fn synchro_bar_centres_on_equal_ports() {
        let values = SynchroValues::compute(
            CalibratedReadings::new(500, 500),
            &CalibrationState::default(),
            &SensorRange::DEFAULT,
        );
        assert_eq!(values.left, 648);
        assert_eq!(values.right, 648);
        assert_eq!(values.bar, 35);
    }

    #[test]
    fn synchro_applies_channel_offset() {
        let calibration = calibrated_at(500, 490);
        let values = SynchroValues::compute(
            CalibratedReadings::new(500, 490),
            &calibration,
            &SensorRange::DEFAULT,
        );
        assert_eq!(values.left, values.right);
        assert_eq!(values.bar, 35);
    }

    #[test]
    fn synchro_bar_saturates_both_ways() {
        let calibration = CalibrationState::default();
        let sensor = SensorRange::DEFAULT;
        let low = CalibratedReadings::new(ADC_MAX, ADC_MIN);
        assert_eq!(SynchroValues::compute(low, &calibration, &sensor).bar, BAR_MIN);
        let high = CalibratedReadings::new(ADC_MIN, ADC_MAX);
        assert_eq!(SynchroValues::compute(high, &calibration, &sensor).bar, BAR_MAX);
    }

    #[test]
    fn differential_is_relative_to_atmosphere() {
        let calibration = calibrated_at(500, 500);
        let config = GaugeConfig::DEFAULT;
        let at_rest =
            DifferentialValues::compute(CalibratedReadings::new(500, 500), &calibration, &config);
        assert_eq!(at_rest, DifferentialValues { pressure: 0, bar: 0 });

        let pulled = CalibratedReadings::new(ADC_MIN, 500);
        let pulled = DifferentialValues::compute(pulled, &calibration, &config);
        assert_eq!(pulled.pressure, PRESSURE_MIN - 648);
        assert_eq!(pulled.bar, 42);
    }

    #[test]
    fn differential_bar_clamps_past_the_scale() {
        let calibration = CalibrationState {
            atmospheric_reference: 1150,
            channel_offset: 0,
        };
        let config = GaugeConfig::DEFAULT;
        let values =
            DifferentialValues::compute(CalibratedReadings::new(ADC_MIN, 0), &calibration, &config);
        assert!(values.pressure < DIFFERENTIAL_MIN);
        assert_eq!(values.bar, BAR_MAX);

        let above = CalibrationState {
            atmospheric_reference: 150,
            channel_offset: 0,
        };
        let values =
            DifferentialValues::compute(CalibratedReadings::new(ADC_MAX, 0), &above, &config);
        assert_eq!(values.bar, BAR_MIN);
    }

    #[test]
    fn absolute_secondary_readout_rounds_down() {
        let values =
            AbsoluteValues::compute(CalibratedReadings::new(500, 0), &SensorRange::DEFAULT);
        assert_eq!(values.pressure, 648);
        assert_eq!(values.mmhg, 486);
        assert_eq!(floor_div(1013, MBAR_PER_MMHG), 759);
        assert_eq!(floor_div(-4, MBAR_PER_MMHG), -4);
    }

    #[test]
    fn differential_layout() {
        let mut frame = CharFrameBuffer::new();
        draw_differential_static(&mut frame, PressureUnit::Millibar).unwrap();
        DifferentialValues {
            pressure: -498,
            bar: 42,
        }
        .draw(&mut frame, PressureUnit::Millibar)
        .unwrap();
        assert_eq!(frame.row_text(0, '#').as_str(), "Vac.   -498 mBar");
    }

    #[test]
    fn widest_values_keep_a_gap_on_both_sides() {
        let mut frame = CharFrameBuffer::new();
        draw_differential_static(&mut frame, PressureUnit::Millibar).unwrap();
        let deepest = DifferentialValues {
            pressure: PRESSURE_MIN - PRESSURE_MAX,
            bar: BAR_MAX,
        };
        deepest.draw(&mut frame, PressureUnit::Millibar).unwrap();
        assert_eq!(frame.row_text(0, '#').as_str(), "Vac.  -1000 mBar");

        let mut frame = CharFrameBuffer::new();
        draw_differential_static(&mut frame, PressureUnit::InHg).unwrap();
        deepest.draw(&mut frame, PressureUnit::InHg).unwrap();
        assert_eq!(frame.row_text(0, '#').as_str(), "Vac.  -29.4 inHg");
    }

    #[test]
    fn synchro_layout_in_psi() {
        let mut frame = CharFrameBuffer::new();
        draw_synchro_static(&mut frame, PressureUnit::Psi).unwrap();
        SynchroValues {
            left: 1013,
            right: 648,
            bar: 0,
        }
        .draw(&mut frame, PressureUnit::Psi)
        .unwrap();
        assert_eq!(frame.row_text(0, '#').as_str(), "14.7  PSI    9.4");
    }

    #[test]
    fn absolute_layout() {
        let mut frame = CharFrameBuffer::new();
        draw_absolute_static(&mut frame, PressureUnit::Millibar).unwrap();
        AbsoluteValues {
            pressure: 648,
            mmhg: 486,
        }
        .draw(&mut frame, PressureUnit::Millibar)
        .unwrap();
        assert_eq!(frame.row_text(0, '#').as_str(), "Abs.    648 mBar");
        assert_eq!(frame.row_text(1, '#').as_str(), "        486 mmHg");
    }

    #[test]
    fn calibration_progress_overwrites_previous_count() {
        let mut frame = CharFrameBuffer::new();
        draw_calibrating_static(&mut frame).unwrap();
        draw_calibration_progress(&mut frame, (10, 10)).unwrap();
        draw_calibration_progress(&mut frame, (3, 10)).unwrap();
        assert_eq!(frame.row_text(0, '#').as_str(), "Calibrating...  ");
        assert_eq!(frame.row_text(1, '#').as_str(), "3/10            ");
    }
}
