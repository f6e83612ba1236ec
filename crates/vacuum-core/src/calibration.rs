//! Zero-point calibration of the two transducers.
//!
//! Both ports must be open to atmosphere while a run is in progress. The gauge
//! cannot check this and will calibrate against whatever pressure is present.

use crate::range::SensorRange;
use crate::shared::CalibratedReadings;

/// Result of a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationState {
    /// Ambient pressure seen by the vacuum port, in millibar.
    pub atmospheric_reference: i32,
    /// Added to the reference channel so both ports agree at ambient pressure.
    pub channel_offset: i32,
}

/// Averages a fixed number of refresh-tick readings into a [`CalibrationState`].
#[derive(Debug, Clone)]
pub struct Calibrator {
    samples: u8,
    count: u8,
    vacuum_sum: u32,
    reference_sum: u32,
}

impl Calibrator {
    pub const fn new(samples: u8) -> Self {
        Self {
            samples,
            count: 0,
            vacuum_sum: 0,
            reference_sum: 0,
        }
    }

    /// Accumulate one pair. Returns the finished state on the `samples`-th
    /// call and starts over.
    pub fn step(
        &mut self,
        readings: CalibratedReadings,
        sensor: &SensorRange,
    ) -> Option<CalibrationState> {
        self.vacuum_sum += readings.vacuum as u32;
        self.reference_sum += readings.reference as u32;
        self.count += 1;

        if self.count < self.samples.max(1) {
            return None;
        }

        let count = self.count as u32;
        let vacuum = (self.vacuum_sum / count) as u16;
        let reference = (self.reference_sum / count) as u16;
        self.reset();

        let atmospheric_reference = sensor.to_pressure(vacuum);
        Some(CalibrationState {
            atmospheric_reference,
            channel_offset: atmospheric_reference - sensor.to_pressure(reference),
        })
    }

    /// Drop a partially accumulated run.
    pub fn reset(&mut self) {
        self.count = 0;
        self.vacuum_sum = 0;
        self.reference_sum = 0;
    }

    /// Steps taken so far and steps needed.
    pub fn progress(&self) -> (u8, u8) {
        (self.count, self.samples)
    }
}
