//! Periodic acquisition and low-pass filtering of both pressure channels.
//!
//! [`SampleFilter::tick`] is meant to be called from the sampling timer
//! interrupt every [`SAMPLE_PERIOD`](crate::config::SAMPLE_PERIOD). It never
//! blocks and never logs: it reads the ADC, updates the per-channel filter
//! state, publishes the clamped pair to [`SharedState`] and raises the refresh
//! signal every `refresh_ticks` calls.

use crate::config::{FilterMode, GaugeConfig};
use crate::range::SensorRange;
use crate::shared::{CalibratedReadings, SharedState};

/// Analog input wired to a transducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Port A, the side connected to the engine.
    Vacuum,
    /// Port B, the reference side.
    Reference,
}

/// Source of raw 10-bit conversions.
pub trait PressureInputs {
    /// Perform one conversion on `channel`.
    fn read(&mut self, channel: Channel) -> u16;
}

impl<T: PressureInputs + ?Sized> PressureInputs for &mut T {
    fn read(&mut self, channel: Channel) -> u16 {
        (**self).read(channel)
    }
}

pub struct SampleFilter {
    mode: FilterMode,
    sensor: SensorRange,
    refresh_ticks: u16,
    vacuum: f32,
    reference: f32,
    seeded: bool,
    ticks: u16,
}

impl SampleFilter {
    pub fn new(config: &GaugeConfig) -> Self {
        Self {
            mode: config.filter,
            sensor: config.sensor,
            refresh_ticks: config.refresh_ticks,
            vacuum: 0.0,
            reference: 0.0,
            seeded: false,
            ticks: 0,
        }
    }

    /// One timer period: sample, publish and count towards the next refresh.
    ///
    /// Returns `true` when this tick raised the refresh signal.
    pub fn tick<A: PressureInputs>(&mut self, adc: &mut A, shared: &SharedState) -> bool {
        let readings = self.sample(adc);
        shared.publish(readings);

        self.ticks += 1;
        if self.ticks >= self.refresh_ticks {
            self.ticks = 0;
            shared.raise_refresh();
            true
        } else {
            false
        }
    }

    /// Update the filter state from fresh conversions and return the clamped pair.
    pub fn sample<A: PressureInputs>(&mut self, adc: &mut A) -> CalibratedReadings {
        match self.mode {
            FilterMode::Exponential { alpha } => {
                let vacuum = adc.read(Channel::Vacuum) as f32;
                let reference = adc.read(Channel::Reference) as f32;
                if self.seeded {
                    self.vacuum = smooth(alpha, self.vacuum, vacuum);
                    self.reference = smooth(alpha, self.reference, reference);
                } else {
                    // First conversion seeds the filter so it does not ramp up from zero.
                    self.vacuum = vacuum;
                    self.reference = reference;
                    self.seeded = true;
                }
            }
            FilterMode::Oversample { count } => {
                self.vacuum = oversample(adc, Channel::Vacuum, count);
                self.reference = oversample(adc, Channel::Reference, count);
            }
        }

        self.current()
    }

    /// Filter state floored and clamped into the transducer window.
    pub fn current(&self) -> CalibratedReadings {
        CalibratedReadings::new(self.publishable(self.vacuum), self.publishable(self.reference))
    }

    fn publishable(&self, filtered: f32) -> u16 {
        // `as` saturates, and truncation is the floor for non-negative values.
        self.sensor.clamp_raw(filtered.max(0.0) as u16)
    }
}

#[inline]
fn smooth(alpha: f32, previous: f32, raw: f32) -> f32 {
    alpha * previous + (1.0 - alpha) * raw
}

fn oversample<A: PressureInputs>(adc: &mut A, channel: Channel, count: u8) -> f32 {
    let count = count.max(1);
    let sum: u32 = (0..count).map(|_| adc.read(channel) as u32).sum();
    sum as f32 / count as f32
}
