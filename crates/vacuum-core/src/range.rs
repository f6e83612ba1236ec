//! Linear rescaling of raw transducer counts into base-unit pressure.

use crate::config::{ADC_MAX, ADC_MIN, PRESSURE_MAX, PRESSURE_MIN};

/// Rescale `value` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// Integer interpolation with truncation toward zero. The input is not
/// clamped, so values outside the input span extrapolate. Intermediates are
/// 64-bit, which covers every 10-bit ADC window and any `i32` pressure span.
///
/// `in_min` must differ from `in_max`.
pub fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let scaled = (value as i64 - in_min as i64) * (out_max as i64 - out_min as i64)
        / (in_max as i64 - in_min as i64);
    (scaled + out_min as i64) as i32
}

/// Clamp `value` into `[low, high]`.
#[inline]
pub fn constrain(value: i32, low: i32, high: i32) -> i32 {
    value.max(low).min(high)
}

/// Raw count window of a transducer and the pressure span it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorRange {
    pub adc_min: u16,
    pub adc_max: u16,
    /// Millibar at `adc_min`.
    pub pressure_min: i32,
    /// Millibar at `adc_max`.
    pub pressure_max: i32,
}

impl SensorRange {
    pub const DEFAULT: Self = Self {
        adc_min: ADC_MIN,
        adc_max: ADC_MAX,
        pressure_min: PRESSURE_MIN,
        pressure_max: PRESSURE_MAX,
    };

    /// Clamp a raw count into the transducer window.
    #[inline]
    pub fn clamp_raw(&self, raw: u16) -> u16 {
        raw.clamp(self.adc_min, self.adc_max)
    }

    /// Convert a raw count to millibar. The result always lies in
    /// `[pressure_min, pressure_max]`.
    pub fn to_pressure(&self, raw: u16) -> i32 {
        map_range(
            self.clamp_raw(raw) as i32,
            self.adc_min as i32,
            self.adc_max as i32,
            self.pressure_min,
            self.pressure_max,
        )
    }
}

impl Default for SensorRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}
