//! Compile-time configuration for the gauge.
//!
//! The constants describe the transducers fitted to the gauge (raw ADC window
//! and the pressure span it maps to), the scale of the differential gauge, and
//! the timing of the acquisition pipeline. [`GaugeConfig`] bundles them so the
//! core can be instantiated with an alternative transducer in tests or in the
//! simulator, and [`GaugeConfig::validate`] rejects combinations that would make
//! the range mapper divide by zero or the filter diverge.

use embassy_time::Duration;
use thiserror_no_std::Error;

use crate::range::SensorRange;

/// Lowest raw count the transducer produces (rail at full vacuum).
pub const ADC_MIN: u16 = 41;
/// Highest raw count the transducer produces.
pub const ADC_MAX: u16 = 962;
/// Largest value a 10-bit conversion can return.
pub const ADC_RESOLUTION_MAX: u16 = 1023;

/// Pressure in millibar at [`ADC_MIN`].
pub const PRESSURE_MIN: i32 = 150;
/// Pressure in millibar at [`ADC_MAX`].
pub const PRESSURE_MAX: i32 = 1150;

/// Deepest vacuum (relative to atmosphere) shown by the differential gauge.
pub const DIFFERENTIAL_MIN: i32 = -850;
/// Shallowest vacuum shown by the differential gauge.
pub const DIFFERENTIAL_MAX: i32 = 0;

pub const BAR_MIN: i32 = 0;
pub const BAR_MAX: i32 = 70;

/// EMA smoothing constant applied once per sampling tick.
pub const FILTER_CONSTANT: f32 = 0.99;
/// Conversions averaged per tick in oversampling mode.
pub const ADC_OVERSAMPLE: u8 = 10;

/// Period of the sampling interrupt.
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(4);
/// Sampling ticks between two display refreshes (50 x 4 ms = 200 ms).
pub const REFRESH_TICKS: u16 = 50;

/// Refresh ticks averaged by one calibration run.
pub const CALIBRATION_SAMPLES: u8 = 10;

/// Millibar per millimetre of mercury, used by the absolute view's secondary readout.
pub const MBAR_PER_MMHG: f32 = 1.33322;

/// How the sample filter smooths each channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterMode {
    /// Single-pole low pass: `filtered = alpha * filtered + (1 - alpha) * raw`.
    Exponential { alpha: f32 },
    /// Average `count` conversions taken back to back within one tick.
    Oversample { count: u8 },
}

/// Complete configuration of the acquisition and display pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeConfig {
    pub sensor: SensorRange,
    pub differential_min: i32,
    pub differential_max: i32,
    pub filter: FilterMode,
    pub refresh_ticks: u16,
    pub calibration_samples: u8,
}

impl GaugeConfig {
    pub const DEFAULT: Self = Self {
        sensor: SensorRange::DEFAULT,
        differential_min: DIFFERENTIAL_MIN,
        differential_max: DIFFERENTIAL_MAX,
        filter: FilterMode::Exponential {
            alpha: FILTER_CONSTANT,
        },
        refresh_ticks: REFRESH_TICKS,
        calibration_samples: CALIBRATION_SAMPLES,
    };

    /// Same configuration with a different sample filter.
    pub const fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Check the configuration for ranges the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sensor;
        if s.adc_min >= s.adc_max {
            return Err(ConfigError::EmptyAdcRange {
                min: s.adc_min,
                max: s.adc_max,
            });
        }
        if s.adc_max > ADC_RESOLUTION_MAX {
            return Err(ConfigError::AdcOutOfResolution(s.adc_max));
        }
        if s.pressure_min >= s.pressure_max {
            return Err(ConfigError::InvertedPressureRange {
                min: s.pressure_min,
                max: s.pressure_max,
            });
        }
        if self.differential_min >= self.differential_max {
            return Err(ConfigError::InvertedDifferentialRange {
                min: self.differential_min,
                max: self.differential_max,
            });
        }
        match self.filter {
            FilterMode::Exponential { alpha } if !(0.0..1.0).contains(&alpha) => {
                return Err(ConfigError::SmoothingOutOfRange);
            }
            FilterMode::Oversample { count: 0 } => return Err(ConfigError::ZeroOversample),
            _ => {}
        }
        if self.refresh_ticks == 0 {
            return Err(ConfigError::ZeroRefreshTicks);
        }
        if self.calibration_samples == 0 {
            return Err(ConfigError::ZeroCalibrationSamples);
        }
        Ok(())
    }
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("ADC range {min}..{max} is empty")]
    EmptyAdcRange { min: u16, max: u16 },
    #[error("ADC maximum {0} exceeds 10-bit resolution")]
    AdcOutOfResolution(u16),
    #[error("pressure range {min}..{max} is inverted or empty")]
    InvertedPressureRange { min: i32, max: i32 },
    #[error("differential range {min}..{max} is inverted or empty")]
    InvertedDifferentialRange { min: i32, max: i32 },
    #[error("smoothing constant must lie in [0, 1)")]
    SmoothingOutOfRange,
    #[error("oversample count must be non-zero")]
    ZeroOversample,
    #[error("refresh threshold must be non-zero")]
    ZeroRefreshTicks,
    #[error("calibration sample count must be non-zero")]
    ZeroCalibrationSamples,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(GaugeConfig::DEFAULT.validate(), Ok(()));
        assert_eq!(SAMPLE_PERIOD.as_millis() * REFRESH_TICKS as u64, 200);
    }

    #[test]
    fn rejects_empty_adc_range() {
        let mut config = GaugeConfig::DEFAULT;
        config.sensor.adc_min = 500;
        config.sensor.adc_max = 500;
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyAdcRange { min: 500, max: 500 })
        );
    }

    #[test]
    fn rejects_adc_beyond_ten_bits() {
        let mut config = GaugeConfig::DEFAULT;
        config.sensor.adc_max = 4095;
        assert_eq!(config.validate(), Err(ConfigError::AdcOutOfResolution(4095)));
    }

    #[test]
    fn rejects_bad_filter_settings() {
        let diverging = GaugeConfig::DEFAULT.with_filter(FilterMode::Exponential { alpha: 1.0 });
        assert_eq!(diverging.validate(), Err(ConfigError::SmoothingOutOfRange));

        let empty = GaugeConfig::DEFAULT.with_filter(FilterMode::Oversample { count: 0 });
        assert_eq!(empty.validate(), Err(ConfigError::ZeroOversample));

        let oversample = GaugeConfig::DEFAULT.with_filter(FilterMode::Oversample {
            count: ADC_OVERSAMPLE,
        });
        assert_eq!(oversample.validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_counts_and_inverted_ranges() {
        let mut config = GaugeConfig::DEFAULT;
        config.refresh_ticks = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRefreshTicks));

        let mut config = GaugeConfig::DEFAULT;
        config.calibration_samples = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroCalibrationSamples));

        let mut config = GaugeConfig::DEFAULT;
        config.differential_min = 10;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedDifferentialRange { min: 10, max: 0 })
        );
    }
}
