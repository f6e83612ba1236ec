//! Base-unit (millibar) to display-unit conversions.
//!
//! Every conversion works on integers and returns a fixed-point value whose
//! scale is given by [`PressureUnit::decimals`]. The ratios are
//! coarse (1 PSI = 68.9 mbar, 1 inHg = 33.9 mbar, 1 mmHg = 4/3 mbar); the
//! display fields are sized for exactly these results.
//!
//! Applied to millibar, the ratios yield tenths of a PSI, tenths of an inHg
//! and whole mmHg: 1013 mbar converts to 147 (14.7 PSI), 298 (29.8 inHg) and
//! 759 mmHg.

/// Unit selected for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PressureUnit {
    #[default]
    Millibar,
    Psi,
    MmHg,
    InHg,
}

impl PressureUnit {
    /// Selection order in the units menu.
    pub const ALL: [Self; 4] = [Self::Millibar, Self::Psi, Self::MmHg, Self::InHg];

    /// Convert a millibar value to this unit, scaled by `10^decimals()`.
    pub fn convert(self, mbar: i32) -> i32 {
        let value = mbar as i64;
        let converted = match self {
            Self::Millibar => value,
            Self::Psi => value * 100 / 689,
            Self::MmHg => value * 75 / 100,
            Self::InHg => value * 100 / 339,
        };
        converted as i32
    }

    /// Number of implied decimal places in [`convert`](Self::convert)'s result.
    pub const fn decimals(self) -> u8 {
        match self {
            Self::Millibar => 0,
            Self::Psi => 1,
            Self::MmHg => 0,
            Self::InHg => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Millibar => "mBar",
            Self::Psi => "PSI",
            Self::MmHg => "mmHg",
            Self::InHg => "inHg",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|u| *u == self).unwrap_or(0)
    }

    /// Neighbouring unit in menu order, wrapping at both ends.
    pub fn step(self, delta: i8) -> Self {
        let len = Self::ALL.len() as i32;
        let next = (self.index() as i32 + delta as i32).rem_euclid(len);
        Self::ALL[next as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atmospheric_pressure_in_every_unit() {
        assert_eq!(PressureUnit::Millibar.convert(1013), 1013);
        assert_eq!(PressureUnit::Psi.convert(1013), 1013 * 100 / 689);
        assert_eq!(PressureUnit::Psi.convert(1013), 147);
        assert_eq!(PressureUnit::MmHg.convert(1013), 759);
        assert_eq!(PressureUnit::InHg.convert(1013), 298);
    }

    #[test]
    fn keeps_fixed_ratios_for_large_values() {
        assert_eq!(PressureUnit::Psi.convert(101_300), 14_702);
        assert_eq!(PressureUnit::InHg.convert(1150), 339);
        assert_eq!(PressureUnit::MmHg.convert(1150), 862);
    }

    #[test]
    fn negative_values_truncate_toward_zero() {
        assert_eq!(PressureUnit::Psi.convert(-850), -123);
        assert_eq!(PressureUnit::MmHg.convert(-850), -637);
        assert_eq!(PressureUnit::InHg.convert(-850), -250);
        assert_eq!(PressureUnit::Psi.convert(-1), 0);
    }

    #[test]
    fn step_wraps_through_menu_order() {
        assert_eq!(PressureUnit::Millibar.step(1), PressureUnit::Psi);
        assert_eq!(PressureUnit::InHg.step(1), PressureUnit::Millibar);
        assert_eq!(PressureUnit::Millibar.step(-1), PressureUnit::InHg);
        assert_eq!(PressureUnit::MmHg.step(2), PressureUnit::Millibar);
    }
}
