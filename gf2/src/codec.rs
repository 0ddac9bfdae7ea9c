//! Conversion between physical quantities and register codes
//!
//! Codes are rounded half-up. [`expected`] predicts the value the hardware
//! will actually produce for a request, so callers can report it back.

use core::fmt;

use crate::bsp::{AMPLITUDE_MAX, AMPLITUDE_MIN, FREQUENCY_MAX, FREQUENCY_MIN, MCLK};
use crate::error::OutOfRange;

/// 28-bit frequency tuning word
pub const FQUANTUM: f64 = (1u32 << 28) as f64;
/// 12-bit phase word
pub const PQUANTUM: f64 = 4096.0;
/// Full scale of the 10-bit amplitude DAC
pub const AQUANTUM: f64 = 1023.0;

const DEGREES: f64 = 360.0;

/// Physical quantities the device can be programmed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// kHz
    Frequency,
    /// Degrees
    Phase,
    /// Volts peak-to-peak
    Amplitude,
}

impl Quantity {
    /// Valid input range, `None` for phase which wraps
    pub const fn range(self) -> Option<(f64, f64)> {
        match self {
            Quantity::Frequency => Some((FREQUENCY_MIN, FREQUENCY_MAX)),
            Quantity::Phase => None,
            Quantity::Amplitude => Some((AMPLITUDE_MIN, AMPLITUDE_MAX)),
        }
    }

    /// Number of register steps per `span`
    pub const fn quantum(self) -> f64 {
        match self {
            Quantity::Frequency => FQUANTUM,
            Quantity::Phase => PQUANTUM,
            Quantity::Amplitude => AQUANTUM,
        }
    }

    /// Physical value corresponding to `quantum` steps
    pub const fn span(self) -> f64 {
        match self {
            Quantity::Frequency => MCLK,
            Quantity::Phase => DEGREES,
            Quantity::Amplitude => AMPLITUDE_MAX,
        }
    }

    /// Reject values the hardware can't represent
    pub fn check(self, value: f64) -> Result<(), OutOfRange> {
        match self.range() {
            // Written so NaN fails too
            Some((min, max)) if !(value >= min && value <= max) => Err(OutOfRange {
                quantity: self,
                value,
                min,
                max,
            }),
            None if !value.is_finite() => Err(OutOfRange {
                quantity: self,
                value,
                min: 0.0,
                max: DEGREES,
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Quantity::Frequency => "frequency",
            Quantity::Phase => "phase",
            Quantity::Amplitude => "amplitude",
        })
    }
}

/// Reduce any angle into [0, 360)
pub fn fold_phase(degrees: f64) -> f64 {
    let folded = degrees % DEGREES;
    if folded >= 0.0 {
        return folded;
    }
    let wrapped = folded + DEGREES;
    // Tiny negative angles round up to a full turn
    if wrapped >= DEGREES {
        0.0
    } else {
        wrapped
    }
}

/// Quantize `value` into a register code
pub fn encode(quantity: Quantity, value: f64) -> Result<u32, OutOfRange> {
    quantity.check(value)?;
    let steps = match quantity {
        Quantity::Phase => fold_phase(value),
        _ => value,
    } * quantity.quantum()
        / quantity.span();
    let code = (steps + 0.5) as u32;
    Ok(match quantity {
        // 360 degrees is 0 degrees
        Quantity::Phase => code % PQUANTUM as u32,
        _ => code,
    })
}

/// Physical value that a register code produces
pub fn decode(quantity: Quantity, code: u32) -> f64 {
    f64::from(code) * quantity.span() / quantity.quantum()
}

/// Value the hardware will produce when asked for `value`
///
/// Out of range inputs are not rejected here; they simply predict what the
/// same arithmetic would give.
pub fn expected(quantity: Quantity, value: f64) -> f64 {
    match quantity {
        Quantity::Phase => {
            let steps = (fold_phase(value) * PQUANTUM / DEGREES).round() % PQUANTUM;
            steps * DEGREES / PQUANTUM
        }
        _ => {
            let steps = (value * quantity.quantum() / quantity.span()).round();
            steps * quantity.span() / quantity.quantum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amplitude_midscale() {
        assert_eq!(encode(Quantity::Amplitude, 4.0).unwrap(), 512);
        assert!((expected(Quantity::Amplitude, 4.0) - 4.0039).abs() < 5e-5);
    }

    #[test]
    fn amplitude_limits() {
        assert_eq!(encode(Quantity::Amplitude, 0.0).unwrap(), 0);
        assert_eq!(encode(Quantity::Amplitude, 8.0).unwrap(), 1023);
        assert!(encode(Quantity::Amplitude, -0.001).is_err());
        assert!(encode(Quantity::Amplitude, 8.001).is_err());
        assert!(encode(Quantity::Amplitude, f64::NAN).is_err());
    }

    #[test]
    fn frequency_limits() {
        assert_eq!(encode(Quantity::Frequency, 0.0).unwrap(), 0);
        assert_eq!(encode(Quantity::Frequency, 40_000.0).unwrap(), 1 << 27);
        let err = encode(Quantity::Frequency, 40_001.0).unwrap_err();
        assert_eq!(err.quantity, Quantity::Frequency);
        assert_eq!(err.max, 40_000.0);
        assert!(encode(Quantity::Frequency, -1.0).is_err());
    }

    #[test]
    fn frequency_rounds_half_up() {
        // One LSB is MCLK / 2^28 kHz
        let lsb = MCLK / FQUANTUM;
        assert_eq!(encode(Quantity::Frequency, lsb * 0.49).unwrap(), 0);
        assert_eq!(encode(Quantity::Frequency, lsb * 0.51).unwrap(), 1);
        assert_eq!(encode(Quantity::Frequency, lsb * 1.5).unwrap(), 2);
    }

    #[test]
    fn frequency_round_trip_matches_expected() {
        let max_err = MCLK / (2.0 * FQUANTUM);
        let mut f = 0.0;
        while f <= FREQUENCY_MAX {
            let code = encode(Quantity::Frequency, f).unwrap();
            let realized = decode(Quantity::Frequency, code);
            assert_eq!(realized, expected(Quantity::Frequency, f), "at {f} kHz");
            assert!((realized - f).abs() <= max_err + 1e-9, "at {f} kHz");
            f += 123.456_789;
        }
    }

    #[test]
    fn phase_folds_into_one_turn() {
        assert_eq!(fold_phase(-90.0), 270.0);
        assert_eq!(fold_phase(720.0), 0.0);
        assert_eq!(fold_phase(45.0), 45.0);
        assert_eq!(fold_phase(-1e-20), 0.0);
        assert!((0.0..360.0).contains(&fold_phase(-1e-14)));
        assert_eq!(encode(Quantity::Phase, -90.0).unwrap(), 3072);
        assert_eq!(encode(Quantity::Phase, 90.0).unwrap(), 1024);
    }

    #[test]
    fn phase_just_below_a_turn_wraps_to_zero() {
        assert_eq!(encode(Quantity::Phase, 359.99).unwrap(), 0);
        assert_eq!(expected(Quantity::Phase, 359.99), 0.0);
    }

    #[test]
    fn phase_is_periodic_and_bounded() {
        for p in [-725.5, -360.0, -12.25, 0.0, 1.0, 45.0, 180.0, 333.3, 359.9, 1000.0] {
            let e = expected(Quantity::Phase, p);
            assert!((0.0..360.0).contains(&e), "{p} -> {e}");
            assert_eq!(e, expected(Quantity::Phase, p + 360.0), "at {p}");
        }
    }

    #[test]
    fn phase_must_be_finite() {
        assert!(encode(Quantity::Phase, f64::NAN).is_err());
        assert!(encode(Quantity::Phase, f64::INFINITY).is_err());
        assert!(encode(Quantity::Phase, -1e6).is_ok());
    }

    #[test]
    fn amplitude_expected_is_monotonic() {
        let mut last = 0.0;
        for i in 0..=800 {
            let e = expected(Quantity::Amplitude, f64::from(i) * 0.01);
            assert!(e >= last);
            last = e;
        }
    }
}
