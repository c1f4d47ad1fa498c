//! Raw controller units to display units.
//!
//! The controller reports temperatures as `raw = (°F - 32) * 50 / 9`, so the
//! inverse is `°F = 9/50 * raw + 32`. Results are whole degrees, rounded half
//! to even, and computed in integer arithmetic so a raw value whose exact
//! result ends in .5 never drifts through a float representation. The
//! arithmetic is widened to `i128`; any `i64` raw value converts without
//! overflow and the result always fits back into an `i64`.

/// Probe value the controller sends when nothing is plugged in.
pub const PROBE_DISCONNECTED: i64 = -32767;

const BLOWER_SCALE: f64 = 100.0;

/// `round_half_even(9/50 * raw + 32)`.
pub fn fahrenheit_from_raw(raw: i64) -> i64 {
    let numerator = 9 * i128::from(raw) + 32 * 50;
    // |9/50 * raw + 32| < i64::MAX for every i64 input.
    round_half_even(numerator, 50) as i64
}

/// Converts a probe reading; the disconnected sentinel maps to `None`.
pub fn probe_fahrenheit(raw: Option<i64>) -> Option<f64> {
    match raw {
        Some(PROBE_DISCONNECTED) | None => None,
        Some(value) => Some(fahrenheit_from_raw(value) as f64),
    }
}

pub fn set_point_fahrenheit(raw: Option<i64>) -> Option<f64> {
    raw.map(|value| fahrenheit_from_raw(value) as f64)
}

/// Blower output as a 0-100 percentage.
pub fn blower_percent(raw: Option<i64>) -> Option<f64> {
    raw.map(|value| value as f64 / BLOWER_SCALE)
}

fn round_half_even(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator.div_euclid(denominator);
    let twice_remainder = 2 * numerator.rem_euclid(denominator);

    if twice_remainder > denominator {
        quotient + 1
    } else if twice_remainder < denominator {
        quotient
    } else if quotient % 2 == 0 {
        quotient
    } else {
        quotient + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_points() {
        assert_eq!(fahrenheit_from_raw(0), 32);
        assert_eq!(fahrenheit_from_raw(50), 41);
        assert_eq!(fahrenheit_from_raw(100), 50);
        // 224.96 -> 225, a typical smoker set point.
        assert_eq!(fahrenheit_from_raw(1072), 225);
    }

    #[test]
    fn halves_round_to_even_in_both_directions() {
        // 36.5 -> 36 (down to even)
        assert_eq!(fahrenheit_from_raw(25), 36);
        // 45.5 -> 46 (up to even)
        assert_eq!(fahrenheit_from_raw(75), 46);
        // 27.5 -> 28 below the offset too
        assert_eq!(fahrenheit_from_raw(-25), 28);
        // 0.5 -> 0
        assert_eq!(fahrenheit_from_raw(-175), 0);
    }

    #[test]
    fn non_halves_round_to_nearest() {
        // 32.18 -> 32
        assert_eq!(fahrenheit_from_raw(1), 32);
        // 33.8 -> 34
        assert_eq!(fahrenheit_from_raw(10), 34);
        // -40 stays -40
        assert_eq!(fahrenheit_from_raw(-400), -40);
    }

    #[test]
    fn extreme_raw_values_do_not_overflow() {
        assert_eq!(fahrenheit_from_raw(i64::MAX), 1_660_206_966_633_859_677);
        assert_eq!(fahrenheit_from_raw(i64::MIN), -1_660_206_966_633_859_613);
        assert_eq!(fahrenheit_from_raw(1_024_819_115_206_086_201), 184_467_440_737_095_548);
    }

    #[test]
    fn disconnected_probe_is_none() {
        assert_eq!(probe_fahrenheit(Some(PROBE_DISCONNECTED)), None);
        assert_eq!(probe_fahrenheit(None), None);
        assert_eq!(probe_fahrenheit(Some(100)), Some(50.0));
    }

    #[test]
    fn set_point_has_no_sentinel() {
        assert_eq!(set_point_fahrenheit(Some(50)), Some(41.0));
        assert_eq!(set_point_fahrenheit(None), None);
    }

    #[test]
    fn blower_scales_to_percent() {
        assert_eq!(blower_percent(Some(2500)), Some(25.0));
        assert_eq!(blower_percent(Some(10000)), Some(100.0));
        assert_eq!(blower_percent(Some(1)), Some(0.01));
        assert_eq!(blower_percent(None), None);
    }
}
