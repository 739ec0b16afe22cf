use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest number of sub-second digits honoured by [`to_sexagesimal`].
pub const MAX_PRECISION: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    Degrees,
    Hours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSymbols {
    pub whole: &'static str,
    pub minutes: &'static str,
    pub seconds: &'static str,
}

impl AngleUnit {
    pub fn symbols(self) -> UnitSymbols {
        match self {
            AngleUnit::Degrees => UnitSymbols {
                whole: "°",
                minutes: "′",
                seconds: "″",
            },
            AngleUnit::Hours => UnitSymbols {
                whole: "h",
                minutes: "m",
                seconds: "s",
            },
        }
    }
}

/// Base-60 breakdown of a decimal angle.
///
/// The integer fields and the pre-formatted strings come from the same
/// rounding, so `seconds` and `minutes` never reach 60.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sexagesimal {
    pub unit: AngleUnit,
    pub sign: char,
    pub whole: u64,
    pub minutes: u32,
    pub seconds: u32,
    pub milliseconds: u32,
    pub whole_str: String,
    pub minute_str: String,
    pub second_str: String,
}

impl Sexagesimal {
    pub fn is_negative(&self) -> bool {
        self.sign == '-'
    }
}

impl fmt::Display for Sexagesimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols = self.unit.symbols();
        // Hours read naturally without a leading '+'.
        if self.is_negative() || self.unit == AngleUnit::Degrees {
            write!(f, "{}", self.sign)?;
        }
        write!(
            f,
            "{}{}{}{}{}{}",
            self.whole_str,
            symbols.whole,
            self.minute_str,
            symbols.minutes,
            self.second_str,
            symbols.seconds
        )
    }
}

/// Splits a decimal angle into whole/minutes/seconds, rounding the seconds to
/// `precision` decimals and carrying any overflow upward.
///
/// Returns `None` for NaN or infinite input, and for magnitudes whose
/// seconds do not fit in a `u64`.
pub fn to_sexagesimal(value: f64, precision: u32, unit: AngleUnit) -> Option<Sexagesimal> {
    if !value.is_finite() || value.abs() * 3600.0 >= u64::MAX as f64 {
        return None;
    }

    let precision = precision.min(MAX_PRECISION);
    let scale = 10f64.powi(precision as i32);

    // Work in integer units of 10^-precision seconds so the carry is exact.
    let total_units = (value.abs() * 3600.0 * scale).round();
    let mut whole_seconds = (total_units / scale).floor();
    let mut fraction = total_units - whole_seconds * scale;
    if fraction >= scale {
        whole_seconds += 1.0;
        fraction -= scale;
    } else if fraction < 0.0 {
        whole_seconds -= 1.0;
        fraction += scale;
    }

    let whole_seconds = whole_seconds as u64;
    let whole = whole_seconds / 3600;
    let minutes = ((whole_seconds % 3600) / 60) as u32;
    let seconds = (whole_seconds % 60) as u32;
    let milliseconds = ((fraction * 1000.0 / scale).floor() as u32).min(999);

    let second_str = if precision == 0 {
        format!("{:02}", seconds)
    } else {
        format!(
            "{:02}.{:0width$}",
            seconds,
            fraction as u64,
            width = precision as usize
        )
    };

    Some(Sexagesimal {
        unit,
        sign: if value < 0.0 { '-' } else { '+' },
        whole,
        minutes,
        seconds,
        milliseconds,
        whole_str: whole.to_string(),
        minute_str: format!("{:02}", minutes),
        second_str,
    })
}

/// Parses `12:34:56`, `-12°34′56.7″`, `5h 30m`, `+0 30` and similar.
///
/// Any run of characters other than digits and the decimal point separates
/// fields. Missing trailing fields are zero. Unparseable input yields `0.0`.
pub fn from_sexagesimal(text: &str, unit: AngleUnit) -> f64 {
    let symbols = unit.symbols();
    let mut cleaned = text.trim().to_string();
    for symbol in [symbols.whole, symbols.minutes, symbols.seconds] {
        cleaned = cleaned.replace(symbol, ":");
    }

    let cleaned = cleaned.trim_start();
    let (negative, body) = if let Some(rest) = cleaned.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = cleaned.strip_prefix('\u{2212}') {
        (true, rest)
    } else {
        (false, cleaned.strip_prefix('+').unwrap_or(cleaned))
    };

    let fields: Vec<&str> = body
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|field| !field.is_empty())
        .take(3)
        .collect();
    if fields.is_empty() {
        return 0.0;
    }

    let mut parts = [0.0f64; 3];
    for (slot, field) in parts.iter_mut().zip(&fields) {
        match field.parse::<f64>() {
            Ok(v) => *slot = v,
            Err(_) => return 0.0,
        }
    }

    let magnitude = parts[0] + parts[1] / 60.0 + parts[2] / 3600.0;
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn splits_degrees() {
        let dms = to_sexagesimal(12.5822, 1, AngleUnit::Degrees).unwrap();
        assert_eq!(dms.sign, '+');
        assert_eq!(dms.whole, 12);
        assert_eq!(dms.minutes, 34);
        assert_eq!(dms.seconds, 55);
        assert_eq!(dms.second_str, "55.9");
        assert_eq!(dms.to_string(), "+12°34′55.9″");
    }

    #[test]
    fn negative_hours_keep_sign() {
        let hms = to_sexagesimal(-5.5, 0, AngleUnit::Hours).unwrap();
        assert!(hms.is_negative());
        assert_eq!(hms.to_string(), "-5h30m00s");
        let positive = to_sexagesimal(5.5, 0, AngleUnit::Hours).unwrap();
        assert_eq!(positive.to_string(), "5h30m00s");
    }

    #[test]
    fn rounding_carries_into_minutes_and_degrees() {
        // 29.99999 degrees is 29°59'59.964"
        let dms = to_sexagesimal(29.99999, 0, AngleUnit::Degrees).unwrap();
        assert_eq!((dms.whole, dms.minutes, dms.seconds), (30, 0, 0));
        assert_eq!(dms.second_str, "00");

        let dms = to_sexagesimal(29.99999, 1, AngleUnit::Degrees).unwrap();
        assert_eq!((dms.whole, dms.minutes, dms.seconds), (30, 0, 0));
        assert_eq!(dms.second_str, "00.0");

        let dms = to_sexagesimal(29.99999, 3, AngleUnit::Degrees).unwrap();
        assert_eq!((dms.whole, dms.minutes, dms.seconds), (29, 59, 59));
        assert_eq!(dms.second_str, "59.964");
        assert_eq!(dms.milliseconds, 964);
    }

    #[test]
    fn second_field_width_follows_precision() {
        for precision in 0..5 {
            let dms = to_sexagesimal(1.0001, precision, AngleUnit::Degrees).unwrap();
            let expected = if precision == 0 { 2 } else { 3 + precision as usize };
            assert_eq!(dms.second_str.len(), expected, "precision {}", precision);
        }
    }

    #[test]
    fn non_finite_input_has_no_result() {
        assert!(to_sexagesimal(f64::NAN, 2, AngleUnit::Degrees).is_none());
        assert!(to_sexagesimal(f64::INFINITY, 2, AngleUnit::Hours).is_none());
    }

    #[test]
    fn huge_magnitudes_have_no_result() {
        for value in [1e16, -1e17, 1e20] {
            assert!(to_sexagesimal(value, 0, AngleUnit::Degrees).is_none(), "{}", value);
        }
        let large = to_sexagesimal(1e15, 0, AngleUnit::Degrees).unwrap();
        assert_eq!(large.whole, 1_000_000_000_000_000);
        assert_eq!((large.minutes, large.seconds), (0, 0));
    }

    #[test]
    fn parses_assorted_separators() {
        assert_abs_diff_eq!(from_sexagesimal("12:30:00", AngleUnit::Degrees), 12.5, epsilon = 1e-9);
        assert_abs_diff_eq!(from_sexagesimal("-12°30′36″", AngleUnit::Degrees), -12.51, epsilon = 1e-9);
        assert_abs_diff_eq!(from_sexagesimal("5h 15m", AngleUnit::Hours), 5.25, epsilon = 1e-9);
        assert_abs_diff_eq!(from_sexagesimal("+0 30", AngleUnit::Degrees), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(from_sexagesimal("  -0:30", AngleUnit::Degrees), -0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(from_sexagesimal("\u{2212}1", AngleUnit::Degrees), -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(from_sexagesimal("10", AngleUnit::Hours), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn malformed_text_falls_back_to_zero() {
        assert_eq!(from_sexagesimal("", AngleUnit::Degrees), 0.0);
        assert_eq!(from_sexagesimal("north", AngleUnit::Degrees), 0.0);
        assert_eq!(from_sexagesimal("1.2.3:4", AngleUnit::Degrees), 0.0);
    }

    #[test]
    fn formatted_text_parses_back() {
        let samples = [0.0, 0.25, -0.25, 12.3456789, -45.0001, 89.99999, 359.5, 23.999];
        for unit in [AngleUnit::Degrees, AngleUnit::Hours] {
            for precision in 0..4 {
                for value in samples {
                    let text = to_sexagesimal(value, precision, unit).unwrap().to_string();
                    let back = from_sexagesimal(&text, unit);
                    let tolerance = 10f64.powi(-(precision as i32));
                    assert!(
                        (back - value).abs() <= tolerance,
                        "{} -> {} -> {}",
                        value,
                        text,
                        back
                    );
                }
            }
        }
    }
}
