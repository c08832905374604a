//! Conversion between degrees/minutes/seconds text and decimal degrees.
//!
//! Latitudes are always south and longitudes always west, so decimal values
//! produced here are negative. Malformed text never errors; it reads as 0.

use crate::models::DmsValue;

/// Combine DMS text into signed decimal degrees.
///
/// Each field is read as a non-negative magnitude (sign characters are
/// ignored) and the sum is negated.
pub fn to_decimal(degrees: &str, minutes: &str, seconds: &str) -> f64 {
    let magnitude =
        parse_magnitude(degrees) + parse_magnitude(minutes) / 60.0 + parse_magnitude(seconds) / 3600.0;
    -magnitude
}

/// Split decimal degrees into DMS text, seconds rounded to hundredths.
///
/// Seconds that round up to 60 carry into the minutes.
pub fn to_dms(decimal: f64) -> DmsValue {
    let value = if decimal.is_finite() { decimal.abs() } else { 0.0 };

    let mut degrees = value.floor();
    let minutes_raw = (value - degrees) * 60.0;
    let mut minutes = minutes_raw.floor();
    let mut seconds = round_to((minutes_raw - minutes) * 60.0, 2);

    if seconds >= 60.0 {
        seconds = (seconds - 60.0).max(0.0);
        minutes += 1.0;
    }
    if minutes >= 60.0 {
        minutes -= 60.0;
        degrees += 1.0;
    }

    DmsValue {
        degrees: format!("{:.0}", degrees),
        minutes: format!("{:.0}", minutes),
        seconds: format!("{:.2}", seconds),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Read the leading number of `text`, the way a lenient form field would.
///
/// Takes the longest prefix that reads as a float (optional sign, digits,
/// one `.`, optional exponent) and ignores the rest, so `"30,5"` is 30 and
/// `"1e1"` is 10.
fn parse_magnitude(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = leading_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = leading_digits(&bytes[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = leading_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(f64::abs)
        .unwrap_or(0.0)
}

fn leading_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
