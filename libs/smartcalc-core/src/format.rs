//! Fixed-precision number formatting
//!
//! Numbers are rounded to a number of significant digits and printed in
//! plain decimal notation, switching to exponential notation for very
//! small or very large magnitudes.

/// Significant digits used for every displayed result.
pub const DISPLAY_PRECISION: usize = 10;

/// Smallest decimal exponent printed in plain notation.
const LOWER_EXP: i32 = -3;

/// Decimal exponent from which exponential notation is used.
const UPPER_EXP: i32 = 5;

/// Format a number with `precision` significant digits.
///
/// ```
/// use smartcalc_core::format::format_number;
///
/// assert_eq!(format_number(12.0, 10), "12");
/// assert_eq!(format_number(1.0 / 3.0, 10), "0.3333333333");
/// assert_eq!(format_number(2.5e7, 10), "2.5e+7");
/// ```
pub fn format_number(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    // Rust rounds the mantissa for us: "-1.234500000e3"
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let negative = mantissa.starts_with('-');

    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    let body = if !(LOWER_EXP..UPPER_EXP).contains(&exponent) {
        exponential(digits, exponent)
    } else if exponent >= 0 {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            format!("{}{}", digits, "0".repeat(int_len - digits.len()))
        } else {
            format!("{}.{}", &digits[..int_len], &digits[int_len..])
        }
    } else {
        let leading_zeros = (-exponent - 1) as usize;
        format!("0.{}{}", "0".repeat(leading_zeros), digits)
    };

    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

fn exponential(digits: &str, exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    let (first, rest) = digits.split_at(1);
    if rest.is_empty() {
        format!("{}e{}{}", first, sign, exponent.abs())
    } else {
        format!("{}.{}e{}{}", first, rest, sign, exponent.abs())
    }
}
