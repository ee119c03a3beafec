//! Numeric checks and coercions
//!
//! Integer division with zero detection, range-checked conversions between
//! floats and integers, tolerance comparison, and canonical number text.
//!
//! Every conversion that cannot represent its input exactly enough fails
//! with [`Error::Bubble`](crate::error::Error::Bubble), including NaN.
//!
//! # Examples
//!
//! ```
//! use weft_core::numeric::{float64_to_int, float64_to_string};
//!
//! assert_eq!(float64_to_int(-2.9), Ok(-2));
//! assert!(float64_to_int(f64::NAN).is_err());
//! assert_eq!(float64_to_string(1e10), "1.0e+10");
//! ```

use crate::error::{Error, Result, bubble};

/// Largest magnitude an f64 holds with every integer below it representable
pub const MANTISSA_LIMIT: i64 = (1i64 << 53) - 1;

// =============================================================================
// Integer division
// =============================================================================

pub fn div_int(left: i32, right: i32) -> Result<i32> {
    if right == 0 {
        return Err(bubble());
    }
    Ok(left.wrapping_div(right))
}

pub fn div_int64(left: i64, right: i64) -> Result<i64> {
    if right == 0 {
        return Err(bubble());
    }
    Ok(left.wrapping_div(right))
}

pub fn mod_int(left: i32, right: i32) -> Result<i32> {
    if right == 0 {
        return Err(bubble());
    }
    Ok(left.wrapping_rem(right))
}

pub fn mod_int64(left: i64, right: i64) -> Result<i64> {
    if right == 0 {
        return Err(bubble());
    }
    Ok(left.wrapping_rem(right))
}

// =============================================================================
// Range-checked conversions
// =============================================================================

/// Truncate toward zero, accepting only `(i32::MIN - 1, i32::MAX + 1)`
pub fn float64_to_int(n: f64) -> Result<i32> {
    // NaN fails both comparisons
    if n > i32::MIN as f64 - 1.0 && n < i32::MAX as f64 + 1.0 {
        Ok(n as i32)
    } else {
        Err(bubble())
    }
}

/// Truncate toward zero, accepting only `[-(2^53 - 1), 2^53 - 1]`
pub fn float64_to_int64(n: f64) -> Result<i64> {
    let limit = MANTISSA_LIMIT as f64;
    if n >= -limit && n <= limit {
        Ok(n as i64)
    } else {
        Err(bubble())
    }
}

pub fn int64_to_float64(n: i64) -> Result<f64> {
    if (-MANTISSA_LIMIT..=MANTISSA_LIMIT).contains(&n) {
        Ok(n as f64)
    } else {
        Err(bubble())
    }
}

pub fn int64_to_int(n: i64) -> Result<i32> {
    i32::try_from(n).map_err(|_| bubble())
}

// =============================================================================
// Tolerance comparison
// =============================================================================

/// Near-equality with `rel_tol = 1e-9` and `abs_tol = 0`
pub fn float64_near(x: f64, y: f64) -> bool {
    float64_near_with(x, y, None, None)
}

/// Near-equality: `|x - y| < max(max(|x|, |y|) * rel_tol, abs_tol)`
///
/// NaN on either side compares false.
pub fn float64_near_with(x: f64, y: f64, rel_tol: Option<f64>, abs_tol: Option<f64>) -> bool {
    let rel = rel_tol.unwrap_or(1e-9);
    let abs = abs_tol.unwrap_or(0.0);
    let margin = (x.abs().max(y.abs()) * rel).max(abs);
    (x - y).abs() < margin
}

// =============================================================================
// Number text
// =============================================================================

/// Canonical float text
///
/// Plain decimal for `1e-3 <= |n| < 1e7`, scientific otherwise, always with
/// at least one fractional digit. The exponent is written `e` with an
/// explicit sign. Digits are the shortest that round-trip.
pub fn float64_to_string(n: f64) -> String {
    if n == 0.0 {
        return if n.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "-1.2345e10"
    let sci = format!("{:e}", n.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let mut out = String::new();
    if n < 0.0 {
        out.push('-');
    }

    let magnitude = n.abs();
    if (1e-3..1e7).contains(&magnitude) {
        if exponent >= 0 {
            let int_len = exponent as usize + 1;
            if digits.len() > int_len {
                out.push_str(&digits[..int_len]);
                out.push('.');
                out.push_str(&digits[int_len..]);
            } else {
                out.push_str(&digits);
                out.extend(std::iter::repeat_n('0', int_len - digits.len()));
                out.push_str(".0");
            }
        } else {
            out.push_str("0.");
            out.extend(std::iter::repeat_n('0', (-exponent - 1) as usize));
            out.push_str(&digits);
        }
    } else {
        out.push_str(&digits[..1]);
        out.push('.');
        if digits.len() > 1 {
            out.push_str(&digits[1..]);
        } else {
            out.push('0');
        }
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&exponent.unsigned_abs().to_string());
    }
    out
}

/// Render an integer in the given radix (2..=36), lowercase digits
pub fn int_to_string(n: i64, radix: u32) -> Result<String> {
    if !(2..=36).contains(&radix) {
        return Err(Error::invalid_argument(format!("radix out of range: {}", radix)));
    }
    if n == 0 {
        return Ok("0".to_string());
    }
    let mut magnitude = n.unsigned_abs();
    let mut digits = Vec::new();
    while magnitude > 0 {
        let d = (magnitude % radix as u64) as u32;
        digits.push(char::from_digit(d, radix).unwrap_or('?'));
        magnitude /= radix as u64;
    }
    if n < 0 {
        digits.push('-');
    }
    Ok(digits.into_iter().rev().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_div_and_mod_by_zero_bubble() {
        assert!(div_int(1, 0).unwrap_err().is_bubble());
        assert!(mod_int(1, 0).unwrap_err().is_bubble());
        assert!(div_int64(1, 0).unwrap_err().is_bubble());
        assert!(mod_int64(1, 0).unwrap_err().is_bubble());
    }

    #[test]
    fn test_div_and_mod() {
        assert_eq!(div_int(7, 2), Ok(3));
        assert_eq!(div_int(-7, 2), Ok(-3));
        assert_eq!(mod_int(-7, 2), Ok(-1));
        assert_eq!(div_int64(1 << 40, 1 << 20), Ok(1 << 20));
        // i32::MIN / -1 overflows; wrapping keeps it total
        assert_eq!(div_int(i32::MIN, -1), Ok(i32::MIN));
        assert_eq!(mod_int(i32::MIN, -1), Ok(0));
    }

    #[test]
    fn test_float64_to_int_bounds() {
        assert_eq!(float64_to_int(2147483647.9), Ok(i32::MAX));
        assert_eq!(float64_to_int(-2147483648.9), Ok(i32::MIN));
        assert!(float64_to_int(2147483648.0).is_err());
        assert!(float64_to_int(-2147483649.0).is_err());
        assert!(float64_to_int(f64::NAN).is_err());
        assert!(float64_to_int(f64::INFINITY).is_err());
        assert_eq!(float64_to_int(-0.5), Ok(0));
    }

    #[test]
    fn test_float64_to_int64_bounds() {
        let limit = MANTISSA_LIMIT as f64;
        assert_eq!(float64_to_int64(limit), Ok(MANTISSA_LIMIT));
        assert_eq!(float64_to_int64(-limit), Ok(-MANTISSA_LIMIT));
        assert!(float64_to_int64(limit + 1.0).is_err());
        assert!(float64_to_int64(f64::NAN).is_err());
        assert_eq!(float64_to_int64(-3.99), Ok(-3));
    }

    #[test]
    fn test_int64_conversions() {
        assert_eq!(int64_to_float64(MANTISSA_LIMIT), Ok(MANTISSA_LIMIT as f64));
        assert!(int64_to_float64(MANTISSA_LIMIT + 1).is_err());
        assert!(int64_to_float64(-MANTISSA_LIMIT - 1).is_err());
        assert_eq!(int64_to_int(i32::MAX as i64), Ok(i32::MAX));
        assert_eq!(int64_to_int(i32::MIN as i64), Ok(i32::MIN));
        assert!(int64_to_int(i32::MAX as i64 + 1).is_err());
    }

    #[test]
    fn test_float64_near() {
        assert!(float64_near(1.0, 1.0 + 1e-12));
        assert!(!float64_near(1.0, 1.001));
        assert!(!float64_near(0.0, 0.0));
        assert!(float64_near_with(0.0, 1e-12, None, Some(1e-9)));
        assert!(float64_near_with(100.0, 101.0, Some(0.05), None));
        assert!(!float64_near(f64::NAN, f64::NAN));
        assert!(!float64_near_with(f64::NAN, 1.0, Some(1.0), Some(1.0)));
    }

    #[test]
    fn test_float64_to_string_zero_sign() {
        assert_eq!(float64_to_string(0.0), "0.0");
        assert_eq!(float64_to_string(-0.0), "-0.0");
    }

    #[test]
    fn test_float64_to_string_decimal_range() {
        assert_eq!(float64_to_string(1.0), "1.0");
        assert_eq!(float64_to_string(-2.5), "-2.5");
        assert_eq!(float64_to_string(100.0), "100.0");
        assert_eq!(float64_to_string(0.001), "0.001");
        assert_eq!(float64_to_string(0.0025), "0.0025");
        assert_eq!(float64_to_string(1234567.5), "1234567.5");
        assert_eq!(float64_to_string(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_float64_to_string_scientific() {
        assert_eq!(float64_to_string(1e-5), "1.0e-5");
        assert_eq!(float64_to_string(1e10), "1.0e+10");
        assert_eq!(float64_to_string(1e7), "1.0e+7");
        assert_eq!(float64_to_string(-1.2345e10), "-1.2345e+10");
        assert_eq!(float64_to_string(2.5e-4), "2.5e-4");
    }

    #[test]
    fn test_float64_to_string_special() {
        assert_eq!(float64_to_string(f64::NAN), "NaN");
        assert_eq!(float64_to_string(f64::INFINITY), "Infinity");
        assert_eq!(float64_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_int_to_string() {
        assert_eq!(int_to_string(255, 16), Ok("ff".to_string()));
        assert_eq!(int_to_string(-5, 2), Ok("-101".to_string()));
        assert_eq!(int_to_string(0, 10), Ok("0".to_string()));
        assert_eq!(
            int_to_string(i64::MIN, 10),
            Ok("-9223372036854775808".to_string())
        );
        assert!(matches!(
            int_to_string(1, 1),
            Err(Error::InvalidArgument(_))
        ));
    }
}
