//! Fixed-Point Unit Conversion Utilities
//!
//! Helpers for scaling amounts and rates to their contract-defined
//! fixed-point representations:
//!
//! - Token amounts use 6 fractional digits (stablecoin scale).
//! - Rates and ratios use 18 fractional digits (wad scale).
//!
//! A wrong scale is a silent correctness bug rather than a runtime
//! error, so these functions are kept tiny and tested in isolation.

/// Micro-units per whole token (6 decimals)
pub const UNITS_PER_TOKEN: u64 = 1_000_000;

/// Wad scale for rates and ratios (18 decimals)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Parse a positive decimal string into 6-decimal micro-units.
///
/// Accepts plain decimals like "100", "0.5", "12.345678". Rejects
/// empty strings, signs, more than 6 fractional digits, zero, and
/// anything non-numeric. Returns `None` on any rejection.
pub fn parse_units6(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || s.starts_with('+') || s.starts_with('-') {
        return None;
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    // "." alone, ".5" and "5." are malformed inputs, not shorthand
    if whole.is_empty() || (s.contains('.') && frac.is_empty()) {
        return None;
    }
    if frac.len() > 6 {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: u64 = whole.parse().ok()?;
    let frac_units: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<6}", frac);
        padded.parse().ok()?
    };

    let units = whole
        .checked_mul(UNITS_PER_TOKEN)?
        .checked_add(frac_units)?;

    if units == 0 {
        return None;
    }
    Some(units)
}

/// Render micro-units as a canonical decimal string (e.g. 1_500_000 -> "1.500000")
pub fn units6_to_string(units: u64) -> String {
    format!(
        "{}.{:06}",
        units / UNITS_PER_TOKEN,
        units % UNITS_PER_TOKEN
    )
}

/// Scale whole tokens to micro-units
pub fn tokens_to_units6(tokens: u64) -> Option<u64> {
    tokens.checked_mul(UNITS_PER_TOKEN)
}

/// Scale a percentage (e.g. 8.25 for 8.25%) to an 18-decimal rate.
///
/// 8.25% becomes 0.0825 * WAD. Negative or non-finite input yields `None`.
pub fn percent_to_wad(percent: f64) -> Option<u128> {
    if !percent.is_finite() || percent < 0.0 {
        return None;
    }
    Some((percent / 100.0 * WAD as f64).round() as u128)
}

/// Scale a plain ratio (e.g. 1.5 for 150% collateralization) to 18 decimals
pub fn ratio_to_wad(ratio: f64) -> Option<u128> {
    if !ratio.is_finite() || ratio < 0.0 {
        return None;
    }
    Some((ratio * WAD as f64).round() as u128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_amounts() {
        assert_eq!(parse_units6("1"), Some(1_000_000));
        assert_eq!(parse_units6("100"), Some(100_000_000));
        assert_eq!(parse_units6("  42  "), Some(42_000_000));
    }

    #[test]
    fn test_parse_fractional_amounts() {
        assert_eq!(parse_units6("0.5"), Some(500_000));
        assert_eq!(parse_units6("0.000001"), Some(1));
        assert_eq!(parse_units6("12.345678"), Some(12_345_678));
        assert_eq!(parse_units6("1.5"), Some(1_500_000));
        // short fractions are right-padded, not left-padded
        assert_eq!(parse_units6("1.05"), Some(1_050_000));
        assert_eq!(parse_units6("1.050"), Some(1_050_000));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_units6(""), None);
        assert_eq!(parse_units6("."), None);
        assert_eq!(parse_units6(".5"), None);
        assert_eq!(parse_units6("5."), None);
        assert_eq!(parse_units6("abc"), None);
        assert_eq!(parse_units6("1.2.3"), None);
        assert_eq!(parse_units6("1,000"), None);
        assert_eq!(parse_units6("0x10"), None);
    }

    #[test]
    fn test_parse_rejects_signs_and_zero() {
        assert_eq!(parse_units6("-1"), None);
        assert_eq!(parse_units6("+1"), None);
        assert_eq!(parse_units6("0"), None);
        assert_eq!(parse_units6("0.000000"), None);
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        assert_eq!(parse_units6("1.0000001"), None);
        assert_eq!(parse_units6("0.1234567"), None);
        // exactly six digits is fine
        assert_eq!(parse_units6("0.123456"), Some(123_456));
    }

    #[test]
    fn test_parse_overflow() {
        // u64::MAX units is ~18.4e12 tokens
        assert_eq!(parse_units6("18446744073710"), None);
        assert!(parse_units6("18446744073708").is_some());
        assert_eq!(parse_units6("99999999999999999999"), None);
    }

    #[test]
    fn test_units6_to_string() {
        assert_eq!(units6_to_string(1), "0.000001");
        assert_eq!(units6_to_string(1_000_000), "1.000000");
        assert_eq!(units6_to_string(1_500_000), "1.500000");
        assert_eq!(units6_to_string(12_345_678), "12.345678");
        assert_eq!(units6_to_string(0), "0.000000");
    }

    #[test]
    fn test_parse_roundtrip() {
        for s in ["0.000001", "1.000000", "250000.000000", "99.999999"] {
            let units = parse_units6(s).unwrap();
            assert_eq!(units6_to_string(units), s);
        }
    }

    #[test]
    fn test_tokens_to_units6() {
        assert_eq!(tokens_to_units6(0), Some(0));
        assert_eq!(tokens_to_units6(1), Some(1_000_000));
        assert_eq!(tokens_to_units6(250_000), Some(250_000_000_000));
        assert_eq!(tokens_to_units6(u64::MAX), None);
    }

    #[test]
    fn test_percent_to_wad() {
        assert_eq!(percent_to_wad(0.0), Some(0));
        assert_eq!(percent_to_wad(100.0), Some(WAD));
        assert_eq!(percent_to_wad(8.25), Some(82_500_000_000_000_000));
        assert_eq!(percent_to_wad(0.01), Some(100_000_000_000_000));
        assert_eq!(percent_to_wad(-1.0), None);
        assert_eq!(percent_to_wad(f64::NAN), None);
        assert_eq!(percent_to_wad(f64::INFINITY), None);
    }

    #[test]
    fn test_ratio_to_wad() {
        assert_eq!(ratio_to_wad(0.0), Some(0));
        assert_eq!(ratio_to_wad(1.0), Some(WAD));
        assert_eq!(ratio_to_wad(1.5), Some(1_500_000_000_000_000_000));
        assert_eq!(ratio_to_wad(-0.5), None);
        assert_eq!(ratio_to_wad(f64::NAN), None);
    }
}
