use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::types::Money;

const THOUSAND: Decimal = dec!(1_000);
const LAKH: Decimal = dec!(100_000);
const CRORE: Decimal = dec!(10_000_000);

/// Placeholder tokens the upstream extractor emits for blank cells.
const BLANK_TOKENS: &[&str] = &["", "-", "n/a", "na", "nil", "null"];

/// Parse a loosely-formatted INR amount into an absolute figure.
///
/// Handles currency symbols, thousands separators, parenthesized negatives
/// ("(500)" reads as -500), and Indian magnitude suffixes ("2 Crores",
/// "₹50 Lakhs", "10L", "75k"). Blank or unparseable input yields zero; this
/// layer never rejects upstream extraction output.
pub fn parse_amount(raw: &str) -> Money {
    let mut cleaned = raw.to_lowercase();
    for token in ["₹", "rs.", "rs", ","] {
        cleaned = cleaned.replace(token, "");
    }
    let cleaned = cleaned.trim();

    if BLANK_TOKENS.contains(&cleaned) {
        return Decimal::ZERO;
    }

    let negative = cleaned.contains('(') && cleaned.contains(')');

    // Suffix order matters: "crore" contains "cr", "lakh" contains "k".
    let multiplier = if cleaned.contains("crore") || cleaned.contains("cr") {
        CRORE
    } else if cleaned.contains("lakh") || cleaned.contains("lac") || cleaned.ends_with('l') {
        LAKH
    } else if cleaned.contains('k') || cleaned.contains("thousand") {
        THOUSAND
    } else {
        Decimal::ONE
    };

    let digits: String = cleaned
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let magnitude: Decimal = match digits.parse() {
        Ok(v) => v,
        Err(_) => return Decimal::ZERO,
    };

    let value = magnitude * multiplier;
    if negative {
        -value
    } else {
        value
    }
}

/// Coerce a raw JSON cell (number, string, or null) into an amount.
pub fn coerce_value(value: &Value) -> Money {
    match value {
        Value::Number(n) => n.to_string().parse().unwrap_or(Decimal::ZERO),
        Value::String(s) => parse_amount(s),
        _ => Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_amount("500000"), dec!(500_000));
        assert_eq!(parse_amount("1,25,000"), dec!(125_000));
        assert_eq!(parse_amount("  42.5 "), dec!(42.5));
    }

    #[test]
    fn test_parenthesized_negative() {
        assert_eq!(parse_amount("(500)"), dec!(-500));
        assert_eq!(parse_amount("(1,000.50)"), dec!(-1000.50));
    }

    #[test]
    fn test_magnitude_suffixes() {
        assert_eq!(parse_amount("₹50 Lakhs"), dec!(5_000_000));
        assert_eq!(parse_amount("2 Crores"), dec!(20_000_000));
        assert_eq!(parse_amount("1.5 Cr"), dec!(15_000_000));
        assert_eq!(parse_amount("10L"), dec!(1_000_000));
        assert_eq!(parse_amount("75k"), dec!(75_000));
    }

    #[test]
    fn test_blank_and_junk_read_as_zero() {
        for raw in ["", "-", "N/A", "nil", "null", "tbd", "1.2.3"] {
            assert_eq!(parse_amount(raw), Decimal::ZERO, "input: {raw:?}");
        }
    }

    #[test]
    fn test_coerce_json_cells() {
        assert_eq!(coerce_value(&serde_json::json!(1250.75)), dec!(1250.75));
        assert_eq!(coerce_value(&serde_json::json!("₹2 Crores")), dec!(20_000_000));
        assert_eq!(coerce_value(&serde_json::json!(null)), Decimal::ZERO);
        assert_eq!(coerce_value(&serde_json::json!([1, 2])), Decimal::ZERO);
    }
}
