//! Wire amount parsing
//!
//! Amounts travel as decimal strings (preferred, precision-stable across
//! ecosystems) or plain JSON integers. Internally every amount is a positive
//! `i64`; balances are serialized back as decimal strings.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Amount must be a whole number: {0}")]
    Fractional(String),

    #[error("Amount must be positive: {0}")]
    NotPositive(String),

    #[error("Amount out of range: {0}")]
    OutOfRange(String),
}

/// Raw amount as it appears in a request body.
///
/// Kept untyped until [`parse_amount`] so the fingerprint sees the body
/// exactly as the client sent it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireAmount {
    Number(serde_json::Number),
    Text(String),
}

impl WireAmount {
    fn as_decimal(&self) -> Result<Decimal, AmountError> {
        let repr = match self {
            WireAmount::Number(n) => n.to_string(),
            WireAmount::Text(s) => s.trim().to_string(),
        };
        repr.parse::<Decimal>()
            .map_err(|_| AmountError::InvalidFormat(repr))
    }
}

/// Parse a wire amount into a positive integral `i64`.
pub fn parse_amount(raw: &WireAmount) -> Result<i64, AmountError> {
    let dec = raw.as_decimal()?;

    if dec.fract() != Decimal::ZERO {
        return Err(AmountError::Fractional(dec.to_string()));
    }
    if dec <= Decimal::ZERO {
        return Err(AmountError::NotPositive(dec.to_string()));
    }

    dec.trunc()
        .to_i64()
        .ok_or_else(|| AmountError::OutOfRange(dec.to_string()))
}

/// Format an integral amount or balance back to its wire form.
pub fn format_amount(value: i64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> WireAmount {
        WireAmount::Text(s.to_string())
    }

    fn number(v: serde_json::Value) -> WireAmount {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_parse_decimal_string() {
        assert_eq!(parse_amount(&text("100")).unwrap(), 100);
        assert_eq!(parse_amount(&text(" 42 ")).unwrap(), 42);
        assert_eq!(
            parse_amount(&text("9223372036854775807")).unwrap(),
            i64::MAX
        );
    }

    #[test]
    fn test_parse_json_integer() {
        assert_eq!(parse_amount(&number(serde_json::json!(100))).unwrap(), 100);
    }

    #[test]
    fn test_reject_zero_and_negative() {
        assert_eq!(
            parse_amount(&text("0")).unwrap_err(),
            AmountError::NotPositive("0".to_string())
        );
        assert!(matches!(
            parse_amount(&text("-5")).unwrap_err(),
            AmountError::NotPositive(_)
        ));
        assert!(matches!(
            parse_amount(&number(serde_json::json!(-1))).unwrap_err(),
            AmountError::NotPositive(_)
        ));
    }

    #[test]
    fn test_reject_fractions() {
        assert!(matches!(
            parse_amount(&text("1.5")).unwrap_err(),
            AmountError::Fractional(_)
        ));
        assert!(matches!(
            parse_amount(&number(serde_json::json!(2.25))).unwrap_err(),
            AmountError::Fractional(_)
        ));
    }

    #[test]
    fn test_reject_garbage_and_overflow() {
        assert!(matches!(
            parse_amount(&text("abc")).unwrap_err(),
            AmountError::InvalidFormat(_)
        ));
        assert!(matches!(
            parse_amount(&text("")).unwrap_err(),
            AmountError::InvalidFormat(_)
        ));
        // Decimal cannot represent this magnitude either; both failure modes
        // are acceptable as long as parsing refuses.
        assert!(parse_amount(&text("99999999999999999999999999999999")).is_err());
    }

    #[test]
    fn test_format_round_trip() {
        assert_eq!(format_amount(1050), "1050");
        assert_eq!(parse_amount(&text(&format_amount(77))).unwrap(), 77);
    }
}
