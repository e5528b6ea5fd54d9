// src/common/serde_utils.rs
//
// Small wire-format shims. Callers of the old API send decimal amounts
// either as JSON strings ("300") or numbers (300), so payload fields accept
// both and normalize to Decimal.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalInput {
    Number(f64),
    Text(String),
}

fn to_decimal(input: DecimalInput) -> Result<Decimal, String> {
    match input {
        DecimalInput::Number(n) => {
            if !n.is_finite() {
                return Err("amount must be a finite number".into());
            }
            Decimal::try_from(n).map_err(|e| e.to_string())
        }
        DecimalInput::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err("amount must not be empty".into());
            }
            Decimal::from_str(trimmed).map_err(|e| e.to_string())
        }
    }
}

/// Deserializes a decimal amount from a JSON string or number.
pub fn decimal_lenient<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let input = DecimalInput::deserialize(deserializer)?;
    to_decimal(input).map_err(serde::de::Error::custom)
}

/// Same as `decimal_lenient` but tolerates an absent or null field.
pub fn opt_decimal_lenient<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<DecimalInput>::deserialize(deserializer)?;
    input
        .map(|v| to_decimal(v).map_err(serde::de::Error::custom))
        .transpose()
}

/// Distinguishes an absent field from an explicit null: absent stays
/// `None`, null becomes `Some(None)`. For payload fields where null means
/// "clear this value".
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Reference numbers (bill numbers, payment numbers, mandawi check numbers)
/// are digits-only strings.
pub fn is_digits_only(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Trims an optional incoming string, mapping whitespace-only to None.
pub fn normalize_opt(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Amounts {
        #[serde(deserialize_with = "decimal_lenient")]
        amount: Decimal,
        #[serde(default, deserialize_with = "opt_decimal_lenient")]
        paid: Option<Decimal>,
    }

    #[test]
    fn accepts_strings_and_numbers() {
        let a: Amounts = serde_json::from_str(r#"{"amount": "300.50", "paid": 12}"#).unwrap();
        assert_eq!(a.amount, Decimal::from_str("300.50").unwrap());
        assert_eq!(a.paid, Some(Decimal::from(12)));

        let b: Amounts = serde_json::from_str(r#"{"amount": 7}"#).unwrap();
        assert_eq!(b.amount, Decimal::from(7));
        assert_eq!(b.paid, None);
    }

    #[test]
    fn rejects_garbage_amounts() {
        assert!(serde_json::from_str::<Amounts>(r#"{"amount": "12abc"}"#).is_err());
        assert!(serde_json::from_str::<Amounts>(r#"{"amount": ""}"#).is_err());
        assert!(serde_json::from_str::<Amounts>(r#"{"amount": true}"#).is_err());
    }

    #[test]
    fn digit_checks() {
        assert!(is_digits_only("0123456"));
        assert!(!is_digits_only(""));
        assert!(!is_digits_only("12-34"));
        assert!(!is_digits_only("۱۲۳")); // non-ASCII digits are rejected
    }

    #[test]
    fn optional_strings_are_trimmed() {
        assert_eq!(normalize_opt(Some("  42 ".into())), Some("42".into()));
        assert_eq!(normalize_opt(Some("   ".into())), None);
        assert_eq!(normalize_opt(None), None);
    }
}
