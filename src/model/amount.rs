//! Amount type for money values that arrive as numbers or as loosely formatted strings.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Order totals come back from the
//! API as numbers, as plain numeric strings, or as strings decorated with a currency symbol and
//! thousands separators. All of these parse; anything that does not is treated as zero.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// The symbol used when displaying amounts.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Represents a money amount.
///
/// # Examples
///
/// Parsing with a currency symbol and separators:
/// ```
/// # use shopdash::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("₹1,250.50").unwrap();
/// assert_eq!(amount.to_string(), "₹1,250.50");
/// ```
///
/// Anything unparseable from JSON is zero:
/// ```
/// # use shopdash::model::Amount;
/// let amount = Amount::from_value(&serde_json::json!("n/a"));
/// assert!(amount.is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Converts a float, returning zero for values `Decimal` cannot hold.
    pub fn from_f64(value: f64) -> Self {
        Self(Decimal::from_f64(value).unwrap_or_default())
    }

    /// Reads an amount from any JSON value. Numbers are taken as-is, strings are parsed leniently,
    /// everything else is zero.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(Self::from_f64).unwrap_or_default(),
            Value::String(s) => Self::from_str(s).unwrap_or_default(),
            _ => Self::ZERO,
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.is_zero()
    }
}

/// An error that can occur when a string has no number in it.
pub struct AmountError(String);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an amount", self.0)
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    /// Keeps only digits, `.` and `-`, then reads the longest leading number, so `"₹1,200.50"`,
    /// `"1200.5 INR"` and `"1200.50.00"` all parse. A string with no leading number is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kept: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        let number = leading_number(&kept);
        Decimal::from_str(number)
            .map(Amount)
            .map_err(|_| AmountError(s.to_string()))
    }
}

/// Returns the longest prefix of `s` that looks like `-?digits(.digits)?`.
fn leading_number(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }
    if has_digits {
        &s[..end]
    } else {
        ""
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.abs().to_f64().unwrap_or_default();
        write!(
            f,
            "{sign}{CURRENCY_SYMBOL}{}",
            group_en_in(&format_num::format_num!(".2f", abs))
        )
    }
}

/// Inserts `en-IN` digit separators into a plain decimal string: the last three digits of the
/// integer part form one group and the rest are grouped in pairs, so `1234567.89` becomes
/// `12,34,567.89`.
pub(crate) fn group_en_in(plain: &str) -> String {
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let split = int_part.len().saturating_sub(3);
    let (head, tail) = int_part.split_at(split);
    let mut out = String::with_capacity(plain.len() + head.len() / 2 + 1);
    out.push_str(sign);
    for (ix, c) in head.chars().enumerate() {
        if ix > 0 && (head.len() - ix) % 2 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if !head.is_empty() {
        out.push(',');
    }
    out.push_str(tail);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Amount::from_value(&value))
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
    }

    #[test]
    fn test_parse_with_symbol_and_commas() {
        let amount = Amount::from_str("₹1,234,567.89").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_negative() {
        let amount = Amount::from_str("-₹50.00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
        assert!(amount.is_negative());
    }

    #[test]
    fn test_parse_trailing_garbage() {
        assert_eq!(Amount::from_str("1200.5 INR").unwrap().value(), dec("1200.5"));
        assert_eq!(Amount::from_str("12.50.00").unwrap().value(), dec("12.50"));
        assert_eq!(Amount::from_str("12-3").unwrap().value(), dec("12"));
    }

    #[test]
    fn test_parse_failures() {
        assert!(Amount::from_str("").is_err());
        assert!(Amount::from_str("free").is_err());
        assert!(Amount::from_str("--5").is_err());
        assert!(Amount::from_str(".").is_err());
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Amount::from_value(&json!(12.5)).value(), dec("12.5"));
        assert_eq!(Amount::from_value(&json!("₹99")).value(), dec("99"));
        assert!(Amount::from_value(&json!("n/a")).is_zero());
        assert!(Amount::from_value(&json!(null)).is_zero());
        assert!(Amount::from_value(&json!({"v": 1})).is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_str("50").unwrap().to_string(), "₹50.00");
        assert_eq!(Amount::from_str("-1234.5").unwrap().to_string(), "-₹1,234.50");
        assert_eq!(Amount::ZERO.to_string(), "₹0.00");
        assert_eq!(Amount::from_str("252840").unwrap().to_string(), "₹2,52,840.00");
        assert_eq!(
            Amount::from_str("1234567.891").unwrap().to_string(),
            "₹12,34,567.89"
        );
    }

    #[test]
    fn test_group_en_in() {
        assert_eq!(group_en_in("0.00"), "0.00");
        assert_eq!(group_en_in("999"), "999");
        assert_eq!(group_en_in("1000"), "1,000");
        assert_eq!(group_en_in("100000"), "1,00,000");
        assert_eq!(group_en_in("12345678.5"), "1,23,45,678.5");
        assert_eq!(group_en_in("-1234.50"), "-1,234.50");
    }

    #[test]
    fn test_deserialize_lenient() {
        let amounts: Vec<Amount> = serde_json::from_value(json!([10, "₹5.50", "x"])).unwrap();
        let total: Amount = amounts.into_iter().sum();
        assert_eq!(total.value(), dec("15.50"));
    }

    #[test]
    fn test_serialize_as_number() {
        let amount = Amount::from_str("12.5").unwrap();
        assert_eq!(serde_json::to_value(amount).unwrap(), json!(12.5));
    }

    #[test]
    fn test_ordering() {
        let a1 = Amount::from_str("30.00").unwrap();
        let a2 = Amount::from_str("₹50.00").unwrap();
        assert!(a1 < a2);
    }
}
