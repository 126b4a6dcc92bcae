//! Deserializers for numeric fields that may be stored as strings.
//!
//! Products written by the browser form carry every numeric field as the raw
//! input text (`"100"`, `""`). Blank and missing values read as zero.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Parses user or stored text as a decimal amount.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Parses user or stored text as a whole number (`"10"` and `"10.0"` both work).
pub fn parse_integer(raw: &str) -> Option<i64> {
    let value = parse_decimal(raw)?;
    if value.fract().is_zero() {
        value.to_i64()
    } else {
        None
    }
}

pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Decimal::ZERO),
        Value::String(s) if s.trim().is_empty() => Ok(Decimal::ZERO),
        Value::String(s) => {
            parse_decimal(&s).ok_or_else(|| de::Error::custom(format!("invalid amount {s:?}")))
        }
        Value::Number(n) => parse_decimal(&n.to_string())
            .ok_or_else(|| de::Error::custom(format!("amount out of range: {n}"))),
        other => Err(de::Error::custom(format!("expected amount, got {other}"))),
    }
}

pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => {
            parse_integer(&s).ok_or_else(|| de::Error::custom(format!("invalid whole number {s:?}")))
        }
        Value::Number(n) => n
            .as_i64()
            .or_else(|| parse_integer(&n.to_string()))
            .ok_or_else(|| de::Error::custom(format!("invalid whole number {n}"))),
        other => Err(de::Error::custom(format!("expected whole number, got {other}"))),
    }
}
