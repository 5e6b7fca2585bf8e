//! Decoders for feed values that don't follow plain XML number syntax.
//!
//! The `serde` adapters are meant for `#[serde(deserialize_with = ...)]`.
//! Missing elements are handled by the container `Default`; the adapters
//! only see elements that are present.

use crate::error::FormatError;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;

const UNDEFINED: &str = "undefined";

/// Parse a decimal that may use `,` as the decimal separator and spaces
/// as thousands separators, e.g. `"1 234,50"`.
pub fn parse_locale_float(text: &str) -> Result<f64, FormatError> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if normalized.is_empty() {
        return Err(FormatError::new("decimal", text));
    }

    normalized
        .parse::<f64>()
        .map_err(|_| FormatError::new("decimal", text))
}

/// Parse an integer where the literal `undefined` means "absent".
pub fn parse_optional_int(text: &str) -> Result<Option<i64>, FormatError> {
    let text = text.trim();
    if text.is_empty() || text == UNDEFINED {
        return Ok(None);
    }

    text.parse::<i64>()
        .map(Some)
        .map_err(|_| FormatError::new("integer", text))
}

fn parse_number<T>(text: &str) -> Result<T, String>
where
    T: FromStr + Default,
    T::Err: Display,
{
    let text = text.trim();
    if text.is_empty() {
        return Ok(T::default());
    }
    text.parse()
        .map_err(|err| format!("invalid number {text:?}: {err}"))
}

/// Number with surrounding whitespace allowed; a blank element reads as zero.
pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: Display,
{
    let raw = String::deserialize(deserializer)?;
    parse_number(&raw).map_err(de::Error::custom)
}

/// Like [`number`], but keeps the difference between "missing" and "present".
pub fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: Display,
{
    let raw = String::deserialize(deserializer)?;
    parse_number(&raw).map(Some).map_err(de::Error::custom)
}

/// Boolean written as `true`/`false` or `1`/`0`; blank reads as false.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(de::Error::custom(FormatError::new("boolean", other))),
    }
}

/// Decimal through [`parse_locale_float`]; a blank element reads as zero.
pub fn locale_float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if raw.trim().is_empty() {
        return Ok(0.0);
    }
    parse_locale_float(&raw).map_err(de::Error::custom)
}

/// Integer through [`parse_optional_int`].
pub fn optional_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_optional_int(&raw).map_err(de::Error::custom)
}
