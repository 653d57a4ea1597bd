//! `deserialize_with` helpers for loosely-typed provider JSON.
//!
//! Providers send numbers as strings, empty strings for unknown values and
//! the occasional "Not Applicable". None of that may fail a decode: anything
//! unusable comes back as `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

const PLACEHOLDER_TEXT: [&str; 4] = ["not applicable", "n/a", "null", "none"];

pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_value))
}

pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_value))
}

pub fn year<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(whole_number)
        .and_then(|n| u16::try_from(n).ok())
        .filter(|year| (1900..=2100).contains(year)))
}

pub fn small_count<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(whole_number)
        .and_then(|n| u8::try_from(n).ok())
        .filter(|n| *n > 0))
}

pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(whole_number)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0))
}

pub(crate) fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            let placeholder = PLACEHOLDER_TEXT
                .iter()
                .any(|p| trimmed.eq_ignore_ascii_case(p));
            (!trimmed.is_empty() && !placeholder).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn number_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Integral, non-negative values only; "2019.6" is absent, not 2020.
fn whole_number(value: &Value) -> Option<u64> {
    number_value(value)
        .filter(|n| *n >= 0.0 && *n <= u64::MAX as f64 && n.fract() == 0.0)
        .map(|n| n as u64)
}
