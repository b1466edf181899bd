use crate::error::IsgError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Parse a decimal typed by a person or returned by a model.
///
/// Handles formats like:
/// - "42" -> 42
/// - "0.5" -> 0.5
/// - "0,5" -> 0.5 (Turkish decimal comma)
/// - " 7 " -> 7
/// - "1.5e-7" -> 0.00000015 (how serde_json prints small floats)
pub fn parse_decimal(s: &str) -> Result<Decimal, IsgError> {
    let s = s.trim();
    let normalized = s.replace(',', ".");
    Decimal::from_str(&normalized)
        .or_else(|e| {
            if normalized.contains(['e', 'E']) {
                Decimal::from_scientific(&normalized.to_lowercase())
            } else {
                Err(e)
            }
        })
        .map_err(|e| IsgError::InvalidValue(format!("invalid number '{}': {}", s, e)))
}

/// Read a decimal out of a JSON value that may be a number or a string.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()).ok(),
        Value::String(s) if !s.trim().is_empty() => parse_decimal(s).ok(),
        _ => None,
    }
}

/// Serde helper for optional decimals that may arrive as numbers or strings.
/// Anything unparseable becomes `None`.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_json))
}

/// Convert f64 to Decimal, preserving reasonable precision.
///
/// Goes through the shortest string form so 0.2_f64 stays 0.2 instead of
/// 0.200000000000000011...
pub fn f64_to_decimal(f: f64) -> Decimal {
    let s = format!("{f}");
    s.parse::<Decimal>()
        .unwrap_or_else(|_| Decimal::try_from(f).unwrap_or_default())
}
