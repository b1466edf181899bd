use super::schema::FieldKind;
use crate::error::IsgError;
use crate::values::{decimal_from_json, parse_decimal};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A typed value held by a wizard field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Flag(bool),
    List(Vec<String>),
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

impl FieldValue {
    /// Whether this value may be stored in a field of `kind`.
    pub fn matches(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (FieldValue::Text(_), FieldKind::Text) => true,
            (FieldValue::Text(s), FieldKind::Choice { options }) => options.contains(s),
            (FieldValue::Number(_), FieldKind::Number) => true,
            (FieldValue::Date(_), FieldKind::Date) => true,
            (FieldValue::Flag(_), FieldKind::Flag) => true,
            (FieldValue::List(_), FieldKind::List) => true,
            _ => false,
        }
    }

    /// Parse text typed into a form or passed on the command line.
    ///
    /// Lists are comma separated. Dates accept ISO (2026-01-10) and the
    /// day-first forms 10.01.2026 and 10/01/2026.
    pub fn parse_input(kind: &FieldKind, input: &str) -> Result<FieldValue, IsgError> {
        let s = input.trim();
        match kind {
            FieldKind::Text => Ok(FieldValue::Text(s.to_string())),
            FieldKind::Choice { options } => {
                if options.iter().any(|o| o == s) {
                    Ok(FieldValue::Text(s.to_string()))
                } else {
                    Err(IsgError::InvalidValue(format!(
                        "'{}' is not one of: {}",
                        s,
                        options.join(", ")
                    )))
                }
            }
            FieldKind::Number => parse_decimal(s).map(FieldValue::Number),
            FieldKind::Date => parse_date(s)
                .map(FieldValue::Date)
                .ok_or_else(|| IsgError::InvalidValue(format!("invalid date '{}'", s))),
            FieldKind::Flag => parse_flag(s)
                .map(FieldValue::Flag)
                .ok_or_else(|| IsgError::InvalidValue(format!("invalid yes/no value '{}'", s))),
            FieldKind::List => Ok(FieldValue::List(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }

    /// Decode a value stored in a draft snapshot. Returns `None` when the JSON
    /// does not fit the field kind.
    pub fn from_json(kind: &FieldKind, value: &Value) -> Option<FieldValue> {
        let decoded = match (kind, value) {
            (FieldKind::Text | FieldKind::Choice { .. }, Value::String(s)) => {
                FieldValue::Text(s.clone())
            }
            (FieldKind::Number, v) => FieldValue::Number(decimal_from_json(v)?),
            (FieldKind::Date, Value::String(s)) => FieldValue::Date(parse_date(s)?),
            (FieldKind::Flag, Value::Bool(b)) => FieldValue::Flag(*b),
            (FieldKind::Flag, Value::String(s)) => FieldValue::Flag(parse_flag(s)?),
            (FieldKind::List, Value::Array(items)) => FieldValue::List(
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()?,
            ),
            _ => return None,
        };
        decoded.matches(kind).then_some(decoded)
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => Value::String(n.to_string()),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Flag(b) => Value::Bool(*b),
            FieldValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// Empty text, whitespace-only text or an empty list.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Number(n) => write!(f, "{}", n.normalize()),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Flag(b) => write!(f, "{b}"),
            FieldValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "evet" => Some(true),
        "false" | "no" | "n" | "0" | "hayır" | "hayir" => Some(false),
        _ => None,
    }
}
