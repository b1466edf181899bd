use super::schema::{Check, Derivation};
use super::value::FieldValue;
use super::FormData;
use crate::scoring::{compute_score, ScoringMethod};
use chrono::{Months, NaiveDate};

impl Check {
    /// Evaluate against the current form data.
    pub fn holds(&self, data: &FormData, method: &ScoringMethod) -> bool {
        match self {
            Check::Required { field } => data.get(field).is_some_and(|v| !v.is_blank()),
            Check::MinItems { field, min } => match data.get(field) {
                Some(FieldValue::List(items)) => items.len() >= *min,
                _ => *min == 0,
            },
            Check::IsTrue { field } => matches!(data.get(field), Some(FieldValue::Flag(true))),
            Check::OnScale { field, factor } => data
                .get(field)
                .and_then(FieldValue::as_number)
                .is_some_and(|n| method.level(*factor, n).is_some()),
            Check::NotBefore { field, other } => {
                let date = data.get(field).and_then(FieldValue::as_date);
                let floor = data.get(other).and_then(FieldValue::as_date);
                matches!((date, floor), (Some(d), Some(f)) if d >= f)
            }
        }
    }
}

impl Derivation {
    /// Compute the derived value, or `None` when an input is missing.
    pub fn derive(&self, data: &FormData, method: &ScoringMethod) -> Option<FieldValue> {
        match self {
            Derivation::AddYears {
                from,
                category,
                years,
            } => {
                let start = data.get(from)?.as_date()?;
                let category = data.get(category)?.as_text()?;
                let n = *years.get(category)?;
                add_years(start, n).map(FieldValue::Date)
            }
            Derivation::RiskScore {
                probability,
                severity,
                frequency,
            } => {
                let p = data.get(probability)?.as_number()?;
                let s = data.get(severity)?.as_number()?;
                let f = data.get(frequency)?.as_number()?;
                Some(FieldValue::Number(compute_score(p, s, f).value()))
            }
            Derivation::RiskBand { score } => {
                let score = data.get(score)?.as_number()?;
                Some(FieldValue::Text(method.classify(score).label.clone()))
            }
        }
    }
}

/// Calendar year addition. Feb 29 lands on Feb 28 when the target year is
/// not a leap year.
pub fn add_years(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(years.checked_mul(12)?))
}
