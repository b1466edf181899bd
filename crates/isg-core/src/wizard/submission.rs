use super::value::FieldValue;
use super::FormData;
use crate::scoring::RiskAssessment;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// A completed wizard, ready for storage and document generation.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    /// Name of the wizard definition that produced it.
    pub wizard: String,
    pub data: FormData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,
}

/// Flat value handed to document templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Text(String),
    Number(#[serde(with = "rust_decimal::serde::float")] Decimal),
}

impl Submission {
    /// Flatten to key -> text | number. Dates are ISO-8601, lists are joined
    /// with ", " and the risk result is added under `risk_*` keys.
    pub fn record(&self) -> BTreeMap<String, RecordValue> {
        let mut record: BTreeMap<String, RecordValue> = self
            .data
            .iter()
            .map(|(key, value)| {
                let flat = match value {
                    FieldValue::Number(n) => RecordValue::Number(n.normalize()),
                    other => RecordValue::Text(other.to_string()),
                };
                (key.clone(), flat)
            })
            .collect();

        if let Some(risk) = &self.risk {
            if let Some(score) = risk.score {
                record.insert(
                    "risk_score".into(),
                    RecordValue::Number(score.value().normalize()),
                );
            }
            record.insert("risk_band_id".into(), RecordValue::Text(risk.band_id.clone()));
            record.insert("risk_label".into(), RecordValue::Text(risk.label.clone()));
            record.insert(
                "risk_recommendation".into(),
                RecordValue::Text(risk.recommendation.clone()),
            );
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::fine_kinney;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_flattens_values() {
        let data: FormData = [
            ("name".to_string(), FieldValue::Text("Acme".into())),
            (
                "date".to_string(),
                FieldValue::Date(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()),
            ),
            (
                "team".to_string(),
                FieldValue::List(vec!["Ali".into(), "Veli".into()]),
            ),
            ("reviewed".to_string(), FieldValue::Flag(true)),
            ("probability".to_string(), FieldValue::Number(dec!(0.50))),
        ]
        .into_iter()
        .collect();
        let submission = Submission {
            wizard: "test".into(),
            data,
            risk: Some(fine_kinney().assess(dec!(3), dec!(7), dec!(2))),
        };
        let record = submission.record();
        assert_eq!(record["date"], RecordValue::Text("2026-01-10".into()));
        assert_eq!(record["team"], RecordValue::Text("Ali, Veli".into()));
        assert_eq!(record["reviewed"], RecordValue::Text("true".into()));
        assert_eq!(record["probability"], RecordValue::Number(dec!(0.5)));
        assert_eq!(record["risk_score"], RecordValue::Number(dec!(42)));
        assert_eq!(record["risk_label"], RecordValue::Text("Possible".into()));
        assert_eq!(record["risk_band_id"], RecordValue::Text("possible".into()));
    }

    #[test]
    fn test_record_serializes_numbers_as_json_numbers() {
        let submission = Submission {
            wizard: "test".into(),
            data: [("score".to_string(), FieldValue::Number(dec!(42)))]
                .into_iter()
                .collect(),
            risk: None,
        };
        let json = serde_json::to_value(submission.record()).unwrap();
        assert_eq!(json["score"], serde_json::json!(42.0));
    }
}
