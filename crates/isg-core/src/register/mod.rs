pub mod xlsx;

use crate::error::IsgError;
use crate::scoring::{RiskAssessment, RiskFactor, ScoringMethod};
use crate::values::lenient_decimal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One line of a risk register.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterEntry {
    pub hazard: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub probability: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub severity: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub frequency: Option<Decimal>,
    /// Pre-computed score, used when the three factors are not all given.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub score: Option<Decimal>,
    /// Spreadsheet row the entry came from (1-based), if imported from XLSX.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_row: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_text: String,
    pub reason: String,
}

/// Entries read from a register file, before scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedRegister {
    pub entries: Vec<RegisterEntry>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredEntry {
    pub entry: RegisterEntry,
    pub assessment: RiskAssessment,
    /// Factors whose value is not on the method's scale.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub off_scale: Vec<RiskFactor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BandCount {
    pub band_id: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterReport {
    pub method: String,
    pub rows: Vec<ScoredEntry>,
    pub skipped: Vec<SkippedRow>,
    /// Entries per band, least severe first. Every band is listed.
    pub summary: Vec<BandCount>,
}

/// Read a register from `.xlsx` or `.json`, chosen by extension.
pub fn load_register(path: &Path) -> Result<ParsedRegister, IsgError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" | "xlsm" => xlsx::parse_register_xlsx(&std::fs::read(path)?),
        "json" => parse_register_json(&std::fs::read_to_string(path)?),
        _ => Err(IsgError::Register(format!(
            "unsupported register file '{}' (expected .xlsx or .json)",
            path.display()
        ))),
    }
}

/// Parse a JSON array of register entries.
pub fn parse_register_json(json: &str) -> Result<ParsedRegister, IsgError> {
    let entries: Vec<RegisterEntry> = serde_json::from_str(json)?;
    let (entries, blank): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|e| !e.hazard.trim().is_empty());
    let skipped = blank
        .into_iter()
        .map(|e| SkippedRow {
            row_text: e.risk.unwrap_or_default(),
            reason: "entry has no hazard".into(),
        })
        .collect();
    Ok(ParsedRegister { entries, skipped })
}

/// Score every entry of a register with `method`.
pub fn score_register(parsed: &ParsedRegister, method: &ScoringMethod) -> RegisterReport {
    let mut rows = Vec::new();
    let mut skipped = parsed.skipped.clone();

    for entry in &parsed.entries {
        let (assessment, off_scale) = match (entry.probability, entry.severity, entry.frequency) {
            (Some(p), Some(s), Some(f)) => {
                let off_scale: Vec<RiskFactor> = [
                    (RiskFactor::Probability, p),
                    (RiskFactor::Frequency, f),
                    (RiskFactor::Severity, s),
                ]
                .into_iter()
                .filter(|(factor, value)| method.level(*factor, *value).is_none())
                .map(|(factor, _)| factor)
                .collect();
                if !off_scale.is_empty() {
                    tracing::warn!(hazard = %entry.hazard, ?off_scale, "register values not on the scale");
                }
                (method.assess(p, s, f), off_scale)
            }
            _ => match entry.score {
                Some(score) => (method.assess_score(score), Vec::new()),
                None => {
                    skipped.push(SkippedRow {
                        row_text: entry.hazard.clone(),
                        reason: "needs probability, severity and frequency, or a score".into(),
                    });
                    continue;
                }
            },
        };
        rows.push(ScoredEntry {
            entry: entry.clone(),
            assessment,
            off_scale,
        });
    }

    let summary = method
        .bands
        .iter()
        .map(|band| BandCount {
            band_id: band.id.clone(),
            label: band.label.clone(),
            count: rows
                .iter()
                .filter(|r| r.assessment.band_id == band.id)
                .count(),
        })
        .collect();

    tracing::debug!(scored = rows.len(), skipped = skipped.len(), "register scored");

    RegisterReport {
        method: method.name.clone(),
        rows,
        skipped,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::fine_kinney;
    use rust_decimal_macros::dec;

    const REGISTER: &str = r#"[
        { "hazard": "Unguarded press", "risk": "Hand crush", "probability": 6, "severity": "40", "frequency": 6 },
        { "hazard": "Wet floor", "probability": "1", "severity": "3", "frequency": "2" },
        { "hazard": "Forklift traffic", "score": 320 },
        { "hazard": "Noise", "probability": 3 },
        { "hazard": "", "risk": "orphan" }
    ]"#;

    #[test]
    fn test_parse_json_register() {
        let parsed = parse_register_json(REGISTER).unwrap();
        assert_eq!(parsed.entries.len(), 4);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.entries[0].severity, Some(dec!(40)));
    }

    #[test]
    fn test_score_register() {
        let parsed = parse_register_json(REGISTER).unwrap();
        let report = score_register(&parsed, fine_kinney());

        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].assessment.score.unwrap().value(), dec!(1440));
        assert_eq!(report.rows[0].assessment.band_id, "critical");
        assert_eq!(report.rows[1].assessment.band_id, "acceptable");
        assert_eq!(report.rows[2].assessment.band_id, "high");

        // "Noise" has neither a full triple nor a score; plus the blank row.
        assert_eq!(report.skipped.len(), 2);

        let counts: Vec<usize> = report.summary.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 1, 1]);
    }

    #[test]
    fn test_off_scale_values_are_flagged_but_scored() {
        let parsed = ParsedRegister {
            entries: vec![RegisterEntry {
                hazard: "Ladder".into(),
                probability: Some(dec!(4)),
                severity: Some(dec!(7)),
                frequency: Some(dec!(2)),
                ..Default::default()
            }],
            skipped: vec![],
        };
        let report = score_register(&parsed, fine_kinney());
        assert_eq!(report.rows[0].off_scale, vec![RiskFactor::Probability]);
        assert_eq!(report.rows[0].assessment.score.unwrap().value(), dec!(56));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(load_register(Path::new("register.csv")).is_err());
    }

    #[test]
    fn test_load_json_register_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("register.json");
        std::fs::write(&path, REGISTER).unwrap();
        let parsed = load_register(&path).unwrap();
        assert_eq!(parsed.entries.len(), 4);
    }
}
