use super::engine::{RiskAssessment, ScoreSource};
use super::schema::{BandDef, ScoringMethod};
use crate::error::IsgError;
use crate::values::lenient_decimal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk figures returned by an AI hazard analysis.
///
/// Models are loose about key names and number formatting, so numbers may
/// arrive as JSON numbers or strings and several key spellings are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiRiskAnalysis {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub probability: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub severity: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub frequency: Option<Decimal>,
    #[serde(
        default,
        alias = "riskScore",
        alias = "risk_score",
        deserialize_with = "lenient_decimal"
    )]
    pub score: Option<Decimal>,
    #[serde(default, alias = "riskLevel", alias = "risk_level", alias = "level")]
    pub band: Option<String>,
    #[serde(default)]
    pub hazard: Option<String>,
    #[serde(default, alias = "analysis")]
    pub summary: Option<String>,
}

impl AiRiskAnalysis {
    pub fn from_json(json: &str) -> Result<AiRiskAnalysis, IsgError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ScoringMethod {
    /// Turn an AI analysis into an assessment.
    ///
    /// Numbers always go through the same scoring and `classify` as manual
    /// input; a band label is only used when the model gave no number at all.
    pub fn ingest_ai(&self, analysis: &AiRiskAnalysis) -> Result<RiskAssessment, IsgError> {
        let mut assessment = match (
            analysis.probability,
            analysis.severity,
            analysis.frequency,
            analysis.score,
        ) {
            (Some(p), Some(s), Some(f), _) => self.assess(p, s, f),
            (_, _, _, Some(score)) => self.assess_score(score),
            _ => {
                let named = analysis.band.as_deref().ok_or_else(|| {
                    IsgError::AiAnalysis("no factors, score or risk level in response".into())
                })?;
                let band = self.resolve_band_label(named).ok_or_else(|| {
                    IsgError::AiAnalysis(format!("unrecognised risk level '{}'", named))
                })?;
                return Ok(RiskAssessment {
                    probability: None,
                    severity: None,
                    frequency: None,
                    score: None,
                    band_id: band.id.clone(),
                    label: band.label.clone(),
                    recommendation: band.recommendation.clone(),
                    source: ScoreSource::Ai,
                    ai_band_mismatch: None,
                });
            }
        };
        assessment.source = ScoreSource::Ai;

        if let Some(named) = analysis.band.as_deref() {
            let agrees = self
                .resolve_band_label(named)
                .is_some_and(|b| b.id == assessment.band_id);
            if !agrees {
                tracing::warn!(
                    ai_band = named,
                    band = %assessment.band_id,
                    "AI risk level disagrees with its score; using the score"
                );
                assessment.ai_band_mismatch = Some(named.to_string());
            }
        }

        Ok(assessment)
    }

    /// Match a band name such as "high", "High risk" or "Critical risk level"
    /// to a band. Only the whole name counts, so "Impossible" or "not high"
    /// match nothing.
    pub fn resolve_band_label(&self, text: &str) -> Option<&BandDef> {
        let normalized = text
            .trim()
            .trim_end_matches(['.', '!'])
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let stripped = RISK_SUFFIXES
            .iter()
            .find_map(|suffix| normalized.strip_suffix(suffix));
        let matches = |needle: &str| {
            self.bands
                .iter()
                .find(|b| b.id.to_lowercase() == needle || b.label.to_lowercase() == needle)
        };
        if normalized.is_empty() {
            return None;
        }
        matches(&normalized).or_else(|| stripped.and_then(|s| matches(s.trim())))
    }
}

/// Trailing words models add after a band name.
const RISK_SUFFIXES: &[&str] = &[" risk level", " risk"];
