use super::schema::{BandDef, RiskFactor, ScaleLevel, ScoringMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(Decimal);

impl RiskScore {
    /// Wrap a score computed outside the engine (an AI result, an imported
    /// register). Negative input is clamped to zero.
    pub fn from_external(value: Decimal) -> RiskScore {
        if value.is_sign_negative() && !value.is_zero() {
            tracing::warn!(%value, "negative risk score clamped to 0");
            RiskScore(Decimal::ZERO)
        } else {
            RiskScore(value)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl From<RiskScore> for Decimal {
    fn from(score: RiskScore) -> Decimal {
        score.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Fine-Kinney score: probability x severity x frequency.
///
/// Scale membership is not checked here; callers offering the values decide
/// what is selectable. A product too large for `Decimal` saturates to
/// `Decimal::MAX`, which lands in the open-ended top band.
pub fn compute_score(probability: Decimal, severity: Decimal, frequency: Decimal) -> RiskScore {
    let product = probability
        .checked_mul(severity)
        .and_then(|partial| partial.checked_mul(frequency));
    match product {
        Some(value) => RiskScore::from_external(value),
        None => {
            let negative = [probability, severity, frequency]
                .iter()
                .filter(|v| v.is_sign_negative())
                .count()
                % 2
                == 1;
            tracing::warn!(%probability, %severity, %frequency, "risk score overflowed; saturated");
            if negative {
                RiskScore(Decimal::ZERO)
            } else {
                RiskScore(Decimal::MAX)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Manual,
    Ai,
}

/// A scored and banded risk, ready for display or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Decimal>,
    /// Absent only when an AI analysis named a band without any number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<RiskScore>,
    pub band_id: String,
    pub label: String,
    pub recommendation: String,
    pub source: ScoreSource,
    /// Band the AI named when it disagrees with the band of its own score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_band_mismatch: Option<String>,
}

impl ScoringMethod {
    /// Map a score to its band: the first band, in ascending order, whose
    /// upper bound the score does not exceed.
    ///
    /// # Panics
    ///
    /// Panics if the method has no bands. `validate_method` rejects those.
    pub fn classify(&self, score: Decimal) -> &BandDef {
        let band = self
            .bands
            .iter()
            .find(|band| band.upper_bound.map_or(true, |bound| score <= bound))
            .unwrap_or_else(|| &self.bands[self.bands.len() - 1]);
        tracing::debug!(%score, band = %band.id, "classified risk score");
        band
    }

    /// Position of a band from least (0) to most severe.
    pub fn rank(&self, band_id: &str) -> Option<usize> {
        self.bands.iter().position(|b| b.id == band_id)
    }

    pub fn band(&self, band_id: &str) -> Option<&BandDef> {
        self.bands.iter().find(|b| b.id == band_id)
    }

    /// Look up a value on a factor scale.
    pub fn level(&self, factor: RiskFactor, value: Decimal) -> Option<&ScaleLevel> {
        self.scales.get(factor).iter().find(|l| l.value == value)
    }

    /// Score and band a manually selected triple.
    pub fn assess(
        &self,
        probability: Decimal,
        severity: Decimal,
        frequency: Decimal,
    ) -> RiskAssessment {
        let score = compute_score(probability, severity, frequency);
        let band = self.classify(score.value());
        RiskAssessment {
            probability: Some(probability),
            severity: Some(severity),
            frequency: Some(frequency),
            score: Some(score),
            band_id: band.id.clone(),
            label: band.label.clone(),
            recommendation: band.recommendation.clone(),
            source: ScoreSource::Manual,
            ai_band_mismatch: None,
        }
    }

    /// Band a score that was computed elsewhere.
    pub fn assess_score(&self, score: Decimal) -> RiskAssessment {
        let score = RiskScore::from_external(score);
        let band = self.classify(score.value());
        RiskAssessment {
            probability: None,
            severity: None,
            frequency: None,
            score: Some(score),
            band_id: band.id.clone(),
            label: band.label.clone(),
            recommendation: band.recommendation.clone(),
            source: ScoreSource::Manual,
            ai_band_mismatch: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::fine_kinney;
    use rust_decimal_macros::dec;

    fn label(score: Decimal) -> String {
        fine_kinney().classify(score).label.clone()
    }

    #[test]
    fn test_score_is_product() {
        assert_eq!(compute_score(dec!(3), dec!(7), dec!(2)).value(), dec!(42));
        assert_eq!(compute_score(dec!(0.5), dec!(40), dec!(6)).value(), dec!(120));
        assert_eq!(compute_score(dec!(0.2), dec!(1), dec!(0.5)).value(), dec!(0.1));
    }

    #[test]
    fn test_band_boundaries_are_inclusive_below() {
        assert_eq!(label(dec!(0)), "Acceptable");
        assert_eq!(label(dec!(20)), "Acceptable");
        assert_eq!(label(dec!(20.0001)), "Possible");
        assert_eq!(label(dec!(70)), "Possible");
        assert_eq!(label(dec!(70.01)), "Substantial");
        assert_eq!(label(dec!(200)), "Substantial");
        assert_eq!(label(dec!(200.5)), "High");
        assert_eq!(label(dec!(400)), "High");
        assert_eq!(label(dec!(400.0001)), "Critical");
        assert_eq!(label(dec!(500)), "Critical");
        assert_eq!(label(dec!(10000)), "Critical");
    }

    #[test]
    fn test_bands_never_get_less_severe_as_score_grows() {
        let method = fine_kinney();
        let mut previous = 0;
        let mut score = dec!(0);
        while score <= dec!(1000) {
            let rank = method.rank(&method.classify(score).id).unwrap();
            assert!(rank >= previous, "rank dropped at {score}");
            previous = rank;
            score += dec!(2.5);
        }
        assert_eq!(previous, method.bands.len() - 1);
    }

    #[test]
    fn test_classify_is_repeatable() {
        let method = fine_kinney();
        let first = method.classify(dec!(150)).clone();
        let second = method.classify(dec!(150)).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_describe_returns_label_and_recommendation() {
        let band = fine_kinney().classify(dec!(500));
        let desc = band.describe();
        assert_eq!(desc.label, "Critical");
        assert!(!desc.recommendation.is_empty());
    }

    #[test]
    fn test_negative_external_score_is_clamped() {
        let assessment = fine_kinney().assess_score(dec!(-5));
        assert_eq!(assessment.score.unwrap().value(), dec!(0));
        assert_eq!(assessment.band_id, "acceptable");
    }

    #[test]
    fn test_assess_manual_triple() {
        let a = fine_kinney().assess(dec!(6), dec!(15), dec!(3));
        assert_eq!(a.score.unwrap().value(), dec!(270));
        assert_eq!(a.band_id, "high");
        assert_eq!(a.source, ScoreSource::Manual);
        assert_eq!(a.probability, Some(dec!(6)));
    }

    #[test]
    fn test_scale_lookup() {
        let method = fine_kinney();
        let level = method.level(RiskFactor::Severity, dec!(40)).unwrap();
        assert!(level.label.contains("fatality"));
        assert!(method.level(RiskFactor::Severity, dec!(41)).is_none());
        assert!(method.level(RiskFactor::Probability, dec!(0.2)).is_some());
    }

    #[test]
    fn test_overflowing_product_saturates_into_top_band() {
        let huge = dec!(100000000000000000000);
        let score = compute_score(huge, huge, huge);
        assert_eq!(score.value(), Decimal::MAX);
        assert_eq!(fine_kinney().classify(score.value()).id, "critical");

        let a = fine_kinney().assess(huge, huge, huge);
        assert_eq!(a.band_id, "critical");
    }

    #[test]
    fn test_overflowing_negative_product_clamps_to_zero() {
        let huge = dec!(100000000000000000000);
        assert_eq!(compute_score(-huge, huge, huge).value(), Decimal::ZERO);
    }

    #[test]
    fn test_score_display_drops_trailing_zeros() {
        assert_eq!(compute_score(dec!(0.5), dec!(2), dec!(3)).to_string(), "3");
    }
}
