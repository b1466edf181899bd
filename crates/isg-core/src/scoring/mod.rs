pub mod ai;
pub mod engine;
pub mod schema;

pub use ai::AiRiskAnalysis;
pub use engine::{compute_score, RiskAssessment, RiskScore, ScoreSource};
pub use schema::{BandDef, BandDescription, FactorScales, RiskFactor, ScaleLevel, ScoringMethod};

use crate::error::IsgError;
use crate::presets::fine_kinney;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::Path;

/// Classify a score with the built-in Fine-Kinney bands.
pub fn classify(score: Decimal) -> &'static BandDef {
    fine_kinney().classify(score)
}

/// Score and classify a triple with the built-in Fine-Kinney method.
pub fn assess(probability: Decimal, severity: Decimal, frequency: Decimal) -> RiskAssessment {
    fine_kinney().assess(probability, severity, frequency)
}

/// Load a scoring method from a JSON file.
pub fn load_method(path: &Path) -> Result<ScoringMethod, IsgError> {
    let content = std::fs::read_to_string(path).map_err(|e| IsgError::MethodLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_method(&content, path)
}

/// Parse a scoring method from a JSON string.
pub fn parse_method(json: &str, source: &Path) -> Result<ScoringMethod, IsgError> {
    let method: ScoringMethod = serde_json::from_str(json).map_err(|e| IsgError::MethodLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_method(&method)?;
    Ok(method)
}

/// Parse a scoring method from a JSON string (no file path context).
pub fn parse_method_str(json: &str) -> Result<ScoringMethod, IsgError> {
    let method: ScoringMethod = serde_json::from_str(json).map_err(IsgError::Json)?;
    validate_method(&method)?;
    Ok(method)
}

/// Validate that bands cover [0, inf) without gaps or overlaps and that
/// every factor scale is usable.
pub fn validate_method(method: &ScoringMethod) -> Result<(), IsgError> {
    if method.bands.is_empty() {
        return Err(IsgError::MethodInvalid("bands must not be empty".into()));
    }

    let mut ids = HashSet::new();
    let mut previous: Option<Decimal> = None;
    let last = method.bands.len() - 1;

    for (i, band) in method.bands.iter().enumerate() {
        if band.id.trim().is_empty() {
            return Err(IsgError::MethodInvalid("band id must not be empty".into()));
        }
        if !ids.insert(band.id.as_str()) {
            return Err(IsgError::MethodInvalid(format!(
                "duplicate band id '{}'",
                band.id
            )));
        }

        match (band.upper_bound, i == last) {
            (None, false) => {
                return Err(IsgError::MethodInvalid(format!(
                    "band '{}' has no upper_bound; only the last band may be open-ended",
                    band.id
                )));
            }
            (Some(bound), true) => {
                return Err(IsgError::MethodInvalid(format!(
                    "last band '{}' must be open-ended but has upper_bound {}",
                    band.id, bound
                )));
            }
            (Some(bound), false) => {
                if bound.is_sign_negative() {
                    return Err(IsgError::MethodInvalid(format!(
                        "band '{}' has a negative upper_bound {}",
                        band.id, bound
                    )));
                }
                if let Some(prev) = previous {
                    if bound <= prev {
                        return Err(IsgError::MethodInvalid(format!(
                            "band '{}' upper_bound {} is not above the previous bound {}",
                            band.id, bound, prev
                        )));
                    }
                }
                previous = Some(bound);
            }
            (None, true) => {}
        }
    }

    for factor in RiskFactor::ALL {
        let levels = method.scales.get(factor);
        if levels.is_empty() {
            return Err(IsgError::MethodInvalid(format!(
                "{} scale must not be empty",
                factor
            )));
        }
        for pair in levels.windows(2) {
            if pair[1].value <= pair[0].value {
                return Err(IsgError::MethodInvalid(format!(
                    "{} scale must be strictly ascending ({} then {})",
                    factor, pair[0].value, pair[1].value
                )));
            }
        }
        if levels[0].value <= Decimal::ZERO {
            return Err(IsgError::MethodInvalid(format!(
                "{} scale values must be positive",
                factor
            )));
        }
    }

    Ok(())
}
