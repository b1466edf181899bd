use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three Fine-Kinney inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskFactor {
    Probability,
    Severity,
    Frequency,
}

impl RiskFactor {
    pub const ALL: [RiskFactor; 3] = [
        RiskFactor::Probability,
        RiskFactor::Frequency,
        RiskFactor::Severity,
    ];
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFactor::Probability => write!(f, "probability"),
            RiskFactor::Severity => write!(f, "severity"),
            RiskFactor::Frequency => write!(f, "frequency"),
        }
    }
}

/// A selectable value on a factor scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleLevel {
    pub value: Decimal,
    pub label: String,
}

/// The enumerated value lists offered for each factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorScales {
    pub probability: Vec<ScaleLevel>,
    pub frequency: Vec<ScaleLevel>,
    pub severity: Vec<ScaleLevel>,
}

impl FactorScales {
    pub fn get(&self, factor: RiskFactor) -> &[ScaleLevel] {
        match factor {
            RiskFactor::Probability => &self.probability,
            RiskFactor::Severity => &self.severity,
            RiskFactor::Frequency => &self.frequency,
        }
    }
}

/// A severity band. Bands are listed from least to most severe; a score falls
/// into the first band whose `upper_bound` it does not exceed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandDef {
    pub id: String,
    pub label: String,
    /// Inclusive upper bound. `None` only on the last, open-ended band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Decimal>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandDescription {
    pub label: String,
    pub recommendation: String,
}

impl BandDef {
    pub fn describe(&self) -> BandDescription {
        BandDescription {
            label: self.label.clone(),
            recommendation: self.recommendation.clone(),
        }
    }
}

/// Configuration of a scoring method: factor scales plus ordered bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringMethod {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub scales: FactorScales,
    pub bands: Vec<BandDef>,
}
