use crate::scoring::RiskFactor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A declared multi-step form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub fields: Vec<FieldDef>,
    /// Ordered steps; the session starts on the first.
    pub steps: Vec<StepDef>,
    /// Completion rules. Weights add up to 100.
    #[serde(default)]
    pub progress: Vec<ProgressRule>,
}

impl WizardDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.field(name).is_some_and(|f| f.derive.is_some())
    }

    pub fn last_step(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub kind: FieldKind,
    /// Present on derived fields, which are never written directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derive: Option<Derivation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Flag,
    List,
    Choice { options: Vec<String> },
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Date => write!(f, "date"),
            FieldKind::Flag => write!(f, "flag"),
            FieldKind::List => write!(f, "list"),
            FieldKind::Choice { options } => write!(f, "choice [{}]", options.join(", ")),
        }
    }
}

/// How a derived field is computed from other fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Derivation {
    /// `from` plus the number of years mapped to the value of `category`.
    AddYears {
        from: String,
        category: String,
        years: BTreeMap<String, u32>,
    },
    /// probability x severity x frequency.
    RiskScore {
        probability: String,
        severity: String,
        frequency: String,
    },
    /// Band label for the score held in `score`.
    RiskBand { score: String },
}

impl Derivation {
    /// Fields this derivation reads.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Derivation::AddYears { from, category, .. } => vec![from.as_str(), category.as_str()],
            Derivation::RiskScore {
                probability,
                severity,
                frequency,
            } => vec![probability.as_str(), severity.as_str(), frequency.as_str()],
            Derivation::RiskBand { score } => vec![score.as_str()],
        }
    }

    /// Kind of the value this derivation produces.
    pub fn output_kind(&self) -> FieldKind {
        match self {
            Derivation::AddYears { .. } => FieldKind::Date,
            Derivation::RiskScore { .. } => FieldKind::Number,
            Derivation::RiskBand { .. } => FieldKind::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDef {
    pub id: String,
    pub label: String,
    /// Checks that must hold before the session may move past this step.
    #[serde(default)]
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validator {
    #[serde(flatten)]
    pub check: Check,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRule {
    #[serde(flatten)]
    pub check: Check,
    pub weight: u32,
    #[serde(default)]
    pub label: Option<String>,
}

/// A predicate over the accumulated form data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    /// Present and not blank (a list must have an entry).
    Required { field: String },
    MinItems { field: String, min: usize },
    IsTrue { field: String },
    /// Number present and listed on the method's scale for `factor`.
    OnScale { field: String, factor: RiskFactor },
    /// Both dates present and `field` is the same day or later than `other`.
    NotBefore { field: String, other: String },
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Check::Required { .. } => "required",
            Check::MinItems { .. } => "min_items",
            Check::IsTrue { .. } => "is_true",
            Check::OnScale { .. } => "on_scale",
            Check::NotBefore { .. } => "not_before",
        }
    }

    /// Field the check is about.
    pub fn field(&self) -> &str {
        match self {
            Check::Required { field }
            | Check::MinItems { field, .. }
            | Check::IsTrue { field }
            | Check::OnScale { field, .. }
            | Check::NotBefore { field, .. } => field.as_str(),
        }
    }

    /// Every field the check reads.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Check::NotBefore { field, other } => vec![field.as_str(), other.as_str()],
            other => vec![other.field()],
        }
    }
}
