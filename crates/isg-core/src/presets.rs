use crate::error::IsgError;
use crate::scoring::{validate_method, ScoringMethod};
use crate::wizard::{parse_definition_str, WizardDefinition};
use std::sync::LazyLock;

const FINE_KINNEY_JSON: &str = include_str!("../../../presets/fine-kinney.json");
const EMERGENCY_PLAN_JSON: &str = include_str!("../../../presets/emergency-plan.json");
const RISK_ASSESSMENT_JSON: &str = include_str!("../../../presets/risk-assessment.json");

/// Available predefined scoring methods.
pub const METHOD_PRESETS: &[&str] = &["fine-kinney"];

/// Available predefined wizards.
pub const WIZARD_PRESETS: &[&str] = &["emergency-plan", "risk-assessment"];

static FINE_KINNEY: LazyLock<ScoringMethod> = LazyLock::new(|| {
    serde_json::from_str(FINE_KINNEY_JSON).expect("embedded fine-kinney.json is valid")
});

/// The built-in Fine-Kinney method.
pub fn fine_kinney() -> &'static ScoringMethod {
    &FINE_KINNEY
}

/// Load a predefined scoring method by name.
pub fn load_method_preset(name: &str) -> Result<ScoringMethod, IsgError> {
    match name {
        "fine-kinney" => {
            let method = fine_kinney().clone();
            validate_method(&method)?;
            Ok(method)
        }
        _ => Err(IsgError::UnknownPreset {
            name: name.to_string(),
            available: METHOD_PRESETS.join(", "),
        }),
    }
}

/// Load a predefined wizard definition by name.
pub fn load_wizard_preset(name: &str) -> Result<WizardDefinition, IsgError> {
    match name {
        "emergency-plan" => parse_definition_str(EMERGENCY_PLAN_JSON),
        "risk-assessment" => parse_definition_str(RISK_ASSESSMENT_JSON),
        _ => Err(IsgError::UnknownPreset {
            name: name.to_string(),
            available: WIZARD_PRESETS.join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_fine_kinney_preset() {
        let m = load_method_preset("fine-kinney").unwrap();
        assert_eq!(m.bands.len(), 5);
        assert_eq!(m.scales.probability.len(), 6);
    }

    #[test]
    fn test_every_wizard_preset_loads() {
        for name in WIZARD_PRESETS {
            let def = load_wizard_preset(name).unwrap();
            assert_eq!(def.name, *name);
            assert!(!def.steps.is_empty());
        }
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_method_preset("five-by-five").is_err());
        assert!(load_wizard_preset("incident").is_err());
    }
}
