pub mod check;
pub mod schema;
pub mod session;
pub mod submission;
pub mod value;

pub use schema::{
    Check, Derivation, FieldDef, FieldKind, ProgressRule, StepDef, Validator, WizardDefinition,
};
pub use session::{DraftSnapshot, WizardSession};
pub use submission::{RecordValue, Submission};
pub use value::FieldValue;

use crate::error::IsgError;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Field name -> value, as accumulated by a session.
pub type FormData = BTreeMap<String, FieldValue>;

/// Load a wizard definition from a JSON file.
pub fn load_definition(path: &Path) -> Result<WizardDefinition, IsgError> {
    let content = std::fs::read_to_string(path).map_err(|e| IsgError::DefinitionLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let definition: WizardDefinition =
        serde_json::from_str(&content).map_err(|e| IsgError::DefinitionLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_definition(&definition)?;
    Ok(definition)
}

/// Parse a wizard definition from a JSON string.
pub fn parse_definition_str(json: &str) -> Result<WizardDefinition, IsgError> {
    let definition: WizardDefinition = serde_json::from_str(json).map_err(IsgError::Json)?;
    validate_definition(&definition)?;
    Ok(definition)
}

/// Validate that a definition is well-formed.
pub fn validate_definition(definition: &WizardDefinition) -> Result<(), IsgError> {
    if definition.steps.is_empty() {
        return Err(IsgError::DefinitionInvalid("steps must not be empty".into()));
    }

    let mut step_ids = HashSet::new();
    for step in &definition.steps {
        if !step_ids.insert(step.id.as_str()) {
            return Err(IsgError::DefinitionInvalid(format!(
                "duplicate step id '{}'",
                step.id
            )));
        }
    }

    // Field name -> declaration position, to check derivation order.
    let mut declared: HashMap<&str, usize> = HashMap::new();
    for (pos, field) in definition.fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            return Err(IsgError::DefinitionInvalid(
                "field name must not be empty".into(),
            ));
        }
        if declared.insert(field.name.as_str(), pos).is_some() {
            return Err(IsgError::DefinitionInvalid(format!(
                "duplicate field '{}'",
                field.name
            )));
        }
    }

    for (pos, field) in definition.fields.iter().enumerate() {
        let Some(rule) = &field.derive else {
            continue;
        };
        if rule.output_kind() != field.kind {
            return Err(IsgError::DefinitionInvalid(format!(
                "field '{}' is declared {} but its derivation produces {}",
                field.name,
                field.kind,
                rule.output_kind()
            )));
        }
        for input in rule.inputs() {
            match declared.get(input) {
                None => {
                    return Err(IsgError::DefinitionInvalid(format!(
                        "field '{}' derives from unknown field '{}'",
                        field.name, input
                    )));
                }
                Some(&input_pos) if input_pos >= pos => {
                    return Err(IsgError::DefinitionInvalid(format!(
                        "field '{}' derives from '{}', which must be declared before it",
                        field.name, input
                    )));
                }
                Some(_) => {}
            }
        }
        if let Derivation::AddYears { from, .. } = rule {
            if definition.field(from).map(|f| &f.kind) != Some(&FieldKind::Date) {
                return Err(IsgError::DefinitionInvalid(format!(
                    "field '{}' adds years to '{}', which is not a date field",
                    field.name, from
                )));
            }
        }
    }

    let checks = definition
        .steps
        .iter()
        .flat_map(|s| s.validators.iter().map(|v| &v.check))
        .chain(definition.progress.iter().map(|p| &p.check));
    for check in checks {
        for name in check.fields() {
            if !declared.contains_key(name) {
                return Err(IsgError::DefinitionInvalid(format!(
                    "{} check references unknown field '{}'",
                    check.name(),
                    name
                )));
            }
        }
    }

    if !definition.progress.is_empty() {
        let total: u32 = definition.progress.iter().map(|p| p.weight).sum();
        if total != 100 {
            return Err(IsgError::DefinitionInvalid(format!(
                "progress weights must add up to 100, got {}",
                total
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_fields_and_steps(fields: &str, steps: &str, progress: &str) -> String {
        format!(
            r#"{{ "name": "t", "version": "1", "fields": [{fields}], "steps": [{steps}], "progress": [{progress}] }}"#
        )
    }

    const ONE_STEP: &str = r#"{ "id": "a", "label": "A" }"#;

    #[test]
    fn test_parse_valid_definition() {
        let json = with_fields_and_steps(
            r#"{ "name": "name", "kind": { "type": "text" } }"#,
            r#"{ "id": "a", "label": "A", "validators": [
                { "check": "required", "field": "name", "message": "Name please" }
            ] }"#,
            r#"{ "check": "required", "field": "name", "weight": 100 }"#,
        );
        let def = parse_definition_str(&json).unwrap();
        assert_eq!(def.steps[0].validators[0].message, "Name please");
        assert_eq!(
            def.steps[0].validators[0].check,
            Check::Required {
                field: "name".into()
            }
        );
    }

    #[test]
    fn test_empty_steps_rejected() {
        let json = with_fields_and_steps("", "", "");
        assert!(parse_definition_str(&json).is_err());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let json = with_fields_and_steps(
            r#"{ "name": "x", "kind": { "type": "text" } },
               { "name": "x", "kind": { "type": "number" } }"#,
            ONE_STEP,
            "",
        );
        assert!(parse_definition_str(&json).is_err());
    }

    #[test]
    fn test_check_on_unknown_field_rejected() {
        let json = with_fields_and_steps(
            "",
            r#"{ "id": "a", "label": "A", "validators": [
                { "check": "required", "field": "ghost", "message": "" }
            ] }"#,
            "",
        );
        assert!(parse_definition_str(&json).is_err());
    }

    #[test]
    fn test_derivation_declared_before_input_rejected() {
        let json = with_fields_and_steps(
            r#"{ "name": "band", "kind": { "type": "text" },
                 "derive": { "rule": "risk_band", "score": "score" } },
               { "name": "score", "kind": { "type": "number" } }"#,
            ONE_STEP,
            "",
        );
        let err = parse_definition_str(&json).unwrap_err();
        assert!(err.to_string().contains("declared before"));
    }

    #[test]
    fn test_derivation_kind_mismatch_rejected() {
        let json = with_fields_and_steps(
            r#"{ "name": "score", "kind": { "type": "number" } },
               { "name": "band", "kind": { "type": "number" },
                 "derive": { "rule": "risk_band", "score": "score" } }"#,
            ONE_STEP,
            "",
        );
        assert!(parse_definition_str(&json).is_err());
    }

    #[test]
    fn test_add_years_from_non_date_rejected() {
        let json = with_fields_and_steps(
            r#"{ "name": "start", "kind": { "type": "text" } },
               { "name": "class", "kind": { "type": "text" } },
               { "name": "until", "kind": { "type": "date" },
                 "derive": { "rule": "add_years", "from": "start", "category": "class",
                             "years": { "low": 6 } } }"#,
            ONE_STEP,
            "",
        );
        assert!(parse_definition_str(&json).is_err());
    }

    #[test]
    fn test_progress_weights_must_total_100() {
        let json = with_fields_and_steps(
            r#"{ "name": "name", "kind": { "type": "text" } }"#,
            ONE_STEP,
            r#"{ "check": "required", "field": "name", "weight": 60 }"#,
        );
        let err = parse_definition_str(&json).unwrap_err();
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_load_definition_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wizard.json");
        let json = with_fields_and_steps("", ONE_STEP, "");
        std::fs::write(&path, json).unwrap();
        let def = load_definition(&path).unwrap();
        assert_eq!(def.steps.len(), 1);
    }
}
