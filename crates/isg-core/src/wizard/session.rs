use super::schema::{Derivation, StepDef, WizardDefinition};
use super::submission::Submission;
use super::value::FieldValue;
use super::FormData;
use crate::error::{IsgError, ValidationError};
use crate::presets::fine_kinney;
use crate::scoring::{RiskAssessment, ScoringMethod};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Persisted draft of a session: `{ "data": {...}, "currentStepIndex": n }`.
///
/// Derived fields are not stored; they are recomputed on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    #[serde(default)]
    pub current_step_index: usize,
}

impl DraftSnapshot {
    pub fn from_json(json: &str) -> Result<DraftSnapshot, IsgError> {
        serde_json::from_str(json).map_err(|e| IsgError::Draft(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, IsgError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<DraftSnapshot, IsgError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| IsgError::Draft(format!("{}: {}", path.display(), e)))?;
        DraftSnapshot::from_json(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), IsgError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// One user's pass through a wizard.
///
/// Holds the step position and the form data. Derived fields are kept in
/// step with their inputs on every write; checks only run when moving
/// forward or submitting.
#[derive(Debug, Clone)]
pub struct WizardSession {
    definition: WizardDefinition,
    method: ScoringMethod,
    current: usize,
    data: FormData,
}

impl WizardSession {
    /// Start an empty session scored with the built-in Fine-Kinney method.
    pub fn new(definition: WizardDefinition) -> WizardSession {
        WizardSession::with_method(definition, fine_kinney().clone())
    }

    pub fn with_method(definition: WizardDefinition, method: ScoringMethod) -> WizardSession {
        WizardSession {
            definition,
            method,
            current: 0,
            data: FormData::new(),
        }
    }

    /// Rebuild a session from a draft.
    ///
    /// Entries for unknown or derived fields, and values that do not fit
    /// their field, are dropped. The step index is clamped into range.
    pub fn restore(
        definition: WizardDefinition,
        method: ScoringMethod,
        snapshot: &DraftSnapshot,
    ) -> WizardSession {
        let mut session = WizardSession::with_method(definition, method);

        for (key, raw) in &snapshot.data {
            let Some(field) = session.definition.field(key) else {
                tracing::warn!(field = %key, "draft holds undeclared field; dropped");
                continue;
            };
            if field.derive.is_some() {
                tracing::warn!(field = %key, "draft holds derived field; dropped and recomputed");
                continue;
            }
            match FieldValue::from_json(&field.kind, raw) {
                Some(value) => {
                    session.data.insert(key.clone(), value);
                }
                None => {
                    tracing::warn!(field = %key, kind = %field.kind, "draft value does not fit field; dropped");
                }
            }
        }

        session.recompute_all();

        let last = session.definition.last_step();
        if snapshot.current_step_index > last {
            tracing::warn!(
                requested = snapshot.current_step_index,
                last,
                "draft step index out of range; clamped"
            );
        }
        session.current = snapshot.current_step_index.min(last);
        session
    }

    pub fn definition(&self) -> &WizardDefinition {
        &self.definition
    }

    pub fn method(&self) -> &ScoringMethod {
        &self.method
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn step(&self) -> &StepDef {
        &self.definition.steps[self.current]
    }

    pub fn is_last_step(&self) -> bool {
        self.current == self.definition.last_step()
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.data.get(key)
    }

    /// Store a value and recompute the derived fields that depend on it.
    ///
    /// Writes to undeclared or derived fields, and values of the wrong kind,
    /// are dropped with a warning.
    pub fn set_field(&mut self, key: &str, value: FieldValue) {
        let Some(field) = self.definition.field(key) else {
            tracing::warn!(field = key, "ignoring write to undeclared field");
            return;
        };
        if field.derive.is_some() {
            tracing::warn!(field = key, "ignoring write to derived field");
            return;
        }
        if !value.matches(&field.kind) {
            tracing::warn!(field = key, kind = %field.kind, value = %value, "ignoring value of the wrong kind");
            return;
        }
        self.data.insert(key.to_string(), value);
        self.recompute_from(key);
    }

    /// Parse text input for `key` according to its declared kind, then store it.
    pub fn set_input(&mut self, key: &str, input: &str) -> Result<(), IsgError> {
        let field = self
            .definition
            .field(key)
            .ok_or_else(|| IsgError::InvalidValue(format!("unknown field '{}'", key)))?;
        let value = FieldValue::parse_input(&field.kind, input)?;
        self.set_field(key, value);
        Ok(())
    }

    /// Remove a user-entered value. Dependent derived fields are cleared too.
    pub fn clear_field(&mut self, key: &str) {
        if self.definition.is_derived(key) {
            tracing::warn!(field = key, "ignoring clear of derived field");
            return;
        }
        if self.data.remove(key).is_some() {
            self.recompute_from(key);
        }
    }

    fn recompute_from(&mut self, changed: &str) {
        let mut dirty: HashSet<&str> = HashSet::from([changed]);
        for field in &self.definition.fields {
            let Some(rule) = &field.derive else {
                continue;
            };
            if !rule.inputs().iter().any(|input| dirty.contains(input)) {
                continue;
            }
            apply_derivation(&mut self.data, &self.method, &field.name, rule);
            dirty.insert(field.name.as_str());
        }
    }

    fn recompute_all(&mut self) {
        for field in &self.definition.fields {
            if let Some(rule) = &field.derive {
                apply_derivation(&mut self.data, &self.method, &field.name, rule);
            }
        }
    }

    /// Run the checks of one step, in declared order. Out-of-range indexes
    /// have nothing to check.
    pub fn validate_step(&self, index: usize) -> Result<(), ValidationError> {
        let Some(step) = self.definition.steps.get(index) else {
            return Ok(());
        };
        match step
            .validators
            .iter()
            .find(|v| !v.check.holds(&self.data, &self.method))
        {
            Some(failed) => Err(ValidationError {
                step_index: index,
                step_id: step.id.clone(),
                field: Some(failed.check.field().to_string()),
                check: failed.check.name().to_string(),
                reason: failed.message.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Move to `target`.
    ///
    /// Going back, or staying, always succeeds. Going forward requires every
    /// step from the current one up to the target to pass its checks; the
    /// first failure is returned and the position does not change. Targets
    /// past the last step are ignored.
    pub fn go_to_step(&mut self, target: usize) -> Result<(), ValidationError> {
        if target >= self.definition.steps.len() {
            tracing::debug!(requested = target, "ignoring out-of-range step request");
            return Ok(());
        }
        if target > self.current {
            for index in self.current..target {
                if let Err(err) = self.validate_step(index) {
                    tracing::debug!(step = %err.step_id, check = %err.check, "forward navigation refused");
                    return Err(err);
                }
            }
        }
        tracing::debug!(from = self.current, to = target, "step change");
        self.current = target;
        Ok(())
    }

    pub fn next(&mut self) -> Result<(), ValidationError> {
        self.go_to_step(self.current + 1)
    }

    pub fn back(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Sum of the weights of the satisfied progress rules, at most 100.
    pub fn compute_progress(&self) -> u8 {
        let total: u32 = self
            .definition
            .progress
            .iter()
            .filter(|rule| rule.check.holds(&self.data, &self.method))
            .map(|rule| rule.weight)
            .sum();
        total.min(100) as u8
    }

    /// Scored risk for wizards with a `risk_score` field, once all three
    /// factors are filled in.
    pub fn risk_assessment(&self) -> Option<RiskAssessment> {
        self.definition.fields.iter().find_map(|field| match &field.derive {
            Some(Derivation::RiskScore {
                probability,
                severity,
                frequency,
            }) => {
                let p = self.data.get(probability)?.as_number()?;
                let s = self.data.get(severity)?.as_number()?;
                let f = self.data.get(frequency)?.as_number()?;
                Some(self.method.assess(p, s, f))
            }
            _ => None,
        })
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            data: self
                .data
                .iter()
                .filter(|(key, _)| !self.definition.is_derived(key))
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
            current_step_index: self.current,
        }
    }

    /// Hand the finished form over for storage and document generation.
    ///
    /// The session must be on its final step and every step must pass its
    /// checks, since earlier steps may have been edited after going back.
    pub fn submit(&self) -> Result<Submission, ValidationError> {
        if !self.is_last_step() {
            return Err(ValidationError {
                step_index: self.current,
                step_id: self.step().id.clone(),
                field: None,
                check: "final_step".to_string(),
                reason: format!(
                    "the wizard is on step {} of {}; finish the remaining steps first",
                    self.current + 1,
                    self.definition.steps.len()
                ),
            });
        }
        for index in 0..self.definition.steps.len() {
            self.validate_step(index)?;
        }
        tracing::debug!(wizard = %self.definition.name, fields = self.data.len(), "wizard submitted");
        Ok(Submission {
            wizard: self.definition.name.clone(),
            data: self.data.clone(),
            risk: self.risk_assessment(),
        })
    }

    /// Discard everything and return to the first step.
    pub fn reset(&mut self) {
        self.current = 0;
        self.data.clear();
    }
}

fn apply_derivation(data: &mut FormData, method: &ScoringMethod, name: &str, rule: &Derivation) {
    match rule.derive(data, method) {
        Some(value) => {
            tracing::debug!(field = name, value = %value, "derived field updated");
            data.insert(name.to_string(), value);
        }
        None => {
            if data.remove(name).is_some() {
                tracing::debug!(field = name, "derived field cleared");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::load_wizard_preset;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.into())
    }

    fn date(y: i32, m: u32, d: u32) -> FieldValue {
        FieldValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn emergency() -> WizardSession {
        WizardSession::new(load_wizard_preset("emergency-plan").unwrap())
    }

    fn fill_company(s: &mut WizardSession) {
        s.set_field("company_name", text("Acme Metal"));
        s.set_field("company_address", text("OSB 3. Cadde No:5, Bursa"));
        s.set_field("contact_phone", text("+90 224 000 00 00"));
    }

    #[test]
    fn test_new_session_starts_empty_on_first_step() {
        let s = emergency();
        assert_eq!(s.current_step(), 0);
        assert!(s.data().is_empty());
        assert_eq!(s.compute_progress(), 0);
    }

    #[test]
    fn test_forward_refused_until_company_complete() {
        let mut s = emergency();
        s.set_field("company_name", text("Acme Metal"));

        let err = s.go_to_step(1).unwrap_err();
        assert_eq!(err.step_id, "company");
        assert_eq!(err.field.as_deref(), Some("company_address"));
        assert_eq!(err.check, "required");
        assert_eq!(s.current_step(), 0);

        fill_company(&mut s);
        s.go_to_step(1).unwrap();
        assert_eq!(s.current_step(), 1);
    }

    #[test]
    fn test_first_failing_check_is_reported() {
        let mut s = emergency();
        let err = s.next().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("company_name"));
        assert_eq!(err.reason, "Company name is required");
    }

    #[test]
    fn test_jump_validates_every_intervening_step() {
        let mut s = emergency();
        fill_company(&mut s);
        let err = s.go_to_step(3).unwrap_err();
        assert_eq!(err.step_id, "hazard");
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn test_backward_navigation_is_unconditional() {
        let mut s = emergency();
        fill_company(&mut s);
        s.next().unwrap();
        s.clear_field("company_name");
        s.go_to_step(0).unwrap();
        assert_eq!(s.current_step(), 0);
        s.go_to_step(0).unwrap();
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn test_out_of_range_target_is_ignored() {
        let mut s = emergency();
        s.go_to_step(99).unwrap();
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn test_validity_follows_hazard_class() {
        let mut s = emergency();
        s.set_field("plan_date", date(2026, 1, 10));
        assert!(s.get("valid_until").is_none());

        s.set_field("hazard_class", text("high"));
        assert_eq!(s.get("valid_until"), Some(&date(2028, 1, 10)));

        s.set_field("hazard_class", text("low"));
        assert_eq!(s.get("valid_until"), Some(&date(2032, 1, 10)));

        s.set_field("plan_date", date(2027, 6, 1));
        assert_eq!(s.get("valid_until"), Some(&date(2033, 6, 1)));

        s.clear_field("plan_date");
        assert!(s.get("valid_until").is_none());
    }

    #[test]
    fn test_derived_field_cannot_be_written() {
        let mut s = emergency();
        s.set_field("valid_until", date(2099, 1, 1));
        assert!(s.get("valid_until").is_none());
    }

    #[test]
    fn test_wrong_kind_and_unknown_fields_are_dropped() {
        let mut s = emergency();
        s.set_field("plan_date", text("yesterday"));
        s.set_field("hazard_class", text("extreme"));
        s.set_field("favourite_colour", text("red"));
        assert!(s.data().is_empty());
    }

    #[test]
    fn test_progress_grows_to_100() {
        let mut s = emergency();
        let mut last = s.compute_progress();
        let steps: Vec<(&str, FieldValue)> = vec![
            ("company_name", text("Acme Metal")),
            ("company_address", text("Bursa")),
            ("contact_phone", text("555")),
            ("hazard_class", text("medium")),
            ("plan_date", date(2026, 1, 10)),
            ("coordinator", text("Ayşe Demir")),
            ("team_members", FieldValue::List(vec!["Ali".into()])),
            ("scenarios", FieldValue::List(vec!["fire".into(), "earthquake".into()])),
            ("assembly_point", text("North car park")),
        ];
        for (key, value) in steps {
            s.set_field(key, value);
            let now = s.compute_progress();
            assert!(now >= last, "progress dropped after {key}");
            last = now;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_progress_counts_list_entries_not_list_presence() {
        let mut s = emergency();
        s.set_field("team_members", FieldValue::List(vec![]));
        assert_eq!(s.compute_progress(), 0);
        s.set_field("team_members", FieldValue::List(vec!["Ali".into()]));
        assert_eq!(s.compute_progress(), 20);
    }

    #[test]
    fn test_risk_fields_derive_in_chain() {
        let mut s = WizardSession::new(load_wizard_preset("risk-assessment").unwrap());
        s.set_field("probability", FieldValue::Number(dec!(3)));
        s.set_field("severity", FieldValue::Number(dec!(7)));
        assert!(s.get("risk_score").is_none());
        assert!(s.get("risk_band").is_none());

        s.set_field("frequency", FieldValue::Number(dec!(2)));
        assert_eq!(s.get("risk_score"), Some(&FieldValue::Number(dec!(42))));
        assert_eq!(s.get("risk_band"), Some(&text("Possible")));

        s.set_field("severity", FieldValue::Number(dec!(40)));
        assert_eq!(s.get("risk_score"), Some(&FieldValue::Number(dec!(240))));
        assert_eq!(s.get("risk_band"), Some(&text("High")));

        s.clear_field("frequency");
        assert!(s.get("risk_score").is_none());
        assert!(s.get("risk_band").is_none());
    }

    #[test]
    fn test_oversized_factors_saturate_instead_of_panicking() {
        let mut s = WizardSession::new(load_wizard_preset("risk-assessment").unwrap());
        for key in ["probability", "severity", "frequency"] {
            s.set_input(key, "100000000000000000000").unwrap();
        }
        assert_eq!(
            s.get("risk_score"),
            Some(&FieldValue::Number(rust_decimal::Decimal::MAX))
        );
        assert_eq!(s.get("risk_band"), Some(&text("Critical")));
        assert_eq!(s.risk_assessment().unwrap().band_id, "critical");
    }

    #[test]
    fn test_snapshot_restore_keeps_position_and_recomputes() {
        let mut s = emergency();
        fill_company(&mut s);
        s.set_field("hazard_class", text("medium"));
        s.set_field("plan_date", date(2026, 1, 10));
        s.next().unwrap();
        let snapshot = s.snapshot();
        assert!(!snapshot.data.contains_key("valid_until"));
        assert_eq!(snapshot.current_step_index, 1);

        let json = snapshot.to_json().unwrap();
        let restored = WizardSession::restore(
            load_wizard_preset("emergency-plan").unwrap(),
            fine_kinney().clone(),
            &DraftSnapshot::from_json(&json).unwrap(),
        );
        assert_eq!(restored.current_step(), 1);
        assert_eq!(restored.get("valid_until"), Some(&date(2030, 1, 10)));
        assert_eq!(restored.data(), s.data());
    }

    #[test]
    fn test_restore_drops_bad_entries_and_clamps_index() {
        let snapshot = DraftSnapshot::from_json(
            r#"{
                "data": {
                    "company_name": "Acme",
                    "plan_date": "not a date",
                    "valid_until": "2099-01-01",
                    "ghost": 1
                },
                "currentStepIndex": 42
            }"#,
        )
        .unwrap();
        let s = WizardSession::restore(
            load_wizard_preset("emergency-plan").unwrap(),
            fine_kinney().clone(),
            &snapshot,
        );
        assert_eq!(s.current_step(), 4);
        assert_eq!(s.data().len(), 1);
        assert_eq!(s.get("company_name"), Some(&text("Acme")));
    }

    #[test]
    fn test_restore_replaces_stale_derived_value() {
        let snapshot = DraftSnapshot::from_json(
            r#"{
                "data": {
                    "plan_date": "2026-01-10",
                    "hazard_class": "high",
                    "valid_until": "2099-01-01"
                },
                "currentStepIndex": 1
            }"#,
        )
        .unwrap();
        let s = WizardSession::restore(
            load_wizard_preset("emergency-plan").unwrap(),
            fine_kinney().clone(),
            &snapshot,
        );
        assert_eq!(s.get("valid_until"), Some(&date(2028, 1, 10)));
    }

    #[test]
    fn test_malformed_draft_is_an_error() {
        assert!(DraftSnapshot::from_json("{ not json").is_err());
    }

    #[test]
    fn test_submit_requires_final_step() {
        let mut s = emergency();
        fill_company(&mut s);
        let err = s.submit().unwrap_err();
        assert_eq!(err.check, "final_step");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut s = emergency();
        fill_company(&mut s);
        s.next().unwrap();
        s.reset();
        assert_eq!(s.current_step(), 0);
        assert!(s.data().is_empty());
    }

    #[test]
    fn test_set_input_parses_by_kind() {
        let mut s = emergency();
        s.set_input("plan_date", "10.01.2026").unwrap();
        s.set_input("team_members", "Ali, Veli").unwrap();
        assert_eq!(s.get("plan_date"), Some(&date(2026, 1, 10)));
        assert_eq!(
            s.get("team_members"),
            Some(&FieldValue::List(vec!["Ali".into(), "Veli".into()]))
        );
        assert!(s.set_input("plan_date", "soon").is_err());
        assert!(s.set_input("ghost", "x").is_err());
    }
}
