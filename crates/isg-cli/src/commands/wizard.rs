use isg_core::error::IsgError;
use isg_core::presets;
use isg_core::wizard::{Check, Derivation, DraftSnapshot, WizardSession};
use std::path::{Path, PathBuf};

use crate::output;

/// Where a wizard session lives between invocations.
pub struct DraftLocation {
    pub wizard: String,
    pub draft: PathBuf,
    pub method: Option<PathBuf>,
}

pub enum Edit {
    Set { key: String, value: String },
    Clear { key: String },
}

pub enum Target {
    /// 1-based step number or step id.
    Step(String),
    Next,
    Back,
}

pub fn list() -> Result<(), IsgError> {
    println!("Available predefined wizards:\n");
    for name in presets::WIZARD_PRESETS {
        let definition = presets::load_wizard_preset(name)?;
        println!(
            "  {:<16} {} steps, {} fields (v{})",
            name,
            definition.steps.len(),
            definition.fields.len(),
            definition.version
        );
        if let Some(ref desc) = definition.description {
            println!("                   {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn explain(wizard: &str) -> Result<(), IsgError> {
    let definition = isg_core::resolve_wizard(wizard)?;

    println!("{} (version {})\n", definition.name, definition.version);
    if let Some(ref desc) = definition.description {
        println!("{}\n", desc);
    }

    println!("Fields:");
    let width = definition
        .fields
        .iter()
        .map(|f| f.name.len())
        .max()
        .unwrap_or(10);
    for field in &definition.fields {
        let label = field.label.as_deref().unwrap_or("");
        println!("  {:<width$}  {:<24} {}", field.name, field.kind.to_string(), label);
        if let Some(ref rule) = field.derive {
            println!("  {:<width$}  = {}", "", describe_derivation(rule));
        }
    }
    println!();

    println!("Steps:");
    for (i, step) in definition.steps.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, step.label, step.id);
        for validator in &step.validators {
            println!("       - {}: {}", describe_check(&validator.check), validator.message);
        }
    }
    println!();

    if !definition.progress.is_empty() {
        println!("Progress:");
        for rule in &definition.progress {
            println!("  {:>3}%  {}", rule.weight, describe_check(&rule.check));
        }
    }

    Ok(())
}

pub fn validate(file: &Path) -> Result<(), IsgError> {
    let definition = isg_core::wizard::load_definition(file)?;

    println!(
        "Wizard '{}' (v{}) is valid.",
        definition.name, definition.version
    );
    println!(
        "  Steps: {}",
        definition
            .steps
            .iter()
            .map(|s| s.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Fields: {}", definition.fields.len());

    let mut warnings = Vec::new();
    if definition.progress.is_empty() {
        warnings.push("no progress rules; progress will stay at 0%".to_string());
    }
    for (i, step) in definition.steps.iter().enumerate() {
        if step.validators.is_empty() && i < definition.last_step() {
            warnings.push(format!("step '{}' has no checks", step.id));
        }
    }
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

pub fn status(location: &DraftLocation) -> Result<(), IsgError> {
    let session = open(location)?;
    output::table::print_session(&session);
    Ok(())
}

pub fn edit(location: &DraftLocation, edit: Edit) -> Result<(), IsgError> {
    let mut session = open(location)?;
    match edit {
        Edit::Set { key, value } => session.set_input(&key, &value)?,
        Edit::Clear { key } => session.clear_field(&key),
    }
    save(&session, &location.draft)?;
    output::table::print_session(&session);
    Ok(())
}

pub fn navigate(location: &DraftLocation, target: Target) -> Result<(), IsgError> {
    let mut session = open(location)?;
    match target {
        Target::Step(step) => {
            let index = step_index(&session, &step)?;
            session.go_to_step(index)?;
        }
        Target::Next => session.next()?,
        Target::Back => session.back(),
    }
    save(&session, &location.draft)?;
    output::table::print_session(&session);
    Ok(())
}

pub fn submit(location: &DraftLocation, full: bool) -> Result<(), IsgError> {
    let session = open(location)?;
    let submission = session.submit()?;

    if full {
        output::json::print(&submission)?;
    } else {
        output::json::print(&submission.record())?;
    }

    if location.draft.exists() {
        std::fs::remove_file(&location.draft)?;
        tracing::debug!(draft = %location.draft.display(), "draft removed after submit");
    }
    Ok(())
}

fn open(location: &DraftLocation) -> Result<WizardSession, IsgError> {
    let method = isg_core::resolve_method(location.method.as_deref())?;
    let draft = if location.draft.exists() {
        Some(DraftSnapshot::load(&location.draft)?)
    } else {
        tracing::debug!(draft = %location.draft.display(), "no draft yet, starting a new session");
        None
    };
    isg_core::open_session(&location.wizard, method, draft.as_ref())
}

fn save(session: &WizardSession, draft: &Path) -> Result<(), IsgError> {
    session.snapshot().save(draft)
}

/// Resolve a 1-based step number or a step id to a step index.
fn step_index(session: &WizardSession, step: &str) -> Result<usize, IsgError> {
    let steps = &session.definition().steps;
    if let Ok(number) = step.parse::<usize>() {
        if number == 0 || number > steps.len() {
            return Err(IsgError::InvalidValue(format!(
                "step number must be between 1 and {}",
                steps.len()
            )));
        }
        return Ok(number - 1);
    }
    steps.iter().position(|s| s.id == step).ok_or_else(|| {
        IsgError::InvalidValue(format!(
            "unknown step '{}'. Steps: {}",
            step,
            steps
                .iter()
                .map(|s| s.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })
}

fn describe_check(check: &Check) -> String {
    match check {
        Check::Required { field } => format!("{field} is filled in"),
        Check::MinItems { field, min } => format!("{field} has at least {min} item(s)"),
        Check::IsTrue { field } => format!("{field} is confirmed"),
        Check::OnScale { field, factor } => format!("{field} is a {factor} scale value"),
        Check::NotBefore { field, other } => format!("{field} is not before {other}"),
    }
}

fn describe_derivation(rule: &Derivation) -> String {
    match rule {
        Derivation::AddYears {
            from,
            category,
            years,
        } => {
            let mapping = years
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{from} + years by {category} ({mapping})")
        }
        Derivation::RiskScore {
            probability,
            severity,
            frequency,
        } => format!("{probability} x {severity} x {frequency}"),
        Derivation::RiskBand { score } => format!("band of {score}"),
    }
}
