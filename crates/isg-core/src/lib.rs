pub mod error;
pub mod presets;
pub mod register;
pub mod scoring;
pub mod values;
pub mod wizard;

use error::IsgError;
use scoring::ScoringMethod;
use std::path::Path;
use wizard::{DraftSnapshot, WizardDefinition, WizardSession};

/// Resolve a wizard by preset name, falling back to a definition file path.
pub fn resolve_wizard(name_or_path: &str) -> Result<WizardDefinition, IsgError> {
    if presets::WIZARD_PRESETS.contains(&name_or_path) {
        return presets::load_wizard_preset(name_or_path);
    }
    let path = Path::new(name_or_path);
    if path.exists() {
        return wizard::load_definition(path);
    }
    Err(IsgError::UnknownPreset {
        name: name_or_path.to_string(),
        available: presets::WIZARD_PRESETS.join(", "),
    })
}

/// The scoring method in a file, or the built-in Fine-Kinney method.
pub fn resolve_method(path: Option<&Path>) -> Result<ScoringMethod, IsgError> {
    match path {
        Some(p) => scoring::load_method(p),
        None => Ok(presets::fine_kinney().clone()),
    }
}

/// Main API entry point for hosts: open a session on a wizard, restoring a
/// draft when one is given.
pub fn open_session(
    wizard: &str,
    method: ScoringMethod,
    draft: Option<&DraftSnapshot>,
) -> Result<WizardSession, IsgError> {
    let definition = resolve_wizard(wizard)?;
    Ok(match draft {
        Some(snapshot) => WizardSession::restore(definition, method, snapshot),
        None => WizardSession::with_method(definition, method),
    })
}
