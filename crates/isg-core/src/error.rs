use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IsgError {
    #[error("failed to load scoring method from {path}: {reason}")]
    MethodLoad { path: PathBuf, reason: String },

    #[error("invalid scoring method: {0}")]
    MethodInvalid(String),

    #[error("failed to load wizard definition from {path}: {reason}")]
    DefinitionLoad { path: PathBuf, reason: String },

    #[error("invalid wizard definition: {0}")]
    DefinitionInvalid(String),

    #[error("unknown preset '{name}'. Available: {available}")]
    UnknownPreset { name: String, available: String },

    #[error("failed to read draft: {0}")]
    Draft(String),

    #[error("failed to parse risk register: {0}")]
    Register(String),

    #[error("unusable AI analysis: {0}")]
    AiAnalysis(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Forward navigation or submission was refused because a step check failed.
///
/// The session that produced it is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("step {step_index} ('{step_id}'): {reason}")]
pub struct ValidationError {
    pub step_index: usize,
    pub step_id: String,
    /// Field the failing check looked at, if it names one.
    pub field: Option<String>,
    /// Kind of the failing check (e.g. "required", "min_items").
    pub check: String,
    pub reason: String,
}
